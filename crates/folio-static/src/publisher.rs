//! Copies static asset directories and the domain alias file into the output.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::builder::{io_error, BuildError};

/// A source directory published under the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetMapping {
    /// Source directory
    pub from: PathBuf,

    /// Destination, relative to the output directory
    pub to: PathBuf,
}

impl AssetMapping {
    pub fn new(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Publish a directory under the same name.
    pub fn same(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            from: dir.clone(),
            to: dir,
        }
    }
}

/// What a publish pass did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PublishReport {
    /// Destinations written
    pub copied: Vec<PathBuf>,

    /// Sources that did not exist
    pub skipped: Vec<PathBuf>,

    /// Number of files copied
    pub files: usize,
}

/// Publishes assets into an output directory.
#[derive(Debug, Clone)]
pub struct AssetPublisher {
    assets: Vec<AssetMapping>,
    alias_file: Option<PathBuf>,
}

impl AssetPublisher {
    pub fn new(assets: Vec<AssetMapping>, alias_file: Option<PathBuf>) -> Self {
        Self { assets, alias_file }
    }

    /// Copy every asset directory and the alias file into `output_dir`.
    ///
    /// Existing destinations are removed before copying. Missing sources are
    /// skipped.
    pub fn publish(&self, output_dir: &Path) -> Result<PublishReport, BuildError> {
        let mut report = PublishReport::default();

        for asset in &self.assets {
            let dest = output_dir.join(checked_destination(&asset.to)?);

            if !asset.from.is_dir() {
                tracing::debug!("Asset directory not found, skipping: {}", asset.from.display());
                report.skipped.push(asset.from.clone());
                continue;
            }

            if dest.exists() {
                fs::remove_dir_all(&dest).map_err(|e| io_error(&dest, e))?;
            }

            let files = copy_dir(&asset.from, &dest)?;
            tracing::info!(
                "Copied {} -> {} ({} files)",
                asset.from.display(),
                dest.display(),
                files
            );

            report.files += files;
            report.copied.push(dest);
        }

        if let Some(alias) = &self.alias_file {
            if alias.is_file() {
                let name = alias
                    .file_name()
                    .ok_or_else(|| BuildError::InvalidAsset(alias.display().to_string()))?;
                let dest = output_dir.join(name);
                fs::copy(alias, &dest).map_err(|e| io_error(&dest, e))?;
                tracing::info!("Copied {}", alias.display());

                report.files += 1;
                report.copied.push(dest);
            } else {
                tracing::debug!("Alias file not found, skipping: {}", alias.display());
                report.skipped.push(alias.clone());
            }
        }

        Ok(report)
    }
}

/// Whether `path` is relative and names something strictly below its base.
pub(crate) fn is_inside(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}

fn checked_destination(to: &Path) -> Result<&Path, BuildError> {
    if is_inside(to) {
        Ok(to)
    } else {
        Err(BuildError::InvalidAsset(format!(
            "destination must be a relative path inside the output directory: {}",
            to.display()
        )))
    }
}

/// Recursively copy `from` into `to`, returning the number of files copied.
fn copy_dir(from: &Path, to: &Path) -> Result<usize, BuildError> {
    let mut files = 0;

    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(|e| io_error(from, e.into()))?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_error(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| io_error(&target, e))?;
            files += 1;
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn copies_nested_directories() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("images");
        let out = temp.path().join("dist");
        fs::create_dir_all(src.join("icons")).unwrap();
        fs::write(src.join("me.jpg"), "jpg").unwrap();
        fs::write(src.join("icons/mail.svg"), "<svg/>").unwrap();

        let publisher = AssetPublisher::new(vec![AssetMapping::new(&src, "images")], None);
        let report = publisher.publish(&out).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.copied, vec![out.join("images")]);
        assert_eq!(
            fs::read_to_string(out.join("images/icons/mail.svg")).unwrap(),
            "<svg/>"
        );
    }

    #[test]
    fn replaces_existing_destination() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("assets");
        let out = temp.path().join("dist");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("resume.pdf"), "new").unwrap();
        fs::create_dir_all(out.join("assets")).unwrap();
        fs::write(out.join("assets/stale.pdf"), "old").unwrap();
        fs::write(out.join("assets/resume.pdf"), "old").unwrap();

        AssetPublisher::new(vec![AssetMapping::new(&src, "assets")], None)
            .publish(&out)
            .unwrap();

        assert!(!out.join("assets/stale.pdf").exists());
        assert_eq!(fs::read_to_string(out.join("assets/resume.pdf")).unwrap(), "new");
    }

    #[test]
    fn skips_missing_sources() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        let missing = temp.path().join("nope");
        let alias = temp.path().join("CNAME");

        let report = AssetPublisher::new(
            vec![AssetMapping::new(&missing, "nope")],
            Some(alias.clone()),
        )
        .publish(&out)
        .unwrap();

        assert_eq!(report.files, 0);
        assert_eq!(report.skipped, vec![missing, alias]);
        assert!(!out.join("nope").exists());
    }

    #[test]
    fn copies_alias_file_verbatim() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        let alias = temp.path().join("CNAME");
        fs::write(&alias, "portfolio.example.com\n").unwrap();

        let report = AssetPublisher::new(vec![], Some(alias)).publish(&out).unwrap();

        assert_eq!(report.files, 1);
        assert_eq!(
            fs::read_to_string(out.join("CNAME")).unwrap(),
            "portfolio.example.com\n"
        );
    }

    #[test]
    fn rejects_destinations_outside_output() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("assets");
        fs::create_dir_all(&src).unwrap();

        for to in ["", ".", "../escape", "/abs"] {
            let result = AssetPublisher::new(vec![AssetMapping::new(&src, to)], None)
                .publish(&temp.path().join("dist"));
            assert!(
                matches!(result, Err(BuildError::InvalidAsset(_))),
                "accepted destination {:?}",
                to
            );
        }
    }

    #[test]
    fn same_name_mapping() {
        let mapping = AssetMapping::same("images");
        assert_eq!(mapping.from, PathBuf::from("images"));
        assert_eq!(mapping.to, PathBuf::from("images"));
    }
}
