//! Single-page site builder.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tempfile::NamedTempFile;

use crate::assembler::{Assembler, FragmentDir, DEFAULT_LOADER_SCRIPT, DEFAULT_SECTIONS};
use crate::publisher::{is_inside, AssetMapping, AssetPublisher, PublishReport};

/// Configuration for building the site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Base document with placeholder regions
    pub base_document: PathBuf,

    /// Directory holding one `<section>.html` fragment per section
    pub sections_dir: PathBuf,

    /// Section names in substitution order
    pub sections: Vec<String>,

    /// Loader script source stripped from the output
    pub loader_script: String,

    /// Output directory
    pub output_dir: PathBuf,

    /// Output document file name inside the output directory
    pub output_file: String,

    /// Asset directories to publish
    pub assets: Vec<AssetMapping>,

    /// Domain alias file copied verbatim when present
    pub alias_file: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_document: PathBuf::from("index.html"),
            sections_dir: PathBuf::from("sections"),
            sections: DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect(),
            loader_script: DEFAULT_LOADER_SCRIPT.to_string(),
            output_dir: PathBuf::from("dist"),
            output_file: "index.html".to_string(),
            assets: vec![AssetMapping::same("assets"), AssetMapping::same("images")],
            alias_file: Some(PathBuf::from("CNAME")),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of sections substituted
    pub sections: usize,

    /// Asset publish summary
    pub assets: PublishReport,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Path of the written document
    pub output_path: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Error processing section {section}: {}: {source}", .path.display())]
    MissingFragment {
        section: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid section name: {0}")]
    InvalidSection(String),

    #[error("Invalid asset mapping: {0}")]
    InvalidAsset(String),

    #[error("Invalid output file: {0}")]
    InvalidOutput(String),

    #[error("Invalid pattern: {0}")]
    Pattern(String),
}

/// Builds the distributable page.
pub struct SiteBuilder {
    config: BuildConfig,
    assembler: Assembler,
    publisher: AssetPublisher,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        let assembler = Assembler::new(config.sections.clone())
            .with_loader_script(config.loader_script.clone());
        let publisher = AssetPublisher::new(config.assets.clone(), config.alias_file.clone());

        Self {
            config,
            assembler,
            publisher,
        }
    }

    /// Path the output document is written to.
    pub fn output_path(&self) -> PathBuf {
        self.config.output_dir.join(&self.config.output_file)
    }

    /// Build the site.
    ///
    /// The document is assembled in memory first; the output directory is
    /// only touched once every fragment has been substituted.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        if !is_inside(Path::new(&self.config.output_file)) {
            return Err(BuildError::InvalidOutput(format!(
                "must be a relative path inside the output directory: {}",
                self.config.output_file
            )));
        }

        let base = fs::read_to_string(&self.config.base_document)
            .map_err(|e| io_error(&self.config.base_document, e))?;

        let fragments = FragmentDir::new(&self.config.sections_dir);
        let assembled = self.assembler.assemble(&base, &fragments)?;

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| io_error(&self.config.output_dir, e))?;

        let assets = self.publisher.publish(&self.config.output_dir)?;

        let output_path = self.output_path();
        write_atomic(&self.config.output_dir, &output_path, &assembled.html)?;

        tracing::info!("Built static HTML file: {}", output_path.display());

        Ok(BuildResult {
            sections: assembled.substituted.len(),
            assets,
            duration_ms: start.elapsed().as_millis() as u64,
            output_path,
        })
    }
}

/// Write through a temp file in `dir` so readers never see a partial document.
fn write_atomic(dir: &Path, path: &Path, contents: &str) -> Result<(), BuildError> {
    let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| io_error(file.path(), e))?;

    // Temp files are created owner-only; published pages must be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| io_error(file.path(), e))?;
    }

    file.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

pub(crate) fn io_error(path: &Path, source: io::Error) -> BuildError {
    BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}
