//! Static page build command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio_static::{AssetMapping, BuildConfig, SiteBuilder};
use serde::Deserialize;

/// Configuration file structure (folio.toml).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    site: SiteConfig,
    publish: PublishConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SiteConfig {
    base: String,
    sections_dir: String,
    output: String,
    output_file: String,
    loader_script: String,
    sections: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let defaults = BuildConfig::default();
        Self {
            base: defaults.base_document.display().to_string(),
            sections_dir: defaults.sections_dir.display().to_string(),
            output: defaults.output_dir.display().to_string(),
            output_file: defaults.output_file,
            loader_script: defaults.loader_script,
            sections: defaults.sections,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PublishConfig {
    /// Empty string disables the alias copy
    alias_file: String,
    assets: Vec<AssetEntry>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        let defaults = BuildConfig::default();
        Self {
            alias_file: defaults
                .alias_file
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            assets: defaults
                .assets
                .into_iter()
                .map(|a| AssetEntry {
                    from: a.from.display().to_string(),
                    to: Some(a.to.display().to_string()),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AssetEntry {
    from: String,
    /// Defaults to `from`
    to: Option<String>,
}

impl ConfigFile {
    /// Convert to a builder config, optionally overriding the output directory.
    fn into_build_config(self, output: Option<PathBuf>) -> BuildConfig {
        let alias_file = if self.publish.alias_file.is_empty() {
            None
        } else {
            Some(PathBuf::from(self.publish.alias_file))
        };

        BuildConfig {
            base_document: PathBuf::from(self.site.base),
            sections_dir: PathBuf::from(self.site.sections_dir),
            sections: self.site.sections,
            loader_script: self.site.loader_script,
            output_dir: output.unwrap_or_else(|| PathBuf::from(self.site.output)),
            output_file: self.site.output_file,
            assets: self
                .publish
                .assets
                .into_iter()
                .map(|a| {
                    let to = a.to.unwrap_or_else(|| a.from.clone());
                    AssetMapping::new(a.from, to)
                })
                .collect(),
            alias_file,
        }
    }
}

/// Load configuration from the config file if it exists.
/// Returns an error if the config file exists but is malformed.
fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    tracing::debug!("No config at {}, using defaults", path.display());
    Ok(ConfigFile::default())
}

/// Run the build command.
pub fn run(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    tracing::info!("Building static page...");

    let config = load_config(config_path)?.into_build_config(output);
    let result = SiteBuilder::new(config).build()?;

    tracing::info!(
        "Assembled {} sections and copied {} asset files in {}ms",
        result.sections,
        result.assets.files,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_path.display());

    Ok(())
}
