//! Inkset configuration file handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use inkset_text::FontRegistry;

/// Name looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "inkset.toml";

/// Top-level configuration (inkset.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InksetConfig {
    #[serde(default)]
    pub fonts: FontsConfig,
}

/// Font discovery
#[derive(Debug, Deserialize, Serialize)]
pub struct FontsConfig {
    /// Extra directories scanned for font files
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    /// Family used when a style names none
    #[serde(default)]
    pub default_family: Option<String>,
    /// Load the fonts installed on the system
    #[serde(default = "default_true")]
    pub load_system: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            default_family: None,
            load_system: true,
        }
    }
}

impl InksetConfig {
    /// Loads `path`, or `inkset.toml` from the working directory.
    ///
    /// An explicit path must exist; a missing default file yields the
    /// default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(CONFIG_FILE);
                if !path.exists() {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Builds the font registry this configuration describes.
    pub fn font_registry(&self) -> FontRegistry {
        let registry = if self.fonts.load_system {
            FontRegistry::new()
        } else {
            FontRegistry::empty()
        };
        for dir in &self.fonts.dirs {
            registry.load_fonts_dir(dir);
        }
        registry.set_default_family(self.fonts.default_family.clone());
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = InksetConfig::from_toml("").unwrap();
        assert!(config.fonts.load_system);
        assert!(config.fonts.dirs.is_empty());
    }

    #[test]
    fn parses_font_settings() {
        let config = InksetConfig::from_toml(
            r#"
            [fonts]
            dirs = ["assets/fonts"]
            default_family = "Noto Sans"
            load_system = false
            "#,
        )
        .unwrap();
        assert_eq!(config.fonts.dirs, vec![PathBuf::from("assets/fonts")]);
        assert_eq!(config.fonts.default_family.as_deref(), Some("Noto Sans"));
        assert!(!config.fonts.load_system);
        assert!(config.to_toml().unwrap().contains("load_system = false"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(InksetConfig::load(Some(Path::new("/no/such/inkset.toml"))).is_err());
    }
}
