use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("imperator"))
}

/// Defaults applied when command-line flags are omitted
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default rule table path (tilde-expanded)
    #[serde(default)]
    pub table: Option<String>,

    /// Default target software version
    #[serde(default)]
    pub target_version: Option<String>,

    /// Default provisioned feature modules
    #[serde(default)]
    pub modules: Vec<String>,
}

impl Config {
    /// Load config.toml, falling back to defaults when the file is missing
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join("config.toml");
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).context("Invalid config.toml format")
    }

    /// The configured rule table path, tilde-expanded
    pub fn table_path(&self) -> Option<PathBuf> {
        self.table
            .as_deref()
            .map(|t| PathBuf::from(shellexpand::tilde(t).as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            table = "~/tables/latest.json"
            target_version = "15.1"
            modules = ["ltm", "afm"]
            "#,
        )
        .unwrap();

        assert_eq!(config.target_version.as_deref(), Some("15.1"));
        assert_eq!(config.modules, vec!["ltm", "afm"]);
        assert!(config.table_path().is_some());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.table.is_none());
        assert!(config.target_version.is_none());
        assert!(config.modules.is_empty());
        assert!(config.table_path().is_none());
    }
}
