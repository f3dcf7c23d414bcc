//! Database configuration via `tally.toml`
//!
//! On first open, a default `tally.toml` is created in the data directory.
//! To change settings, edit the file and reopen the database.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tally_core::error::{Error, Result};
use tally_core::password;
use tally_durability::wal::DurabilityMode;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "tally.toml";

/// Database configuration loaded from `tally.toml`.
///
/// # Example
///
/// ```toml
/// durability = "standard"
/// password_cost = 12
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Durability mode: `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
    /// bcrypt cost used when hashing new user passwords.
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
}

fn default_durability_str() -> String {
    "standard".to_string()
}

fn default_password_cost() -> u32 {
    password::DEFAULT_COST
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            durability: default_durability_str(),
            password_cost: default_password_cost(),
        }
    }
}

impl TallyConfig {
    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"standard"` or `"always"`.
    pub fn durability_mode(&self) -> Result<DurabilityMode> {
        match self.durability.as_str() {
            "standard" => Ok(DurabilityMode::default()),
            "always" => Ok(DurabilityMode::Strict),
            other => Err(Error::Config(format!(
                "Invalid durability mode '{}' in tally.toml. Expected \"standard\" or \"always\".",
                other
            ))),
        }
    }

    /// Check every field
    pub fn validate(&self) -> Result<()> {
        self.durability_mode()?;
        if !(password::MIN_COST..=31).contains(&self.password_cost) {
            return Err(Error::Config(format!(
                "Invalid password_cost {} in tally.toml. Expected a value between {} and 31.",
                self.password_cost,
                password::MIN_COST
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Tally ledger configuration
#
# Durability mode: "standard" (default) or "always"
#   "standard" = periodic fsync (~100ms), may lose last interval on power loss
#   "always"   = fsync every commit, zero data loss
durability = "standard"

# bcrypt cost for hashing new user passwords (4-31).
# Each step doubles the hashing time.
password_cost = 12
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: TallyConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_standard() {
        let config = TallyConfig::default();
        assert_eq!(config.durability, "standard");
        assert_eq!(config.durability_mode().unwrap(), DurabilityMode::default());
        assert_eq!(config.password_cost, password::DEFAULT_COST);
    }

    #[test]
    fn parse_always() {
        let config: TallyConfig = toml::from_str("durability = \"always\"").unwrap();
        assert_eq!(config.durability_mode().unwrap(), DurabilityMode::Strict);
    }

    #[test]
    fn parse_invalid_mode_returns_error() {
        let config: TallyConfig = toml::from_str("durability = \"turbo\"").unwrap();
        assert!(matches!(config.durability_mode(), Err(Error::Config(_))));
    }

    #[test]
    fn invalid_password_cost_rejected() {
        let config: TallyConfig = toml::from_str("password_cost = 2").unwrap();
        assert!(config.validate().is_err());
        let config: TallyConfig = toml::from_str("password_cost = 40").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_toml_parses_to_default() {
        let config: TallyConfig = toml::from_str(TallyConfig::default_toml()).unwrap();
        assert_eq!(config, TallyConfig::default());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        TallyConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());
        assert_eq!(TallyConfig::from_file(&path).unwrap(), TallyConfig::default());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "durability = \"always\"\n").unwrap();
        TallyConfig::write_default_if_missing(&path).unwrap();

        let config = TallyConfig::from_file(&path).unwrap();
        assert_eq!(config.durability, "always");
    }

    #[test]
    fn from_file_with_missing_fields_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        assert_eq!(TallyConfig::from_file(&path).unwrap(), TallyConfig::default());
    }

    #[test]
    fn from_file_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "durability = [").unwrap();

        assert!(matches!(TallyConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = TallyConfig {
            durability: "always".to_string(),
            password_cost: 4,
        };
        config.write_to_file(&path).unwrap();
        assert_eq!(TallyConfig::from_file(&path).unwrap(), config);
    }
}
