//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Keep only the source identity with the given name.
    ///
    /// Used by `--source` to pin resolution to a single configured identity.
    pub fn select_source(&mut self, name: &str) -> Result<()> {
        let selected: Vec<_> = self
            .sources
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect();
        if selected.is_empty() {
            return Err(crate::error::MigrateError::Config(format!(
                "unknown source '{}' (configured: {})",
                name,
                self.sources
                    .iter()
                    .map(|s| s.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        self.sources = selected;
        Ok(())
    }
}
