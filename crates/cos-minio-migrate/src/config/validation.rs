//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};
use std::collections::HashSet;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.sources.is_empty() {
        return Err(MigrateError::Config(
            "at least one source identity is required".into(),
        ));
    }

    let mut names = HashSet::new();
    for source in &config.sources {
        if source.name.is_empty() {
            return Err(MigrateError::Config("sources[].name is required".into()));
        }
        if !names.insert(source.name.as_str()) {
            return Err(MigrateError::Config(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }
        if source.region.is_empty() {
            return Err(MigrateError::Config(format!(
                "source '{}': region is required",
                source.name
            )));
        }
        if source.bucket.is_empty() {
            return Err(MigrateError::Config(format!(
                "source '{}': bucket is required",
                source.name
            )));
        }
        if source.access_key.is_empty() || source.secret_key.is_empty() {
            return Err(MigrateError::Config(format!(
                "source '{}': access_key and secret_key are required",
                source.name
            )));
        }
    }

    if config.sink.endpoint.is_empty() {
        return Err(MigrateError::Config("sink.endpoint is required".into()));
    }
    if config.sink.bucket.is_empty() {
        return Err(MigrateError::Config("sink.bucket is required".into()));
    }
    if config.sink.access_key.is_empty() || config.sink.secret_key.is_empty() {
        return Err(MigrateError::Config(
            "sink.access_key and sink.secret_key are required".into(),
        ));
    }

    // Migration config validation - only check if explicitly set
    if let Some(0) = config.migration.workers {
        return Err(MigrateError::Config(
            "migration.workers must be at least 1".into(),
        ));
    }
    if config.migration.url_column.is_empty() {
        return Err(MigrateError::Config(
            "migration.url_column must not be empty".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MigrationConfig, SinkConfig, SourceConfig};

    fn valid_config() -> Config {
        Config {
            sources: vec![
                SourceConfig {
                    name: "video".to_string(),
                    region: "ap-shanghai".to_string(),
                    access_key: "AKIDvideo".to_string(),
                    secret_key: "secret".to_string(),
                    bucket: "video-storage-1251973116".to_string(),
                    endpoint: None,
                },
                SourceConfig {
                    name: "docs".to_string(),
                    region: "ap-guangzhou".to_string(),
                    access_key: "AKIDdocs".to_string(),
                    secret_key: "secret".to_string(),
                    bucket: "documents-1251973116".to_string(),
                    endpoint: None,
                },
            ],
            sink: SinkConfig {
                endpoint: "localhost:9000".to_string(),
                access_key: "minioadmin".to_string(),
                secret_key: "minioadmin".to_string(),
                secure: false,
                bucket: "archive".to_string(),
                region: "us-east-1".to_string(),
            },
            migration: MigrationConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_no_sources() {
        let mut config = valid_config();
        config.sources.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_source_name() {
        let mut config = valid_config();
        config.sources[1].name = "video".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_sink_bucket() {
        let mut config = valid_config();
        config.sink.bucket = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.migration.workers = Some(0);
        assert!(validate(&config).is_err());
    }
}
