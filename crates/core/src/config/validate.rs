use std::path::Path;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Query worker count and queue depth are not 0
/// - Ingest pattern is a non-empty relative glob
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.query.workers == 0 {
        return Err(ConfigError::ValidationError(
            "query.workers cannot be 0".to_string(),
        ));
    }

    if config.query.queue_depth == 0 {
        return Err(ConfigError::ValidationError(
            "query.queue_depth cannot be 0".to_string(),
        ));
    }

    let pattern = config.ingest.pattern.trim();
    if pattern.is_empty() {
        return Err(ConfigError::ValidationError(
            "ingest.pattern cannot be empty".to_string(),
        ));
    }
    if Path::new(pattern).is_absolute() {
        return Err(ConfigError::ValidationError(format!(
            "ingest.pattern must be relative to ingest.torrent_dir: {}",
            pattern
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IngestConfig, QueryConfig};

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_workers_fails() {
        let config = Config {
            query: QueryConfig {
                workers: 0,
                ..QueryConfig::default()
            },
            ..Config::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_queue_depth_fails() {
        let config = Config {
            query: QueryConfig {
                queue_depth: 0,
                ..QueryConfig::default()
            },
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_pattern() {
        for pattern in ["", "   ", "/abs/*.torrent"] {
            let config = Config {
                ingest: IngestConfig {
                    pattern: pattern.to_string(),
                    ..IngestConfig::default()
                },
                ..Config::default()
            };
            assert!(
                matches!(validate_config(&config), Err(ConfigError::ValidationError(_))),
                "{pattern:?}"
            );
        }
    }
}
