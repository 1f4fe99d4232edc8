use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Config file merged when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "torrentdb.toml";

/// Environment variable prefix; nested keys are separated by `__`
const ENV_PREFIX: &str = "TORRENTDB_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(path)))
}

/// Load configuration from `path` if given, otherwise from defaults, an
/// optional `torrentdb.toml` in the working directory and the environment
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => extract(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file(DEFAULT_CONFIG_FILE)),
        ),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
