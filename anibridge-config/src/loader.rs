use std::fs;
use std::path::Path;

use thiserror::Error;
use url::Url;

use crate::models::BridgeConfig;

/// Errors raised while loading or validating a bridge configuration.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid catalog base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("catalog api key is empty")]
    EmptyApiKey,

    #[error("library folder {index}: media path must be absolute, got {path:?}")]
    RelativeMediaPath { index: usize, path: String },

    #[error("library folder {index}: virtual root must be absolute, got {path:?}")]
    RelativeVirtualRoot { index: usize, path: String },

    #[error("dispatch tick interval must be non-zero")]
    ZeroTickInterval,

    #[error("cache ttl must be non-zero")]
    ZeroCacheTtl,
}

/// Load and validate a configuration from a TOML file.
pub fn load(path: impl AsRef<Path>) -> Result<BridgeConfig, ConfigLoadError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    from_toml_str(&raw)
}

/// Parse and validate a configuration from TOML text.
pub fn from_toml_str(raw: &str) -> Result<BridgeConfig, ConfigLoadError> {
    let config: BridgeConfig = toml::from_str(raw)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &BridgeConfig) -> Result<(), ConfigLoadError> {
    Url::parse(&config.catalog.base_url).map_err(|source| ConfigLoadError::InvalidBaseUrl {
        url: config.catalog.base_url.clone(),
        source,
    })?;

    if config.catalog.api_key.trim().is_empty() {
        return Err(ConfigLoadError::EmptyApiKey);
    }

    if config.dispatch.tick_interval_ms == 0 {
        return Err(ConfigLoadError::ZeroTickInterval);
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigLoadError::ZeroCacheTtl);
    }

    for (index, folder) in config.folders.iter().enumerate() {
        if !folder.media_path.is_absolute() {
            return Err(ConfigLoadError::RelativeMediaPath {
                index,
                path: folder.media_path.display().to_string(),
            });
        }
        if let Some(root) = &folder.virtual_root {
            if !root.is_absolute() {
                return Err(ConfigLoadError::RelativeVirtualRoot {
                    index,
                    path: root.display().to_string(),
                });
            }
        }
    }

    Ok(())
}
