// error.rs - Engine error types
//
// Config errors surface to the host at construction time.
// Load errors never leave the engine: a failed slab just stays invisible.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("image request failed: {0}")]
    Network(String),

    #[error("image decode failed: {0}")]
    Decode(String),

    #[error("image io error: {0}")]
    Io(String),
}
