//! Error handling module
//!
//! Defines the error types for the Alexandria mesh layer.
//!
//! The mesh core itself has no failure surface: unknown identifiers come back
//! as `None` and identifier collisions are retried. These errors cover the
//! ambient layer around it (configuration loading and validation).

use std::io;

use thiserror::Error;

/// Main error type for the Alexandria mesh layer
#[derive(Error, Debug)]
pub enum AlexandriaError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Tick rate must be between {min}ms and {max}ms, got {actual}ms")]
    InvalidTickRate { min: u64, max: u64, actual: u64 },

    #[error("Team prefix must be 1-{max} characters, got {actual}")]
    InvalidTeamPrefix { max: usize, actual: usize },

    #[error("Vertical offset '{field}' must be finite")]
    InvalidOffset { field: &'static str },
}

/// Result type alias for Alexandria operations
pub type Result<T> = std::result::Result<T, AlexandriaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidTickRate {
            min: 1,
            max: 1000,
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "Tick rate must be between 1ms and 1000ms, got 0ms"
        );

        let err: AlexandriaError = ConfigError::InvalidOffset {
            field: "interpolated_y_offset",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Vertical offset 'interpolated_y_offset' must be finite"
        );
    }
}
