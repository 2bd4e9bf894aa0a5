use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/chatpane/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("chatpane").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - Streaming is enabled
    /// - Glyph cells are non-zero and fit on the panel
    /// - Queue capacity and read size are non-zero
    ///
    /// A `max_tokens` above the queue capacity is allowed but logged,
    /// since overflow drops the oldest characters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.request.stream {
            return Err(ConfigError::ValidationError {
                message: "request.stream must be true".to_string(),
            });
        }

        let display = &self.display;
        if display.char_width == 0 || display.char_height == 0 {
            return Err(ConfigError::ValidationError {
                message: "display.char_width and display.char_height must be non-zero"
                    .to_string(),
            });
        }

        if display.char_width > display.max_x || display.char_height > display.max_y {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "a {}x{} glyph does not fit a {}x{} panel",
                    display.char_width, display.char_height, display.max_x, display.max_y
                ),
            });
        }

        if self.stream.queue_capacity == 0 {
            return Err(ConfigError::ValidationError {
                message: "stream.queue_capacity must be non-zero".to_string(),
            });
        }

        if self.stream.read_chunk_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "stream.read_chunk_size must be non-zero".to_string(),
            });
        }

        let max_tokens = self.max_tokens();
        if u64::from(max_tokens) > self.stream.queue_capacity as u64 {
            tracing::warn!(
                max_tokens,
                queue_capacity = self.stream.queue_capacity,
                "max_tokens exceeds queue capacity; output may be dropped under load"
            );
        }

        Ok(())
    }
}
