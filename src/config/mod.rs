pub mod loader;
pub mod types;

pub use loader::ConfigError;
pub use types::{Config, DisplayConfig, RequestConfig, StreamConfig, API_KEY_ENV};
