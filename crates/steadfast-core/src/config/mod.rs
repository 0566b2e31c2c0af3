//! Retry configuration loading

mod loader;

pub use loader::{RetryConfigLoader, CONFIG_FILE_NAME};
