//! Core configuration functionality

pub mod builder;
pub mod config;
pub mod error;
pub mod result;
pub mod source;
pub mod traits;

// Re-export core types
pub use builder::{ConfigBuilder, ConfigurationBuilder};
pub use config::Config;
pub use error::{ConfigError, ErrorCategory};
pub use result::{ConfigResult, ConfigResultAggregator, ConfigResultExt, try_sources};
pub use source::{ConfigFormat, ConfigSource, SourceMetadata};

// Re-export core traits
pub use traits::{ConfigLoader, ConfigValidator, ConfigWatcher};
