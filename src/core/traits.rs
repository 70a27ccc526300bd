//! Core traits implemented by loaders, validators and watchers

use super::{ConfigResult, ConfigSource, SourceMetadata};
use async_trait::async_trait;

/// Loads raw configuration data from a [`ConfigSource`]
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// Load configuration from a source
    async fn load(&self, source: &ConfigSource) -> ConfigResult<serde_json::Value>;

    /// Check if the loader supports the given source
    fn supports(&self, source: &ConfigSource) -> bool;

    /// Get metadata for the source
    async fn metadata(&self, source: &ConfigSource) -> ConfigResult<SourceMetadata>;
}

/// Validates a merged configuration tree before it is exposed to callers
#[async_trait]
pub trait ConfigValidator: Send + Sync {
    /// Validate the configuration data
    async fn validate(&self, data: &serde_json::Value) -> ConfigResult<()>;

    /// Optional declarative schema describing what this validator accepts
    fn schema(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Watches configuration sources for changes
#[async_trait]
pub trait ConfigWatcher: Send + Sync {
    /// Start watching the given sources
    async fn start_watching(&self, sources: &[ConfigSource]) -> ConfigResult<()>;

    /// Stop watching
    async fn stop_watching(&self) -> ConfigResult<()>;

    /// Whether the watcher is currently active
    fn is_watching(&self) -> bool;
}
