//! Layerconf - layered configuration management
//!
//! This crate provides a flexible configuration builder with support for
//! multiple sources, formats, validation, lifecycle events and hot-reloading.
//!
//! # Example
//!
//! ```rust,no_run
//! use layerconf::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> ConfigResult<()> {
//!     // Build configuration from multiple sources
//!     let config = ConfigBuilder::new()
//!         .with_source(ConfigSource::File("config.toml".into()))
//!         .with_source(ConfigSource::Env)
//!         .with_hot_reload(true)
//!         .build()
//!         .await?;
//!
//!     // Get typed configuration
//!     let port: u16 = config.get_path("server.port").await?;
//!     let database_url: String = config.get_path("database.url").await?;
//!
//!     Ok(())
//! }
//! ```

#![deny(unused_must_use)]
#![warn(missing_docs)]

// Core module with main functionality
pub mod core;

// Builder lifecycle events
pub mod events;

// Implementation modules
pub mod loaders;
pub mod validators;
pub mod watchers;

// Re-export main types from core
pub use self::core::{
    Config, ConfigBuilder, ConfigError, ConfigFormat, ConfigResult, ConfigResultAggregator,
    ConfigResultExt, ConfigSource, ConfigurationBuilder, ErrorCategory, SourceMetadata,
    try_sources,
};

// Re-export traits
pub use self::core::{ConfigLoader, ConfigValidator, ConfigWatcher};

// Re-export events
pub use events::{BuilderEvent, BuilderEventKind, BuilderEventListener, listener};

// Re-export concrete implementations
pub use loaders::{CompositeLoader, EnvLoader, FileLoader, InlineLoader};

pub use validators::{CompositeValidator, FunctionValidator, NoOpValidator, SchemaValidator};

pub use watchers::{
    ConfigWatchEvent, ConfigWatchEventType, FileWatcher, NoOpWatcher, PollingWatcher,
};

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude for common imports
    //!
    //! # Example
    //! ```rust
    //! use layerconf::prelude::*;
    //! ```

    // Core types
    pub use crate::core::{
        Config, ConfigBuilder, ConfigError, ConfigFormat, ConfigResult, ConfigResultExt,
        ConfigSource, ConfigurationBuilder, SourceMetadata,
    };

    // Events
    pub use crate::events::{BuilderEvent, BuilderEventKind, BuilderEventListener, listener};

    // Traits
    pub use crate::core::{ConfigLoader, ConfigValidator, ConfigWatcher};

    // Common loaders
    pub use crate::loaders::{CompositeLoader, EnvLoader, FileLoader, InlineLoader};

    // Common validators
    pub use crate::validators::{NoOpValidator, SchemaValidator};

    // Common watchers
    pub use crate::watchers::{
        ConfigWatchEvent, ConfigWatchEventType, FileWatcher, PollingWatcher,
    };
}

/// Builder pattern helpers
pub mod builders {
    //! Builder utilities for configuration

    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::core::{ConfigBuilder, ConfigSource};
    use crate::loaders::{EnvLoader, FileLoader};
    use crate::validators::SchemaValidator;
    use crate::watchers::FileWatcher;

    /// Create a simple file-based configuration
    pub fn from_file(path: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder::new()
            .with_source(ConfigSource::File(path.into()))
            .with_loader(Arc::new(FileLoader::new()))
    }

    /// Create a configuration from environment variables
    pub fn from_env() -> ConfigBuilder {
        ConfigBuilder::new()
            .with_source(ConfigSource::Env)
            .with_loader(Arc::new(EnvLoader::new()))
    }

    /// Create a configuration from environment with prefix
    pub fn from_env_prefix(prefix: impl Into<String>) -> ConfigBuilder {
        let prefix: String = prefix.into();
        ConfigBuilder::new()
            .with_source(ConfigSource::EnvWithPrefix(prefix.clone()))
            .with_loader(Arc::new(EnvLoader::with_prefix(prefix)))
    }

    /// Create a standard application configuration
    /// (config file + environment overrides)
    pub fn standard_app_config(config_file: impl Into<PathBuf>) -> ConfigBuilder {
        ConfigBuilder::new()
            .with_source(ConfigSource::File(config_file.into()))
            .with_source(ConfigSource::Env)
            .with_loader(Arc::new(crate::loaders::CompositeLoader::default_loaders()))
    }

    /// Create a configuration with file watching
    pub fn with_hot_reload(config_file: impl Into<PathBuf>) -> ConfigBuilder {
        let watcher = FileWatcher::new();
        watcher.on_change(|event| {
            tracing::info!(event = ?event.event_type, "Configuration changed");
        });

        ConfigBuilder::new()
            .with_source(ConfigSource::File(config_file.into()))
            .with_loader(Arc::new(FileLoader::new()))
            .with_watcher(Arc::new(watcher))
            .with_hot_reload(true)
    }

    /// Create a configuration with schema validation
    pub fn with_schema_validation(
        config_file: impl Into<PathBuf>,
        schema: serde_json::Value,
    ) -> ConfigBuilder {
        ConfigBuilder::new()
            .with_source(ConfigSource::File(config_file.into()))
            .with_loader(Arc::new(FileLoader::new()))
            .with_validator(Arc::new(SchemaValidator::new(schema)))
    }
}

/// Utilities for working with configuration
pub mod utils {
    //! Utility functions for configuration management

    use std::path::Path;

    use crate::core::{ConfigError, ConfigResult};

    /// Check if a configuration file exists and is readable
    pub async fn check_config_file(path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => Ok(()),
            Ok(_) => Err(ConfigError::file_read_error(path, "Path is not a file")),
            Err(e) => Err(ConfigError::file_read_error(path, e.to_string())),
        }
    }

    /// Merge multiple JSON values, later values overriding earlier ones
    pub fn merge_json_values(values: Vec<serde_json::Value>) -> serde_json::Value {
        let mut iter = values.into_iter();
        let Some(mut result) = iter.next() else {
            return serde_json::Value::Object(serde_json::Map::new());
        };

        for value in iter {
            crate::core::config::merge_values(&mut result, value);
        }

        result
    }

    /// Parse configuration from a string based on format
    pub fn parse_config_string(
        content: &str,
        format: &crate::ConfigFormat,
    ) -> ConfigResult<serde_json::Value> {
        crate::loaders::parse_content(content, format, Path::new("string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_gives_later_values_precedence() {
        let merged = utils::merge_json_values(vec![
            json!({"a": 1, "nested": {"x": 1, "y": 2}}),
            json!({"nested": {"y": 3}, "b": 2}),
        ]);

        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
        assert_eq!(merged["nested"]["x"], 1);
        assert_eq!(merged["nested"]["y"], 3);
    }

    #[test]
    fn merge_of_nothing_is_an_empty_object() {
        let merged = utils::merge_json_values(vec![]);
        assert_eq!(merged, json!({}));
    }

    #[test]
    fn parse_config_string_dispatches_on_format() {
        let value =
            utils::parse_config_string("key = \"value\"", &ConfigFormat::Toml).unwrap();
        assert_eq!(value["key"], "value");

        let value = utils::parse_config_string("{\"key\": 1}", &ConfigFormat::Json).unwrap();
        assert_eq!(value["key"], 1);
    }

    #[tokio::test]
    async fn check_config_file_rejects_missing_and_non_files() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            utils::check_config_file(&missing).await.unwrap_err(),
            ConfigError::FileNotFound { .. }
        ));

        assert!(matches!(
            utils::check_config_file(dir.path()).await.unwrap_err(),
            ConfigError::FileReadError { .. }
        ));
    }

    #[tokio::test]
    async fn builder_helpers_wire_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.toml");
        tokio::fs::write(&path, "[server]\nport = 8080\n").await.unwrap();

        let config = builders::from_file(&path).build().await.unwrap();
        let port: u16 = config.get_path("server.port").await.unwrap();
        assert_eq!(port, 8080);
    }
}
