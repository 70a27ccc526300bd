//! Main configuration container

use super::{ConfigError, ConfigResult, ConfigSource, SourceMetadata};
use super::{ConfigLoader, ConfigValidator, ConfigWatcher};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Deep-merge `source` into `target`.
///
/// Objects merge key-by-key; any other pairing replaces the target value.
pub(crate) fn merge_values(target: &mut serde_json::Value, source: serde_json::Value) {
    match (target, source) {
        (serde_json::Value::Object(target_obj), serde_json::Value::Object(source_obj)) => {
            for (key, value) in source_obj {
                if let Some(existing) = target_obj.get_mut(&key) {
                    merge_values(existing, value);
                } else {
                    target_obj.insert(key, value);
                }
            }
        }
        (target, source) => {
            *target = source;
        }
    }
}

/// Main configuration container
///
/// Cheap to clone: the data tree and metadata are shared behind `Arc`s.
#[derive(Clone)]
pub struct Config {
    /// Configuration data
    data: Arc<RwLock<serde_json::Value>>,

    /// Configuration sources
    sources: Vec<ConfigSource>,

    /// Source metadata
    metadata: Arc<DashMap<ConfigSource, SourceMetadata>>,

    /// Configuration loader
    loader: Arc<dyn ConfigLoader>,

    /// Configuration validator
    validator: Option<Arc<dyn ConfigValidator>>,

    /// Configuration watcher
    watcher: Option<Arc<dyn ConfigWatcher>>,

    /// Hot reload enabled
    hot_reload: bool,
}

impl Config {
    /// Create new config (internal use only, use the builder)
    pub(crate) fn new(
        data: serde_json::Value,
        sources: Vec<ConfigSource>,
        loader: Arc<dyn ConfigLoader>,
        validator: Option<Arc<dyn ConfigValidator>>,
        watcher: Option<Arc<dyn ConfigWatcher>>,
        hot_reload: bool,
    ) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            sources,
            metadata: Arc::new(DashMap::new()),
            loader,
            validator,
            watcher,
            hot_reload,
        }
    }

    /// Get entire configuration as typed value
    pub async fn get<T>(&self) -> ConfigResult<T>
    where
        T: DeserializeOwned,
    {
        let data = self.data.read().await;
        serde_json::from_value(data.clone()).map_err(|e| {
            ConfigError::type_error(e.to_string(), std::any::type_name::<T>(), "JSON value")
        })
    }

    /// Get configuration value by dot-notation path
    pub async fn get_path<T>(&self, path: &str) -> ConfigResult<T>
    where
        T: DeserializeOwned,
    {
        let data = self.data.read().await;
        let value = get_nested_value(&data, path)?;
        serde_json::from_value(value.clone()).map_err(|e| {
            ConfigError::type_error(e.to_string(), std::any::type_name::<T>(), "JSON value")
        })
    }

    /// Get configuration value by path with default
    pub async fn get_path_or<T>(&self, path: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        self.get_path(path).await.unwrap_or(default)
    }

    /// Get configuration value by path or compute a default
    pub async fn get_path_or_else<T, F>(&self, path: &str, default_fn: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        self.get_path(path).await.unwrap_or_else(|_| default_fn())
    }

    /// Try to get configuration value by path, returning None on error
    pub async fn get_opt_path<T>(&self, path: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.get_path(path).await.ok()
    }

    /// Check if configuration has a path
    pub async fn has_path(&self, path: &str) -> bool {
        let data = self.data.read().await;
        get_nested_value(&data, path).is_ok()
    }

    /// Get all configuration keys at a path
    pub async fn keys(&self, path: Option<&str>) -> ConfigResult<Vec<String>> {
        let data = self.data.read().await;
        let value = if let Some(path) = path {
            get_nested_value(&data, path)?
        } else {
            &*data
        };

        match value {
            serde_json::Value::Object(obj) => Ok(obj.keys().cloned().collect()),
            _ => Err(ConfigError::type_error(
                "Path does not point to an object",
                "Object",
                value.to_string(),
            )),
        }
    }

    /// Get raw JSON value at path
    pub async fn get_raw(&self, path: Option<&str>) -> ConfigResult<serde_json::Value> {
        let data = self.data.read().await;

        if let Some(path) = path {
            Ok(get_nested_value(&data, path)?.clone())
        } else {
            Ok(data.clone())
        }
    }

    /// Reload configuration from all sources
    pub async fn reload(&self) -> ConfigResult<()> {
        tracing::info!(sources = self.sources.len(), "Reloading configuration");

        let mut merged_data = serde_json::Value::Object(serde_json::Map::new());

        // Load lowest-priority-number last so higher-priority sources win
        let mut sources = self.sources.clone();
        sources.sort_by_key(|s| std::cmp::Reverse(s.priority()));

        for source in &sources {
            match self.loader.load(source).await {
                Ok(data) => {
                    tracing::debug!(source = %source, "Loaded configuration from source");

                    if let Ok(metadata) = self.loader.metadata(source).await {
                        self.metadata.insert(source.clone(), metadata);
                    }

                    merge_values(&mut merged_data, data);
                }
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "Failed to load from source");

                    if !source.is_optional() {
                        return Err(ConfigError::reload_error(format!(
                            "mandatory source {source} failed: {e}"
                        )));
                    }
                }
            }
        }

        if let Some(validator) = &self.validator {
            tracing::debug!("Validating reloaded configuration");
            validator.validate(&merged_data).await?;
        }

        {
            let mut data = self.data.write().await;
            *data = merged_data;
        }

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Record metadata for a source
    pub(crate) fn insert_metadata(&self, source: ConfigSource, metadata: SourceMetadata) {
        self.metadata.insert(source, metadata);
    }

    /// Get source metadata
    pub fn metadata(&self, source: &ConfigSource) -> Option<SourceMetadata> {
        self.metadata.get(source).map(|entry| entry.clone())
    }

    /// Get all source metadata
    pub fn all_metadata(&self) -> HashMap<ConfigSource, SourceMetadata> {
        self.metadata
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Get configuration sources
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// Start watching for configuration changes (if hot reload is enabled)
    pub async fn start_watching(&self) -> ConfigResult<()> {
        if !self.hot_reload {
            tracing::debug!("Hot reload is disabled, skipping watch setup");
            return Ok(());
        }

        if let Some(watcher) = &self.watcher {
            tracing::info!("Starting configuration watcher");
            watcher.start_watching(&self.sources).await?;
        } else {
            tracing::debug!("No watcher configured");
        }

        Ok(())
    }

    /// Stop watching for configuration changes
    pub async fn stop_watching(&self) -> ConfigResult<()> {
        if let Some(watcher) = &self.watcher {
            tracing::info!("Stopping configuration watcher");
            watcher.stop_watching().await?;
        }

        Ok(())
    }

    /// Check if watching for changes
    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(|w| w.is_watching())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("sources", &self.sources)
            .field("has_validator", &self.validator.is_some())
            .field("has_watcher", &self.watcher.is_some())
            .field("hot_reload", &self.hot_reload)
            .finish()
    }
}

/// Get nested value from JSON using dot notation
pub(crate) fn get_nested_value<'a>(
    value: &'a serde_json::Value,
    path: &str,
) -> ConfigResult<&'a serde_json::Value> {
    if path.is_empty() {
        return Ok(value);
    }

    let parts: Vec<&str> = path.split('.').collect();
    let mut current = value;

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            return Err(ConfigError::invalid_argument(format!(
                "Empty segment in path '{path}'"
            )));
        }
        match current {
            serde_json::Value::Object(obj) => {
                current = obj.get(*part).ok_or_else(|| {
                    ConfigError::path_error(format!("Key '{part}' not found"), path.to_string())
                })?;
            }
            serde_json::Value::Array(arr) => {
                let index: usize = part.parse().map_err(|_| {
                    ConfigError::path_error(
                        format!("Invalid array index '{part}'"),
                        path.to_string(),
                    )
                })?;
                current = arr.get(index).ok_or_else(|| {
                    ConfigError::path_error(
                        format!("Array index {index} out of bounds (size: {})", arr.len()),
                        path.to_string(),
                    )
                })?;
            }
            _ => {
                let remaining_path = parts[i..].join(".");
                return Err(ConfigError::path_error(
                    format!(
                        "Cannot index into {} with '{remaining_path}'",
                        match current {
                            serde_json::Value::Null => "null",
                            serde_json::Value::Bool(_) => "boolean",
                            serde_json::Value::Number(_) => "number",
                            serde_json::Value::String(_) => "string",
                            _ => "value",
                        },
                    ),
                    path.to_string(),
                ));
            }
        }
    }

    Ok(current)
}

/// Human-readable JSON type name for error messages
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_is_deep_for_objects_and_replacing_for_scalars() {
        let mut target = json!({
            "server": {"host": "localhost", "port": 8080},
            "features": ["a", "b"]
        });
        merge_values(
            &mut target,
            json!({
                "server": {"port": 9090},
                "features": ["c"]
            }),
        );

        assert_eq!(target["server"]["host"], "localhost");
        assert_eq!(target["server"]["port"], 9090);
        assert_eq!(target["features"], json!(["c"]));
    }

    #[test]
    fn nested_lookup_walks_objects_and_arrays() {
        let data = json!({
            "workers": [
                {"name": "alpha"},
                {"name": "beta"}
            ]
        });

        assert_eq!(
            get_nested_value(&data, "workers.1.name").unwrap(),
            &json!("beta")
        );
        assert!(matches!(
            get_nested_value(&data, "workers.x").unwrap_err(),
            ConfigError::PathError { .. }
        ));
        assert!(matches!(
            get_nested_value(&data, "workers..name").unwrap_err(),
            ConfigError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn empty_path_returns_root() {
        let data = json!({"k": 1});
        assert_eq!(get_nested_value(&data, "").unwrap(), &data);
    }
}
