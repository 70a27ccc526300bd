//! Configuration builder contract and its default implementation

use super::{Config, ConfigError, ConfigResult, ConfigSource};
use crate::core::config::merge_values;
use crate::events::{BuilderEvent, BuilderEventKind, BuilderEventListener, EventListenerList};
use crate::loaders::CompositeLoader;
use crate::{ConfigLoader, ConfigValidator, ConfigWatcher};
use async_trait::async_trait;
use std::sync::Arc;

/// Contract for objects that can produce configuration values of a
/// specific type.
///
/// A builder performs every step needed to create and initialize its
/// configuration: the value returned by [`get_configuration`] is ready for
/// use without further setup. How the value is produced — and whether
/// repeated calls return a cached result or a fresh one — is left to the
/// implementation.
///
/// Builders emit [`BuilderEvent`]s at lifecycle points; listeners are
/// registered per [`BuilderEventKind`] and removed by passing the same
/// listener `Arc` back. Removing a listener that was never registered has
/// no effect.
///
/// [`get_configuration`]: ConfigurationBuilder::get_configuration
#[async_trait]
pub trait ConfigurationBuilder: Send + Sync {
    /// The configuration type produced by this builder
    type Output;

    /// Produce a fully constructed and initialized configuration value.
    ///
    /// Returns an error when construction or initialization cannot complete
    /// (missing mandatory source, I/O failure, parse or validation failure).
    async fn get_configuration(&self) -> ConfigResult<Self::Output>;

    /// Register a listener for events of the given kind
    fn add_event_listener(&self, kind: BuilderEventKind, listener: Arc<dyn BuilderEventListener>);

    /// Remove a previously registered listener.
    ///
    /// Returns `true` if a matching registration was removed; removing a
    /// listener that was never registered is a silent no-op.
    fn remove_event_listener(
        &self,
        kind: BuilderEventKind,
        listener: &Arc<dyn BuilderEventListener>,
    ) -> bool;
}

/// Default [`ConfigurationBuilder`] producing [`Config`] values from
/// layered sources
pub struct ConfigBuilder {
    /// Builder instance identifier, carried on emitted events
    id: uuid::Uuid,

    /// Configuration sources
    sources: Vec<ConfigSource>,

    /// Default values
    defaults: Option<serde_json::Value>,

    /// Configuration loader
    loader: Option<Arc<dyn ConfigLoader>>,

    /// Configuration validator
    validator: Option<Arc<dyn ConfigValidator>>,

    /// Configuration watcher
    watcher: Option<Arc<dyn ConfigWatcher>>,

    /// Hot reload enabled
    hot_reload: bool,

    /// Auto-reload interval
    auto_reload_interval: Option<std::time::Duration>,

    /// Whether to fail on missing optional sources
    fail_on_missing: bool,

    /// Whether repeated calls return the cached result
    result_caching: bool,

    /// Cached result (when `result_caching` is enabled)
    cached: parking_lot::Mutex<Option<Config>>,

    /// Lifecycle event listeners
    listeners: EventListenerList,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            sources: Vec::new(),
            defaults: None,
            loader: None,
            validator: None,
            watcher: None,
            hot_reload: false,
            auto_reload_interval: None,
            fail_on_missing: false,
            result_caching: false,
            cached: parking_lot::Mutex::new(None),
            listeners: EventListenerList::new(),
        }
    }

    /// Add a configuration source
    #[must_use = "builder methods must be chained or built"]
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add multiple configuration sources
    #[must_use = "builder methods must be chained or built"]
    pub fn with_sources(mut self, sources: Vec<ConfigSource>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Set default values from any serializable value
    pub fn with_defaults<T>(mut self, defaults: T) -> ConfigResult<Self>
    where
        T: serde::Serialize,
    {
        self.defaults = Some(serde_json::to_value(defaults)?);
        Ok(self)
    }

    /// Set default values from JSON
    #[must_use = "builder methods must be chained or built"]
    pub fn with_defaults_json(mut self, defaults: serde_json::Value) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Set configuration loader
    #[must_use = "builder methods must be chained or built"]
    pub fn with_loader(mut self, loader: Arc<dyn ConfigLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set configuration validator
    #[must_use = "builder methods must be chained or built"]
    pub fn with_validator(mut self, validator: Arc<dyn ConfigValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Set configuration watcher
    #[must_use = "builder methods must be chained or built"]
    pub fn with_watcher(mut self, watcher: Arc<dyn ConfigWatcher>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Enable hot reload
    #[must_use = "builder methods must be chained or built"]
    pub fn with_hot_reload(mut self, enabled: bool) -> Self {
        self.hot_reload = enabled;
        self
    }

    /// Set auto-reload interval
    #[must_use = "builder methods must be chained or built"]
    pub fn with_auto_reload_interval(mut self, interval: std::time::Duration) -> Self {
        self.auto_reload_interval = Some(interval);
        self
    }

    /// Set whether to fail on missing optional sources
    #[must_use = "builder methods must be chained or built"]
    pub fn with_fail_on_missing(mut self, fail: bool) -> Self {
        self.fail_on_missing = fail;
        self
    }

    /// Cache the first result and return it for subsequent calls.
    ///
    /// Off by default: every [`ConfigurationBuilder::get_configuration`]
    /// call performs a fresh load. A cached result is invalidated with
    /// [`reset`](Self::reset).
    #[must_use = "builder methods must be chained or built"]
    pub fn with_result_caching(mut self, enabled: bool) -> Self {
        self.result_caching = enabled;
        self
    }

    /// Builder instance identifier
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Number of registered event listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Invalidate any cached result and fire a `Reset` event
    pub fn reset(&self) {
        let had_cached = self.cached.lock().take().is_some();
        tracing::debug!(builder = %self.id, had_cached, "Builder reset");
        self.listeners.fire(
            &BuilderEvent::new(BuilderEventKind::Reset, self.id)
                .with_metadata(serde_json::json!({ "had_cached_result": had_cached })),
        );
    }

    /// Build the configuration (alias for
    /// [`ConfigurationBuilder::get_configuration`])
    pub async fn build(&self) -> ConfigResult<Config> {
        self.get_configuration().await
    }

    /// Validate builder configuration
    fn validate(&self) -> ConfigResult<()> {
        if self.sources.is_empty() && self.defaults.is_none() {
            return Err(ConfigError::validation_error(
                "No configuration sources or defaults provided",
                None,
            ));
        }

        if self.auto_reload_interval == Some(std::time::Duration::ZERO) {
            return Err(ConfigError::invalid_argument(
                "Auto-reload interval must be non-zero",
            ));
        }

        Ok(())
    }

    /// Load every source, merge, validate and assemble a fresh [`Config`]
    async fn assemble(&self) -> ConfigResult<Config> {
        let loader = self
            .loader
            .clone()
            .unwrap_or_else(|| Arc::new(CompositeLoader::default()));

        let mut sources = self.sources.clone();
        if self.defaults.is_some() {
            sources.insert(0, ConfigSource::Default);
        }

        // Load lowest-priority first so later (higher-priority) sources win
        // on merge.
        sources.sort_by_key(|s| std::cmp::Reverse(s.priority()));

        let mut merged_data = serde_json::Value::Object(serde_json::Map::new());
        let mut source_metadata = Vec::new();

        if let Some(defaults) = &self.defaults {
            tracing::debug!(
                default_keys = defaults.as_object().map_or(0, serde_json::Map::len),
                "Applying default configuration"
            );
            merged_data = defaults.clone();
        }

        for source in &sources {
            if matches!(source, ConfigSource::Default) {
                continue; // Already handled defaults
            }

            match loader.load(source).await {
                Ok(data) => {
                    tracing::debug!(
                        source = %source,
                        data_keys = data.as_object().map_or(0, serde_json::Map::len),
                        "Loaded configuration from source"
                    );
                    merge_values(&mut merged_data, data);

                    if let Ok(metadata) = loader.metadata(source).await {
                        source_metadata.push((source.clone(), metadata));
                    }
                }
                Err(e) => {
                    if self.fail_on_missing || !source.is_optional() {
                        return Err(e);
                    }
                    tracing::warn!(
                        source = %source,
                        error = %e,
                        "Skipping optional configuration source"
                    );
                }
            }
        }

        if let Some(ref validator) = self.validator {
            tracing::debug!("Validating configuration");
            validator.validate(&merged_data).await?;
        }

        let config = Config::new(
            merged_data,
            sources,
            loader,
            self.validator.clone(),
            self.watcher.clone(),
            self.hot_reload,
        );

        for (source, metadata) in source_metadata {
            config.insert_metadata(source, metadata);
        }

        if self.hot_reload {
            config.start_watching().await?;
        }

        if let Some(interval) = self.auto_reload_interval {
            Self::start_auto_reload(config.clone(), interval);
        }

        Ok(config)
    }

    /// Spawn the periodic auto-reload task
    fn start_auto_reload(config: Config, interval: std::time::Duration) {
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately
            interval_timer.tick().await;

            loop {
                interval_timer.tick().await;

                if let Err(e) = config.reload().await {
                    tracing::error!(error = %e, "Auto-reload failed");
                }
            }
        });
    }
}

#[async_trait]
impl ConfigurationBuilder for ConfigBuilder {
    type Output = Config;

    async fn get_configuration(&self) -> ConfigResult<Config> {
        self.listeners.fire(&BuilderEvent::new(
            BuilderEventKind::ConfigurationRequest,
            self.id,
        ));

        self.validate()?;

        if self.result_caching {
            if let Some(cached) = self.cached.lock().clone() {
                tracing::debug!(builder = %self.id, "Returning cached configuration");
                return Ok(cached);
            }
        }

        let config = self.assemble().await?;

        if self.result_caching {
            *self.cached.lock() = Some(config.clone());
        }

        self.listeners.fire(
            &BuilderEvent::new(BuilderEventKind::ResultCreated, self.id).with_metadata(
                serde_json::json!({ "sources": config.sources().len() }),
            ),
        );

        Ok(config)
    }

    fn add_event_listener(&self, kind: BuilderEventKind, listener: Arc<dyn BuilderEventListener>) {
        self.listeners.add(kind, listener);
    }

    fn remove_event_listener(
        &self,
        kind: BuilderEventKind,
        listener: &Arc<dyn BuilderEventListener>,
    ) -> bool {
        self.listeners.remove(kind, listener)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("id", &self.id)
            .field("sources", &self.sources.len())
            .field("has_defaults", &self.defaults.is_some())
            .field("has_loader", &self.loader.is_some())
            .field("has_validator", &self.validator.is_some())
            .field("has_watcher", &self.watcher.is_some())
            .field("hot_reload", &self.hot_reload)
            .field("auto_reload_interval", &self.auto_reload_interval)
            .field("fail_on_missing", &self.fail_on_missing)
            .field("result_caching", &self.result_caching)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
