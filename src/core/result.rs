//! Result alias and helpers for working with fallible configuration operations

use super::{ConfigError, ConfigSource};
use crate::core::ConfigLoader;

/// Result type used throughout the crate
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Extension methods for [`ConfigResult`]
pub trait ConfigResultExt<T> {
    /// Attach the source that produced this error
    fn with_source_context(self, source: &ConfigSource) -> ConfigResult<T>;

    /// Turn recoverable errors (missing file, missing env var, validation)
    /// into `None`, keeping hard failures as errors
    fn recoverable_to_none(self) -> ConfigResult<Option<T>>;
}

impl<T> ConfigResultExt<T> for ConfigResult<T> {
    fn with_source_context(self, source: &ConfigSource) -> ConfigResult<T> {
        self.map_err(|e| ConfigError::source_error(e.to_string(), source.name()))
    }

    fn recoverable_to_none(self) -> ConfigResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_recoverable() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Collects per-source outcomes, keeping successes and remembering failures
#[derive(Debug, Default)]
pub struct ConfigResultAggregator {
    values: Vec<serde_json::Value>,
    errors: Vec<ConfigError>,
}

impl ConfigResultAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one source outcome
    pub fn push(&mut self, result: ConfigResult<serde_json::Value>) {
        match result {
            Ok(value) => self.values.push(value),
            Err(e) => self.errors.push(e),
        }
    }

    /// Number of successfully loaded values
    pub fn loaded(&self) -> usize {
        self.values.len()
    }

    /// Number of failed sources
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Finish: succeed if at least one source loaded, otherwise report the
    /// collected failures as a single source error
    pub fn finish(self) -> ConfigResult<Vec<serde_json::Value>> {
        if self.values.is_empty() && !self.errors.is_empty() {
            let summary = self
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigError::source_error(
                format!("All {} sources failed: {summary}", self.errors.len()),
                "aggregate",
            ));
        }
        Ok(self.values)
    }
}

/// Try sources in order, returning the first one that loads.
///
/// Failures of earlier sources are collected; if every source fails, the
/// aggregated error is returned.
pub async fn try_sources(
    loader: &dyn ConfigLoader,
    sources: &[ConfigSource],
) -> ConfigResult<serde_json::Value> {
    let mut errors = Vec::new();

    for source in sources {
        match loader.load(source).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::debug!(source = %source, error = %e, "Source failed, trying next");
                errors.push(e);
            }
        }
    }

    let summary = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Err(ConfigError::source_error(
        format!("No source could be loaded: {summary}"),
        "try_sources",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_errors_become_none() {
        let missing: ConfigResult<u32> = Err(ConfigError::file_not_found("a.toml"));
        assert_eq!(missing.recoverable_to_none().unwrap(), None);

        let hard: ConfigResult<u32> = Err(ConfigError::merge_error("boom"));
        assert!(hard.recoverable_to_none().is_err());

        let ok: ConfigResult<u32> = Ok(7);
        assert_eq!(ok.recoverable_to_none().unwrap(), Some(7));
    }

    #[test]
    fn aggregator_requires_at_least_one_success() {
        let mut agg = ConfigResultAggregator::new();
        agg.push(Err(ConfigError::file_not_found("a.toml")));
        agg.push(Err(ConfigError::env_var_not_found("APP_PORT")));
        assert_eq!(agg.failed(), 2);
        assert!(agg.finish().is_err());

        let mut agg = ConfigResultAggregator::new();
        agg.push(Ok(serde_json::json!({"k": 1})));
        agg.push(Err(ConfigError::file_not_found("b.toml")));
        assert_eq!(agg.loaded(), 1);
        assert_eq!(agg.finish().unwrap().len(), 1);
    }
}
