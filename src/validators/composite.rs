//! Composite validator that combines multiple validators

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::core::{ConfigError, ConfigResult, ConfigValidator};

/// Composite configuration validator
///
/// Runs a list of validators either sequentially (stopping at the first
/// failure) or in parallel (aggregating every failure into one error).
pub struct CompositeValidator {
    validators: Vec<Arc<dyn ConfigValidator>>,
    parallel: bool,
}

impl std::fmt::Debug for CompositeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeValidator")
            .field("validators", &format!("{} validators", self.validators.len()))
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl CompositeValidator {
    /// Create a new composite validator
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
            parallel: false,
        }
    }

    /// Run validators concurrently and aggregate all failures
    #[must_use = "builder methods must be chained or built"]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Add a validator
    #[must_use = "builder methods must be chained or built"]
    pub fn add_validator<V: ConfigValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Add a shared validator
    #[must_use = "builder methods must be chained or built"]
    pub fn add_shared_validator(mut self, validator: Arc<dyn ConfigValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    async fn validate_sequential(&self, data: &Value) -> ConfigResult<()> {
        for validator in &self.validators {
            validator.validate(data).await?;
        }
        Ok(())
    }

    async fn validate_parallel(&self, data: &Value) -> ConfigResult<()> {
        let results = join_all(self.validators.iter().map(|v| v.validate(data))).await;

        let failures: Vec<String> = results
            .into_iter()
            .filter_map(Result::err)
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::validation_error(
                format!(
                    "{} validation check(s) failed: {}",
                    failures.len(),
                    failures.join("; ")
                ),
                None,
            ))
        }
    }
}

impl Default for CompositeValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigValidator for CompositeValidator {
    async fn validate(&self, data: &Value) -> ConfigResult<()> {
        if self.parallel {
            self.validate_parallel(data).await
        } else {
            self.validate_sequential(data).await
        }
    }
}
