//! Validator that accepts every configuration

use async_trait::async_trait;

use crate::core::{ConfigResult, ConfigValidator};

/// Validator that performs no validation
///
/// Used as the default when a builder is constructed without an explicit
/// validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpValidator;

impl NoOpValidator {
    /// Create a new no-op validator
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConfigValidator for NoOpValidator {
    async fn validate(&self, _config: &serde_json::Value) -> ConfigResult<()> {
        Ok(())
    }
}
