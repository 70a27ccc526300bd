//! Function-based configuration validator

use async_trait::async_trait;
use serde_json::Value;

use crate::core::config::get_nested_value;
use crate::core::{ConfigError, ConfigResult, ConfigValidator};

type ValidatorFn = Box<dyn Fn(&Value) -> ConfigResult<()> + Send + Sync>;

/// Validator driven by user-supplied closures
///
/// Built through [`FunctionValidatorBuilder`], which lets callers mix
/// whole-document checks with per-field checks addressed by dot path.
pub struct FunctionValidator {
    validators: Vec<(String, ValidatorFn)>,
    schema: Option<Value>,
}

impl std::fmt::Debug for FunctionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionValidator")
            .field("validators", &format!("{} checks", self.validators.len()))
            .field("has_schema", &self.schema.is_some())
            .finish()
    }
}

impl FunctionValidator {
    /// Create a builder for assembling validation checks
    pub fn builder() -> FunctionValidatorBuilder {
        FunctionValidatorBuilder::new()
    }

    /// Create a validator from a single whole-document check
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> ConfigResult<()> + Send + Sync + 'static,
    {
        Self::builder().add_validator(name, f).build()
    }

    /// Number of registered checks
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether no checks are registered
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

#[async_trait]
impl ConfigValidator for FunctionValidator {
    async fn validate(&self, data: &Value) -> ConfigResult<()> {
        for (name, check) in &self.validators {
            check(data).map_err(|e| {
                tracing::debug!(check = %name, error = %e, "Validation check failed");
                e
            })?;
        }
        Ok(())
    }

    fn schema(&self) -> Option<Value> {
        self.schema.clone()
    }
}

/// Builder for [`FunctionValidator`]
#[derive(Default)]
pub struct FunctionValidatorBuilder {
    validators: Vec<(String, ValidatorFn)>,
    schema: Option<Value>,
}

impl std::fmt::Debug for FunctionValidatorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionValidatorBuilder")
            .field("validators", &format!("{} checks", self.validators.len()))
            .finish()
    }
}

impl FunctionValidatorBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named whole-document check
    #[must_use = "builder methods must be chained or built"]
    pub fn add_validator<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> ConfigResult<()> + Send + Sync + 'static,
    {
        self.validators.push((name.into(), Box::new(f)));
        self
    }

    /// Add a check for the value at a dot-separated path
    ///
    /// The check receives `None` when the path does not resolve.
    #[must_use = "builder methods must be chained or built"]
    pub fn validate_field<F>(self, path: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> ConfigResult<()> + Send + Sync + 'static,
    {
        let path = path.into();
        let name = format!("field:{path}");
        let field_path = path.clone();
        self.add_validator(name, move |data| {
            f(get_nested_value(data, &field_path).ok())
        })
    }

    /// Require that a dot-separated path resolves to a non-null value
    #[must_use = "builder methods must be chained or built"]
    pub fn require_field(self, path: impl Into<String>) -> Self {
        let path = path.into();
        let err_path = path.clone();
        self.validate_field(path, move |value| match value {
            Some(v) if !v.is_null() => Ok(()),
            _ => Err(ConfigError::validation_error(
                format!("Required field '{err_path}' is missing"),
                Some(err_path.clone()),
            )),
        })
    }

    /// Attach a declarative schema exposed via [`ConfigValidator::schema`]
    #[must_use = "builder methods must be chained or built"]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Build the validator
    pub fn build(self) -> FunctionValidator {
        FunctionValidator {
            validators: self.validators,
            schema: self.schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn checks_run_in_registration_order() {
        let validator = FunctionValidator::builder()
            .add_validator("always-ok", |_| Ok(()))
            .add_validator("reject-empty", |data| {
                if data.as_object().is_some_and(serde_json::Map::is_empty) {
                    Err(ConfigError::validation_error(
                        "Configuration must not be empty",
                        None,
                    ))
                } else {
                    Ok(())
                }
            })
            .build();

        assert!(validator.validate(&json!({"a": 1})).await.is_ok());
        assert!(validator.validate(&json!({})).await.is_err());
    }

    #[tokio::test]
    async fn require_field_resolves_dot_paths() {
        let validator = FunctionValidator::builder()
            .require_field("server.port")
            .build();

        assert!(
            validator
                .validate(&json!({"server": {"port": 8080}}))
                .await
                .is_ok()
        );

        let err = validator
            .validate(&json!({"server": {}}))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn field_check_sees_missing_values_as_none() {
        let validator = FunctionValidator::builder()
            .validate_field("server.port", |value| match value {
                Some(v) if v.as_u64().is_some_and(|p| p > 0 && p < 65536) => Ok(()),
                Some(_) => Err(ConfigError::validation_error(
                    "Port must be between 1 and 65535",
                    Some("server.port".to_string()),
                )),
                None => Ok(()), // optional
            })
            .build();

        assert!(validator.validate(&json!({})).await.is_ok());
        assert!(
            validator
                .validate(&json!({"server": {"port": 70000}}))
                .await
                .is_err()
        );
    }
}
