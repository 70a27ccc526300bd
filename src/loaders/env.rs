//! Environment variable configuration loader

use crate::core::{
    ConfigError, ConfigFormat, ConfigLoader, ConfigResult, ConfigSource, SourceMetadata,
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Environment variable loader
#[derive(Debug, Clone)]
pub struct EnvLoader {
    /// Environment variable prefix
    pub prefix: Option<String>,

    /// Separator for nested keys
    pub separator: String,

    /// Case sensitivity
    pub case_sensitive: bool,

    /// Whether to log sensitive values
    pub log_sensitive: bool,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new() -> Self {
        Self {
            prefix: None,
            separator: "_".to_string(),
            case_sensitive: false,
            log_sensitive: false,
        }
    }

    /// Create a new environment loader with prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::new()
        }
    }

    /// Set separator for nested keys
    #[must_use = "builder methods must be chained or built"]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set case sensitivity
    #[must_use = "builder methods must be chained or built"]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set whether to log sensitive values
    #[must_use = "builder methods must be chained or built"]
    pub fn with_log_sensitive(mut self, log_sensitive: bool) -> Self {
        self.log_sensitive = log_sensitive;
        self
    }

    /// Check if a key is sensitive
    fn is_sensitive_key(key: &str) -> bool {
        let key_lower = key.to_lowercase();
        key_lower.contains("password")
            || key_lower.contains("secret")
            || key_lower.contains("token")
            || key_lower.contains("api_key")
            || key_lower.contains("private")
            || key_lower.contains("credential")
    }

    /// Convert environment variables to nested JSON structure
    fn env_to_json(&self, vars: HashMap<String, String>) -> serde_json::Value {
        let mut result = serde_json::Map::new();

        for (key, value) in vars {
            if Self::is_sensitive_key(&key) && !self.log_sensitive {
                tracing::trace!(key = %key, "Loading env config: [REDACTED]");
            } else {
                tracing::trace!(key = %key, value = %value, "Loading env config");
            }

            let parts: Vec<&str> = key.split(&self.separator).collect();
            self.insert_nested(&mut result, &parts, value);
        }

        serde_json::Value::Object(result)
    }

    /// Insert value into nested structure
    fn insert_nested(
        &self,
        obj: &mut serde_json::Map<String, serde_json::Value>,
        parts: &[&str],
        value: String,
    ) {
        if parts.is_empty() {
            return;
        }

        let key = if self.case_sensitive {
            parts[0].to_string()
        } else {
            parts[0].to_lowercase()
        };

        if parts.len() == 1 {
            let parsed_value = self.parse_env_value(&value);
            obj.insert(key, parsed_value);
            return;
        }

        let nested = obj
            .entry(key)
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));

        if let serde_json::Value::Object(nested_obj) = nested {
            self.insert_nested(nested_obj, &parts[1..], value);
        }
    }

    /// Parse environment variable value
    fn parse_env_value(&self, value: &str) -> serde_json::Value {
        if value.is_empty() {
            return serde_json::Value::String(String::new());
        }

        if value.eq_ignore_ascii_case("true") {
            return serde_json::Value::Bool(true);
        }
        if value.eq_ignore_ascii_case("false") {
            return serde_json::Value::Bool(false);
        }

        if let Ok(int_val) = value.parse::<i64>() {
            return serde_json::Value::Number(serde_json::Number::from(int_val));
        }

        if let Ok(float_val) = value.parse::<f64>()
            && let Some(num) = serde_json::Number::from_f64(float_val)
        {
            return serde_json::Value::Number(num);
        }

        // JSON arrays and objects are accepted verbatim
        if (value.starts_with('{') && value.ends_with('}'))
            || (value.starts_with('[') && value.ends_with(']'))
        {
            if let Ok(json_val) = serde_json::from_str(value) {
                return json_val;
            }
        }

        // Comma-separated values become arrays
        if value.contains(',') && !value.starts_with('"') {
            let items: Vec<serde_json::Value> = value
                .split(',')
                .map(|s| self.parse_env_value(s.trim()))
                .collect();
            return serde_json::Value::Array(items);
        }

        serde_json::Value::String(value.to_string())
    }

    /// Filter environment variables by prefix
    fn filter_vars(&self, prefix: &str) -> HashMap<String, String> {
        std::env::vars()
            .filter_map(|(key, value)| {
                let key_to_check = if self.case_sensitive {
                    key.clone()
                } else {
                    key.to_uppercase()
                };

                let prefix_to_check = if self.case_sensitive {
                    prefix.to_string()
                } else {
                    prefix.to_uppercase()
                };

                if key_to_check.starts_with(&prefix_to_check) {
                    let stripped_key = key_to_check
                        .strip_prefix(&prefix_to_check)
                        .unwrap_or(&key_to_check)
                        .trim_start_matches(&self.separator);

                    if stripped_key.is_empty() {
                        None
                    } else {
                        Some((stripped_key.to_string(), value))
                    }
                } else {
                    None
                }
            })
            .collect()
    }

    fn check_separator(&self) -> ConfigResult<()> {
        if self.separator.is_empty() {
            return Err(ConfigError::invalid_argument(
                "Environment key separator must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigLoader for EnvLoader {
    async fn load(&self, source: &ConfigSource) -> ConfigResult<serde_json::Value> {
        self.check_separator()?;

        match source {
            ConfigSource::Env => {
                let vars: HashMap<String, String> = if let Some(ref prefix) = self.prefix {
                    self.filter_vars(prefix)
                } else {
                    std::env::vars().collect()
                };

                tracing::debug!(count = vars.len(), "Loaded environment variables");
                Ok(self.env_to_json(vars))
            }
            ConfigSource::EnvWithPrefix(prefix) => {
                let vars = self.filter_vars(prefix);

                tracing::debug!(
                    count = vars.len(),
                    prefix = %prefix,
                    "Loaded prefixed environment variables"
                );
                Ok(self.env_to_json(vars))
            }
            _ => Err(ConfigError::source_error(
                "EnvLoader does not support this source type",
                source.name(),
            )),
        }
    }

    fn supports(&self, source: &ConfigSource) -> bool {
        source.is_env_based()
    }

    async fn metadata(&self, source: &ConfigSource) -> ConfigResult<SourceMetadata> {
        match source {
            ConfigSource::Env | ConfigSource::EnvWithPrefix(_) => {
                Ok(SourceMetadata::new(source.clone())
                    .with_format(ConfigFormat::Env)
                    .with_last_modified(chrono::Utc::now()))
            }
            _ => Err(ConfigError::source_error(
                "EnvLoader does not support this source type",
                source.name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_values_are_coerced() {
        let loader = EnvLoader::new();

        assert_eq!(loader.parse_env_value("true"), serde_json::Value::Bool(true));
        assert_eq!(
            loader.parse_env_value("FALSE"),
            serde_json::Value::Bool(false)
        );
        assert_eq!(
            loader.parse_env_value("42"),
            serde_json::Value::Number(42.into())
        );
        assert!(loader.parse_env_value("one,two,three").is_array());
        assert!(loader.parse_env_value(r#"{"key":"value"}"#).is_object());
        assert_eq!(
            loader.parse_env_value("hello world"),
            serde_json::Value::String("hello world".to_string())
        );
    }

    #[test]
    fn sensitive_keys_are_detected() {
        assert!(EnvLoader::is_sensitive_key("PASSWORD"));
        assert!(EnvLoader::is_sensitive_key("api_key"));
        assert!(EnvLoader::is_sensitive_key("SECRET_TOKEN"));
        assert!(!EnvLoader::is_sensitive_key("USERNAME"));
        assert!(!EnvLoader::is_sensitive_key("PORT"));
    }

    #[test]
    fn separator_splits_into_nested_keys() {
        let loader = EnvLoader::new();
        let mut vars = HashMap::new();
        vars.insert("SERVER_PORT".to_string(), "8080".to_string());
        vars.insert("SERVER_HOST".to_string(), "localhost".to_string());

        let value = loader.env_to_json(vars);
        assert_eq!(value["server"]["port"], 8080);
        assert_eq!(value["server"]["host"], "localhost");
    }

    #[tokio::test]
    async fn empty_separator_is_rejected() {
        let loader = EnvLoader::new().with_separator("");
        let err = loader.load(&ConfigSource::Env).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn prefixed_load_strips_prefix() {
        // Process env is shared between tests; use a unique prefix.
        unsafe {
            std::env::set_var("LAYERCONF_T1_DB_PORT", "5432");
        }

        let loader = EnvLoader::new();
        let value = loader
            .load(&ConfigSource::EnvWithPrefix("LAYERCONF_T1".to_string()))
            .await
            .unwrap();
        assert_eq!(value["db"]["port"], 5432);

        unsafe {
            std::env::remove_var("LAYERCONF_T1_DB_PORT");
        }
    }
}
