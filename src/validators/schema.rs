//! Declarative schema-based configuration validator

use async_trait::async_trait;
use serde_json::Value;

use crate::core::config::json_type_name;
use crate::core::{ConfigError, ConfigResult, ConfigValidator};

/// Schema-based validator
///
/// Supports a practical subset of JSON Schema: `type`, `enum`, `required`,
/// `properties`, `additionalProperties`, `items`, numeric `minimum`/`maximum`
/// and string `minLength`/`maxLength`.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    /// Declarative schema
    schema: Value,
    /// Whether properties not listed in the schema are accepted
    allow_additional: bool,
}

impl SchemaValidator {
    /// Create a new schema validator
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            allow_additional: true,
        }
    }

    /// Create from a schema string
    pub fn from_json(schema_json: &str) -> ConfigResult<Self> {
        let schema = serde_json::from_str(schema_json)?;
        Ok(Self::new(schema))
    }

    /// Set whether to allow additional properties
    #[must_use = "builder methods must be chained or built"]
    pub fn with_allow_additional(mut self, allow: bool) -> Self {
        self.allow_additional = allow;
        self
    }

    fn validate_recursive(&self, data: &Value, schema: &Value, path: &str) -> ConfigResult<()> {
        match schema {
            Value::Object(schema_obj) => self.validate_with_schema_object(data, schema_obj, path),
            Value::Bool(allow_all) => {
                if *allow_all {
                    Ok(())
                } else {
                    Err(ConfigError::validation_error(
                        format!("Schema forbids any value at path '{path}'"),
                        Some(path.to_string()),
                    ))
                }
            }
            _ => Err(ConfigError::validation_error(
                format!("Invalid schema format at path '{path}'"),
                Some(path.to_string()),
            )),
        }
    }

    fn validate_with_schema_object(
        &self,
        data: &Value,
        schema_obj: &serde_json::Map<String, Value>,
        path: &str,
    ) -> ConfigResult<()> {
        if let Some(type_val) = schema_obj.get("type") {
            Self::validate_type(data, type_val, path)?;
        }

        if let Some(enum_val) = schema_obj.get("enum") {
            Self::validate_enum(data, enum_val, path)?;
        }

        match data {
            Value::Object(obj) => self.validate_object(obj, schema_obj, path)?,
            Value::Array(arr) => self.validate_array(arr, schema_obj, path)?,
            Value::String(s) => Self::validate_string(s, schema_obj, path)?,
            Value::Number(n) => Self::validate_number(n, schema_obj, path)?,
            _ => {}
        }

        Ok(())
    }

    fn validate_type(data: &Value, type_val: &Value, path: &str) -> ConfigResult<()> {
        let types: Vec<&str> = if let Some(type_str) = type_val.as_str() {
            vec![type_str]
        } else if let Some(type_arr) = type_val.as_array() {
            type_arr.iter().filter_map(Value::as_str).collect()
        } else {
            return Ok(());
        };

        let data_type = json_type_name(data);

        // "number" accepts integers too
        let matches = types
            .iter()
            .any(|t| *t == data_type || (*t == "number" && data_type == "integer"));

        if matches {
            Ok(())
        } else {
            Err(ConfigError::validation_error(
                format!(
                    "Value at '{path}' has type '{data_type}' but schema expects {}",
                    types.join(" or ")
                ),
                Some(path.to_string()),
            ))
        }
    }

    fn validate_enum(data: &Value, enum_val: &Value, path: &str) -> ConfigResult<()> {
        let Some(allowed) = enum_val.as_array() else {
            return Ok(());
        };

        if allowed.contains(data) {
            Ok(())
        } else {
            Err(ConfigError::validation_error(
                format!("Value at '{path}' is not one of the allowed enum values"),
                Some(path.to_string()),
            ))
        }
    }

    fn validate_object(
        &self,
        obj: &serde_json::Map<String, Value>,
        schema_obj: &serde_json::Map<String, Value>,
        path: &str,
    ) -> ConfigResult<()> {
        if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
            for key in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(key) {
                    return Err(ConfigError::validation_error(
                        format!("Required property '{key}' is missing at '{path}'"),
                        Some(join_path(path, key)),
                    ));
                }
            }
        }

        let properties = schema_obj.get("properties").and_then(Value::as_object);

        if let Some(properties) = properties {
            for (key, prop_schema) in properties {
                if let Some(value) = obj.get(key) {
                    self.validate_recursive(value, prop_schema, &join_path(path, key))?;
                }
            }
        }

        let allow_additional = schema_obj
            .get("additionalProperties")
            .and_then(Value::as_bool)
            .unwrap_or(self.allow_additional);

        if !allow_additional {
            let known = properties.map(|p| p.keys().collect::<Vec<_>>());
            for key in obj.keys() {
                if !known.as_ref().is_some_and(|k| k.contains(&key)) {
                    return Err(ConfigError::validation_error(
                        format!("Unexpected property '{key}' at '{path}'"),
                        Some(join_path(path, key)),
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_array(
        &self,
        arr: &[Value],
        schema_obj: &serde_json::Map<String, Value>,
        path: &str,
    ) -> ConfigResult<()> {
        if let Some(items_schema) = schema_obj.get("items") {
            for (i, item) in arr.iter().enumerate() {
                self.validate_recursive(item, items_schema, &format!("{path}[{i}]"))?;
            }
        }
        Ok(())
    }

    fn validate_string(
        s: &str,
        schema_obj: &serde_json::Map<String, Value>,
        path: &str,
    ) -> ConfigResult<()> {
        let len = s.chars().count() as u64;

        if let Some(min) = schema_obj.get("minLength").and_then(Value::as_u64)
            && len < min
        {
            return Err(ConfigError::validation_error(
                format!("String at '{path}' is shorter than minLength {min}"),
                Some(path.to_string()),
            ));
        }

        if let Some(max) = schema_obj.get("maxLength").and_then(Value::as_u64)
            && len > max
        {
            return Err(ConfigError::validation_error(
                format!("String at '{path}' is longer than maxLength {max}"),
                Some(path.to_string()),
            ));
        }

        Ok(())
    }

    fn validate_number(
        n: &serde_json::Number,
        schema_obj: &serde_json::Map<String, Value>,
        path: &str,
    ) -> ConfigResult<()> {
        let Some(value) = n.as_f64() else {
            return Ok(());
        };

        if let Some(min) = schema_obj.get("minimum").and_then(Value::as_f64)
            && value < min
        {
            return Err(ConfigError::validation_error(
                format!("Value at '{path}' is below minimum {min}"),
                Some(path.to_string()),
            ));
        }

        if let Some(max) = schema_obj.get("maximum").and_then(Value::as_f64)
            && value > max
        {
            return Err(ConfigError::validation_error(
                format!("Value at '{path}' is above maximum {max}"),
                Some(path.to_string()),
            ));
        }

        Ok(())
    }
}

fn join_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

#[async_trait]
impl ConfigValidator for SchemaValidator {
    async fn validate(&self, data: &Value) -> ConfigResult<()> {
        self.validate_recursive(data, &self.schema, "")
    }

    fn schema(&self) -> Option<Value> {
        Some(self.schema.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server_schema() -> SchemaValidator {
        SchemaValidator::new(json!({
            "type": "object",
            "required": ["server"],
            "properties": {
                "server": {
                    "type": "object",
                    "required": ["port"],
                    "properties": {
                        "port": {"type": "integer", "minimum": 1, "maximum": 65535},
                        "host": {"type": "string", "minLength": 1},
                        "mode": {"enum": ["dev", "prod"]}
                    }
                }
            }
        }))
    }

    #[tokio::test]
    async fn valid_document_passes() {
        let result = server_schema()
            .validate(&json!({"server": {"port": 8080, "host": "localhost", "mode": "dev"}}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_required_property_fails_with_field_path() {
        let err = server_schema()
            .validate(&json!({"server": {"host": "localhost"}}))
            .await
            .unwrap_err();

        match err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field.as_deref(), Some("server.port"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn type_and_range_violations_fail() {
        let schema = server_schema();

        assert!(
            schema
                .validate(&json!({"server": {"port": "8080"}}))
                .await
                .is_err()
        );
        assert!(
            schema
                .validate(&json!({"server": {"port": 0}}))
                .await
                .is_err()
        );
        assert!(
            schema
                .validate(&json!({"server": {"port": 80, "mode": "staging"}}))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn additional_properties_can_be_forbidden() {
        let schema = SchemaValidator::new(json!({
            "type": "object",
            "properties": {"known": {"type": "string"}},
            "additionalProperties": false
        }));

        assert!(schema.validate(&json!({"known": "yes"})).await.is_ok());
        assert!(schema.validate(&json!({"unknown": 1})).await.is_err());
    }

    #[tokio::test]
    async fn array_items_are_validated() {
        let schema = SchemaValidator::new(json!({
            "type": "array",
            "items": {"type": "integer"}
        }));

        assert!(schema.validate(&json!([1, 2, 3])).await.is_ok());
        assert!(schema.validate(&json!([1, "two"])).await.is_err());
    }
}
