//! Validators for structured responses.
//!
//! A [`Validator`] is a named predicate over a parsed JSON value. It checks shape, field
//! presence and enum membership and never mutates the value. Two ready-made forms exist:
//! - [`FnValidator`] wraps a closure (see [`validator_fn`])
//! - [`SchemaValidator`] checks a JSON-schema subset (type, required, properties, items,
//!   enum, minItems/maxItems, minLength, additionalProperties in strict mode)

use crate::structured::error::{ValidationError, ValidationOutcome};
use serde_json::{Map, Value};

/// Structural predicate applied to every structured response.
pub trait Validator: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "validator"
    }

    fn validate(&self, value: &Value) -> ValidationOutcome;
}

/// Accepts any parsed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn name(&self) -> &str {
        "accept_all"
    }

    fn validate(&self, _value: &Value) -> ValidationOutcome {
        ValidationOutcome::Accepted
    }
}

/// Closure-backed validator.
pub struct FnValidator<F> {
    name: String,
    predicate: F,
}

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value) -> ValidationOutcome + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &Value) -> ValidationOutcome {
        (self.predicate)(value)
    }
}

pub fn validator_fn<F>(name: impl Into<String>, predicate: F) -> FnValidator<F>
where
    F: Fn(&Value) -> ValidationOutcome + Send + Sync,
{
    FnValidator {
        name: name.into(),
        predicate,
    }
}

/// Require `value` to be an object.
pub fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| {
        ValidationError::with_path(format!("Expected object, got {}", type_name(value)), path)
    })
}

/// Require `value` to be an array.
pub fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, ValidationError> {
    value.as_array().ok_or_else(|| {
        ValidationError::with_path(format!("Expected array, got {}", type_name(value)), path)
    })
}

/// Require `key` to be present in `obj`.
pub fn expect_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value, ValidationError> {
    obj.get(key).ok_or_else(|| {
        ValidationError::with_path(format!("Missing required field '{}'", key), join(path, key))
    })
}

/// Require `key` to be a string field of `obj`.
pub fn expect_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a str, ValidationError> {
    let value = expect_field(obj, key, path)?;
    value.as_str().ok_or_else(|| {
        ValidationError::with_path(
            format!("Expected string, got {}", type_name(value)),
            join(path, key),
        )
    })
}

/// Join an object key onto a JSON path.
pub fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

/// Index into a JSON path.
pub fn index(path: &str, i: usize) -> String {
    format!("{}[{}]", path, i)
}

fn type_name(data: &Value) -> &'static str {
    match data {
        Value::String(_) => "string",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

/// Validator driven by a JSON-schema subset.
///
/// Reports the first violation found, depth first.
pub struct SchemaValidator {
    name: String,
    schema: Value,
    /// Disallow properties not listed in `properties`
    strict: bool,
}

impl SchemaValidator {
    pub fn new(name: impl Into<String>, schema: Value, strict: bool) -> Self {
        Self {
            name: name.into(),
            schema,
            strict,
        }
    }

    /// Create a validator with a schema (strict mode enabled).
    pub fn strict(name: impl Into<String>, schema: Value) -> Self {
        Self::new(name, schema, true)
    }

    /// Create a validator with a schema (strict mode disabled).
    pub fn lenient(name: impl Into<String>, schema: Value) -> Self {
        Self::new(name, schema, false)
    }

    fn check(&self, data: &Value, schema: &Value, path: &str) -> Result<(), ValidationError> {
        let schema_type = schema.get("type").and_then(|t| t.as_str());
        if let Some(expected) = schema_type {
            self.check_type(data, expected, path)?;
        }

        if let Some(enum_values) = schema.get("enum").and_then(|e| e.as_array()) {
            if !enum_values.contains(data) {
                let allowed: Vec<String> = enum_values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => format!("\"{}\"", s),
                        _ => v.to_string(),
                    })
                    .collect();
                return Err(ValidationError::with_path(
                    format!("Value not in allowed enum values: {}", allowed.join(", ")),
                    path,
                ));
            }
        }

        match data {
            Value::String(s) => {
                if let Some(min) = schema.get("minLength").and_then(|m| m.as_u64()) {
                    if (s.chars().count() as u64) < min {
                        return Err(ValidationError::with_path(
                            format!("String too short (minimum {} characters)", min),
                            path,
                        ));
                    }
                }
            }
            Value::Array(items) => self.check_array(items, schema, path)?,
            Value::Object(obj) => self.check_object(obj, schema, path)?,
            _ => {}
        }
        Ok(())
    }

    fn check_type(&self, data: &Value, expected: &str, path: &str) -> Result<(), ValidationError> {
        let ok = match expected {
            "string" => data.is_string(),
            "integer" => data.is_i64() || data.is_u64(),
            "number" => data.is_number(),
            "boolean" => data.is_boolean(),
            "array" => data.is_array(),
            "object" => data.is_object(),
            "null" => data.is_null(),
            _ => true, // Unknown type, accept anything
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::with_path(
                format!("Expected type '{}', got '{}'", expected, type_name(data)),
                path,
            ))
        }
    }

    fn check_array(&self, items: &[Value], schema: &Value, path: &str) -> Result<(), ValidationError> {
        if let Some(min) = schema.get("minItems").and_then(|m| m.as_u64()) {
            if (items.len() as u64) < min {
                return Err(ValidationError::with_path(
                    format!("Array too short (minimum {} items)", min),
                    path,
                ));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(|m| m.as_u64()) {
            if (items.len() as u64) > max {
                return Err(ValidationError::with_path(
                    format!("Array too long (maximum {} items)", max),
                    path,
                ));
            }
        }
        if let Some(items_schema) = schema.get("items") {
            for (i, item) in items.iter().enumerate() {
                self.check(item, items_schema, &index(path, i))?;
            }
        }
        Ok(())
    }

    fn check_object(
        &self,
        obj: &Map<String, Value>,
        schema: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
            for key in required.iter().filter_map(|v| v.as_str()) {
                expect_field(obj, key, path)?;
            }
        }

        let properties = schema.get("properties").and_then(|p| p.as_object());
        if let Some(props) = properties {
            for (key, prop_schema) in props {
                if let Some(value) = obj.get(key) {
                    self.check(value, prop_schema, &join(path, key))?;
                }
            }
        }

        let additional_allowed = schema
            .get("additionalProperties")
            .and_then(|a| a.as_bool())
            .unwrap_or(!self.strict);
        if !additional_allowed {
            for key in obj.keys() {
                if !properties.map(|p| p.contains_key(key)).unwrap_or(false) {
                    return Err(ValidationError::with_path(
                        "Additional property not allowed",
                        join(path, key),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Validator for SchemaValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &Value) -> ValidationOutcome {
        self.check(value, &self.schema, "").into()
    }
}
