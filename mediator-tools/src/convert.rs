//! Runtime registry of value converters used during argument resolution.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mediator_schema::{ParamType, PrimitiveKind};
use serde_json::{Value, json};
use thiserror::Error;

/// Result alias for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Conversion function registered under a type key.
///
/// Returns `None` when the input value cannot be represented as the
/// target type.
pub type Converter = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Errors produced while converting an argument value.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The value has no representation as the target type.
    #[error("cannot convert {value} to {target}")]
    Unconvertible {
        /// Name of the target type.
        target: String,
        /// Rendered form of the offending value.
        value: String,
    },
}

impl ConvertError {
    fn unconvertible(target: &str, value: &Value) -> Self {
        Self::Unconvertible {
            target: target.to_owned(),
            value: value.to_string(),
        }
    }
}

/// Registry that stores converters keyed by type name.
///
/// Ships defaults for the primitive kinds plus single-character strings;
/// custom converters registered under the same key replace the default.
/// Types without a registered converter fall back to structural
/// pass-through.
pub struct ConverterRegistry {
    inner: RwLock<HashMap<String, Converter>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("converter registry poisoned");
        let keys: Vec<_> = inner.keys().cloned().collect();
        f.debug_struct("ConverterRegistry")
            .field("registered", &keys)
            .finish()
    }
}

impl ConverterRegistry {
    /// Creates an empty registry with no converters at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry preloaded with the default converters.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        registry.register("string", |value: &Value| match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(number) => Some(json!(number.to_string())),
            Value::Bool(flag) => Some(json!(flag.to_string())),
            _ => None,
        });
        registry.register("integer", |value: &Value| match value {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| {
                    number
                        .as_f64()
                        .filter(|float| float.fract() == 0.0)
                        .map(|float| float as i64)
                })
                .map(|int| json!(int)),
            Value::String(text) => text.trim().parse::<i64>().ok().map(|int| json!(int)),
            _ => None,
        });
        registry.register("number", |value: &Value| match value {
            Value::Number(number) => number.as_f64().map(|float| json!(float)),
            Value::String(text) => text.trim().parse::<f64>().ok().map(|float| json!(float)),
            _ => None,
        });
        registry.register("boolean", |value: &Value| match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(text) => match text.trim() {
                "true" => Some(json!(true)),
                "false" => Some(json!(false)),
                _ => None,
            },
            _ => None,
        });
        registry.register("char", |value: &Value| match value {
            Value::String(text) if text.chars().count() == 1 => Some(value.clone()),
            _ => None,
        });
        registry
    }

    /// Registers a converter under a type key, replacing any existing one.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register<F>(&self, key: impl Into<String>, converter: F)
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        let mut inner = self.inner.write().expect("converter registry poisoned");
        inner.insert(key.into(), Arc::new(converter));
    }

    /// Converts a value using the converter registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Unconvertible`] when the converter rejects
    /// the value. An unregistered key passes the value through unchanged.
    pub fn convert_named(&self, key: &str, value: &Value) -> ConvertResult<Value> {
        let converter = {
            let inner = self.inner.read().expect("converter registry poisoned");
            inner.get(key).cloned()
        };
        match converter {
            Some(converter) => {
                converter(value).ok_or_else(|| ConvertError::unconvertible(key, value))
            }
            None => Ok(value.clone()),
        }
    }

    /// Converts a value to the declared parameter type.
    ///
    /// `Null` passes through untouched as the absent value. Lists convert
    /// element-wise; maps and objects are checked structurally and passed
    /// through.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Unconvertible`] when the value cannot be
    /// represented as the target type.
    pub fn convert(&self, value: &Value, target: &ParamType) -> ConvertResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match target {
            ParamType::Primitive(kind) => self.convert_named(primitive_key(*kind), value),
            ParamType::List(element) => {
                let Value::Array(elements) = value else {
                    return Err(ConvertError::unconvertible(&target.display_name(), value));
                };
                let converted: ConvertResult<Vec<Value>> = elements
                    .iter()
                    .map(|element_value| self.convert(element_value, element))
                    .collect();
                Ok(Value::Array(converted?))
            }
            ParamType::Map | ParamType::Object(_) => {
                if value.is_object() {
                    Ok(value.clone())
                } else {
                    Err(ConvertError::unconvertible(&target.display_name(), value))
                }
            }
        }
    }
}

const fn primitive_key(kind: PrimitiveKind) -> &'static str {
    kind.json_type()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_integer_accepts_textual_and_float_forms() {
        let registry = ConverterRegistry::with_defaults();
        let target = ParamType::integer();

        assert_eq!(registry.convert(&json!("42"), &target).unwrap(), json!(42));
        assert_eq!(registry.convert(&json!(7.0), &target).unwrap(), json!(7));
        assert!(registry.convert(&json!(7.5), &target).is_err());
        assert!(registry.convert(&json!("seven"), &target).is_err());
    }

    #[test]
    fn default_boolean_parses_strings() {
        let registry = ConverterRegistry::with_defaults();
        let target = ParamType::boolean();

        assert_eq!(
            registry.convert(&json!("true"), &target).unwrap(),
            json!(true)
        );
        assert!(registry.convert(&json!("yes"), &target).is_err());
    }

    #[test]
    fn null_passes_through() {
        let registry = ConverterRegistry::with_defaults();
        let value = registry
            .convert(&Value::Null, &ParamType::string())
            .unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn lists_convert_element_wise() {
        let registry = ConverterRegistry::with_defaults();
        let target = ParamType::list_of(ParamType::integer());

        let converted = registry.convert(&json!(["1", 2, "3"]), &target).unwrap();
        assert_eq!(converted, json!([1, 2, 3]));
    }

    #[test]
    fn custom_converter_replaces_default() {
        let registry = ConverterRegistry::with_defaults();
        registry.register("string", |value: &Value| {
            value.as_str().map(|text| json!(text.to_uppercase()))
        });

        let converted = registry
            .convert(&json!("hello"), &ParamType::string())
            .unwrap();
        assert_eq!(converted, json!("HELLO"));
    }

    #[test]
    fn char_converter_requires_single_character() {
        let registry = ConverterRegistry::with_defaults();
        assert_eq!(
            registry.convert_named("char", &json!("x")).unwrap(),
            json!("x")
        );
        assert!(registry.convert_named("char", &json!("xy")).is_err());
    }
}
