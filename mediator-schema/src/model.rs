//! Structural schema model rendered onto the wire as JSON Schema.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Primitive value kinds supported by tool parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Textual value.
    String,
    /// Whole-number value.
    Integer,
    /// Floating-point value.
    Number,
    /// True/false value.
    Boolean,
}

impl PrimitiveKind {
    /// Returns the JSON Schema type keyword for this kind.
    #[must_use]
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Validation constraints attached to a parameter.
///
/// Constraint values are copied verbatim onto the generated schema node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Constraints {
    /// Creates an empty constraint set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum numeric value.
    #[must_use]
    pub const fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Sets the maximum numeric value.
    #[must_use]
    pub const fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Sets the length bounds.
    #[must_use]
    pub const fn with_length(mut self, min: u64, max: u64) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    /// Sets the regular-expression pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the textual description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the minimum numeric value, if set.
    #[must_use]
    pub const fn minimum(&self) -> Option<f64> {
        self.minimum
    }

    /// Returns the maximum numeric value, if set.
    #[must_use]
    pub const fn maximum(&self) -> Option<f64> {
        self.maximum
    }

    /// Returns the minimum length, if set.
    #[must_use]
    pub const fn min_length(&self) -> Option<u64> {
        self.min_length
    }

    /// Returns the maximum length, if set.
    #[must_use]
    pub const fn max_length(&self) -> Option<u64> {
        self.max_length
    }

    /// Returns the pattern, if set.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Returns the default value, if set.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the description, if set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns `true` when no constraint field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.maximum.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.default.is_none()
            && self.description.is_none()
    }

    fn render_into(&self, node: &mut Map<String, Value>) {
        if let Some(minimum) = self.minimum {
            node.insert("minimum".into(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            node.insert("maximum".into(), json!(maximum));
        }
        if let Some(min_length) = self.min_length {
            node.insert("minLength".into(), json!(min_length));
        }
        if let Some(max_length) = self.max_length {
            node.insert("maxLength".into(), json!(max_length));
        }
        if let Some(pattern) = &self.pattern {
            node.insert("pattern".into(), json!(pattern));
        }
        if let Some(default) = &self.default {
            node.insert("default".into(), default.clone());
        }
        if let Some(description) = &self.description {
            node.insert("description".into(), json!(description));
        }
    }
}

/// Recursive structural schema for a tool's input.
#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    /// An object with named, typed, optionally-required properties.
    Object {
        /// Optional schema identifier published alongside the object node.
        id: Option<String>,
        /// Property schemas keyed by resolved parameter name.
        properties: BTreeMap<String, Schema>,
        /// Names of properties that must be present.
        required: BTreeSet<String>,
        /// Constraints copied onto the object node.
        constraints: Constraints,
    },
    /// A homogeneous list with an item schema.
    Array {
        /// Schema of each element.
        items: Box<Schema>,
        /// Constraints copied onto the array node.
        constraints: Constraints,
    },
    /// A free-form string-keyed map.
    Map {
        /// Constraints copied onto the map node.
        constraints: Constraints,
    },
    /// A scalar leaf.
    Primitive {
        /// Primitive kind of the leaf.
        kind: PrimitiveKind,
        /// Constraints copied onto the leaf node.
        constraints: Constraints,
    },
}

impl Schema {
    /// Creates an empty object schema.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object {
            id: None,
            properties: BTreeMap::new(),
            required: BTreeSet::new(),
            constraints: Constraints::default(),
        }
    }

    /// Creates an unconstrained primitive schema.
    #[must_use]
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive {
            kind,
            constraints: Constraints::default(),
        }
    }

    /// Returns the property map when this schema is an object.
    #[must_use]
    pub const fn properties(&self) -> Option<&BTreeMap<String, Schema>> {
        match self {
            Self::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Returns the required-name set when this schema is an object.
    #[must_use]
    pub const fn required(&self) -> Option<&BTreeSet<String>> {
        match self {
            Self::Object { required, .. } => Some(required),
            _ => None,
        }
    }

    /// Renders the schema as a JSON Schema value for the wire.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut node = Map::new();
        match self {
            Self::Object {
                id,
                properties,
                required,
                constraints,
            } => {
                node.insert("type".into(), json!("object"));
                if let Some(id) = id {
                    node.insert("id".into(), json!(id));
                }
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.to_value()))
                    .collect();
                node.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    let names: Vec<Value> =
                        required.iter().map(|name| json!(name)).collect();
                    node.insert("required".into(), Value::Array(names));
                }
                constraints.render_into(&mut node);
            }
            Self::Array { items, constraints } => {
                node.insert("type".into(), json!("array"));
                node.insert("items".into(), items.to_value());
                constraints.render_into(&mut node);
            }
            Self::Map { constraints } => {
                node.insert("type".into(), json!("object"));
                constraints.render_into(&mut node);
            }
            Self::Primitive { kind, constraints } => {
                node.insert("type".into(), json!(kind.json_type()));
                constraints.render_into(&mut node);
            }
        }
        Value::Object(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_primitive_with_constraints() {
        let schema = Schema::Primitive {
            kind: PrimitiveKind::Integer,
            constraints: Constraints::new()
                .with_minimum(1.0)
                .with_maximum(10.0)
                .with_description("page count"),
        };

        let value = schema.to_value();
        assert_eq!(value["type"], "integer");
        assert_eq!(value["minimum"], 1.0);
        assert_eq!(value["maximum"], 10.0);
        assert_eq!(value["description"], "page count");
    }

    #[test]
    fn renders_object_with_required_names() {
        let mut properties = BTreeMap::new();
        properties.insert("query".to_owned(), Schema::primitive(PrimitiveKind::String));
        let schema = Schema::Object {
            id: Some("urn:schema:search".into()),
            properties,
            required: BTreeSet::from(["query".to_owned()]),
            constraints: Constraints::default(),
        };

        let value = schema.to_value();
        assert_eq!(value["type"], "object");
        assert_eq!(value["id"], "urn:schema:search");
        assert_eq!(value["properties"]["query"]["type"], "string");
        assert_eq!(value["required"][0], "query");
    }

    #[test]
    fn empty_required_set_is_omitted() {
        let value = Schema::empty_object().to_value();
        assert!(value.get("required").is_none());
    }

    #[test]
    fn renders_nested_array_items() {
        let schema = Schema::Array {
            items: Box::new(Schema::primitive(PrimitiveKind::Number)),
            constraints: Constraints::new().with_length(1, 5),
        };

        let value = schema.to_value();
        assert_eq!(value["type"], "array");
        assert_eq!(value["items"]["type"], "number");
        assert_eq!(value["minLength"], 1);
        assert_eq!(value["maxLength"], 5);
    }
}
