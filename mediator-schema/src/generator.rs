//! Turns declared parameter metadata into a structural schema.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Constraints, Schema};
use crate::params::{ObjectShape, ParamSpec, ParamType};

/// Result alias for schema generation.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while generating a schema from parameter metadata.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A nested object shape refers back to itself, directly or through
    /// intermediate shapes.
    #[error("object shape '{shape}' is self-referential")]
    Recursive {
        /// Name of the shape that closed the cycle.
        shape: String,
    },

    /// Nesting exceeded the generator's configured depth limit.
    #[error("schema nesting exceeded the limit of {limit} levels")]
    DepthExceeded {
        /// Configured maximum nesting depth.
        limit: usize,
    },
}

/// Generates wire schemas from declared parameter lists.
///
/// Every generated schema is a single object whose properties are the
/// resolved parameter names. Nested object shapes recurse; a shape graph
/// that loops back on itself is rejected rather than expanded forever.
#[derive(Clone, Debug)]
pub struct SchemaGenerator {
    max_depth: usize,
}

impl Default for SchemaGenerator {
    fn default() -> Self {
        Self { max_depth: 16 }
    }
}

impl SchemaGenerator {
    /// Creates a generator with the default nesting limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Generates the input schema for a callable owned by `owner`.
    ///
    /// The owner (typically the tool name) becomes part of the schema id so
    /// two tools with identical parameter lists still publish distinct ids.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Recursive`] for cyclic shape graphs and
    /// [`SchemaError::DepthExceeded`] when nesting passes the limit.
    pub fn generate(&self, owner: &str, params: &[ParamSpec]) -> SchemaResult<Schema> {
        let mut visiting = Vec::new();
        let object = self.object_from_params(params, &mut visiting, 0)?;
        match object {
            Schema::Object {
                properties,
                required,
                constraints,
                ..
            } => Ok(Schema::Object {
                id: Some(format!("urn:schema:{owner}")),
                properties,
                required,
                constraints,
            }),
            other => Ok(other),
        }
    }

    fn object_from_params(
        &self,
        params: &[ParamSpec],
        visiting: &mut Vec<String>,
        depth: usize,
    ) -> SchemaResult<Schema> {
        if depth >= self.max_depth {
            return Err(SchemaError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        let mut properties = BTreeMap::new();
        let mut required = std::collections::BTreeSet::new();
        for param in params {
            let schema = self.schema_for_type(
                param.param_type(),
                param.constraints().clone(),
                visiting,
                depth + 1,
            )?;
            let name = param.resolved_name().to_owned();
            if param.is_required() {
                required.insert(name.clone());
            }
            properties.insert(name, schema);
        }

        Ok(Schema::Object {
            id: None,
            properties,
            required,
            constraints: Constraints::default(),
        })
    }

    fn schema_for_type(
        &self,
        param_type: &ParamType,
        constraints: Constraints,
        visiting: &mut Vec<String>,
        depth: usize,
    ) -> SchemaResult<Schema> {
        if depth > self.max_depth {
            return Err(SchemaError::DepthExceeded {
                limit: self.max_depth,
            });
        }

        match param_type {
            ParamType::Primitive(kind) => Ok(Schema::Primitive {
                kind: *kind,
                constraints,
            }),
            ParamType::List(element) => {
                let items =
                    self.schema_for_type(element, Constraints::default(), visiting, depth + 1)?;
                Ok(Schema::Array {
                    items: Box::new(items),
                    constraints,
                })
            }
            ParamType::Map => Ok(Schema::Map { constraints }),
            ParamType::Object(shape) => {
                let nested = self.object_from_shape(shape, visiting, depth)?;
                match nested {
                    Schema::Object {
                        id,
                        properties,
                        required,
                        ..
                    } => Ok(Schema::Object {
                        id,
                        properties,
                        required,
                        constraints,
                    }),
                    other => Ok(other),
                }
            }
        }
    }

    fn object_from_shape(
        &self,
        shape: &ObjectShape,
        visiting: &mut Vec<String>,
        depth: usize,
    ) -> SchemaResult<Schema> {
        if visiting.iter().any(|name| name == shape.name()) {
            return Err(SchemaError::Recursive {
                shape: shape.name().to_owned(),
            });
        }

        visiting.push(shape.name().to_owned());
        let result = self.object_from_params(shape.fields(), visiting, depth);
        visiting.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::PrimitiveKind;

    #[test]
    fn generates_object_with_id_and_required() {
        let params = vec![
            ParamSpec::new("query", ParamType::string()).required(),
            ParamSpec::new("limit", ParamType::integer())
                .with_constraints(Constraints::new().with_minimum(1.0)),
        ];

        let schema = SchemaGenerator::new()
            .generate("search_docs", &params)
            .expect("schema");

        let value = schema.to_value();
        assert_eq!(value["id"], "urn:schema:search_docs");
        assert_eq!(value["properties"]["query"]["type"], "string");
        assert_eq!(value["properties"]["limit"]["minimum"], 1.0);
        assert_eq!(value["required"][0], "query");
    }

    #[test]
    fn nested_shapes_become_nested_objects() {
        let mount = ObjectShape::new(
            "Mount",
            vec![
                ParamSpec::new("source", ParamType::string()).required(),
                ParamSpec::new("readOnly", ParamType::boolean()).with_rename("read_only"),
            ],
        );
        let params = vec![ParamSpec::new(
            "mounts",
            ParamType::list_of(ParamType::Object(mount)),
        )];

        let schema = SchemaGenerator::new()
            .generate("create_container", &params)
            .expect("schema");

        let value = schema.to_value();
        let items = &value["properties"]["mounts"]["items"];
        assert_eq!(items["type"], "object");
        assert_eq!(items["properties"]["source"]["type"], "string");
        assert_eq!(items["properties"]["read_only"]["type"], "boolean");
        assert_eq!(items["required"][0], "source");
    }

    #[test]
    fn cyclic_shape_graph_is_rejected() {
        // A shape cannot literally contain itself through Arc construction,
        // so model the cycle with two shapes carrying the same name.
        let inner = ObjectShape::new("Node", vec![ParamSpec::new("leaf", ParamType::string())]);
        let outer = ObjectShape::new(
            "Node",
            vec![ParamSpec::new("child", ParamType::Object(Arc::clone(&inner)))],
        );
        let params = vec![ParamSpec::new("root", ParamType::Object(outer))];

        let err = SchemaGenerator::new()
            .generate("walk", &params)
            .expect_err("cycle should fail");
        assert!(matches!(err, SchemaError::Recursive { shape } if shape == "Node"));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let mut param_type = ParamType::Primitive(PrimitiveKind::String);
        for _ in 0..32 {
            param_type = ParamType::list_of(param_type);
        }
        let params = vec![ParamSpec::new("deep", param_type)];

        let err = SchemaGenerator::new()
            .generate("deep_tool", &params)
            .expect_err("depth should fail");
        assert!(matches!(err, SchemaError::DepthExceeded { .. }));
    }
}
