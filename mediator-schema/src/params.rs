//! Declarative parameter metadata attached to tool callables.

use std::sync::Arc;

use crate::model::{Constraints, PrimitiveKind};

/// Type classification of a tool parameter.
#[derive(Clone, Debug)]
pub enum ParamType {
    /// A scalar leaf value.
    Primitive(PrimitiveKind),
    /// A homogeneous list of elements.
    List(Box<ParamType>),
    /// A free-form string-keyed map.
    Map,
    /// A nested object with its own declared fields.
    ///
    /// Shapes are reference-counted so several parameters can share one
    /// declaration; the generator detects self-referential shape graphs.
    Object(Arc<ObjectShape>),
}

impl ParamType {
    /// Convenience constructor for a list of the supplied element type.
    #[must_use]
    pub fn list_of(element: ParamType) -> Self {
        Self::List(Box::new(element))
    }

    /// Convenience constructor for a shorthand string parameter.
    #[must_use]
    pub const fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    /// Convenience constructor for a shorthand integer parameter.
    #[must_use]
    pub const fn integer() -> Self {
        Self::Primitive(PrimitiveKind::Integer)
    }

    /// Convenience constructor for a shorthand number parameter.
    #[must_use]
    pub const fn number() -> Self {
        Self::Primitive(PrimitiveKind::Number)
    }

    /// Convenience constructor for a shorthand boolean parameter.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Primitive(PrimitiveKind::Boolean)
    }

    /// Human-readable name of this type, used by the describer.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Primitive(kind) => kind.json_type().to_owned(),
            Self::List(element) => format!("list of {}", element.display_name()),
            Self::Map => "map".to_owned(),
            Self::Object(shape) => shape.name().to_owned(),
        }
    }
}

/// Declared shape of a nested object parameter.
#[derive(Clone, Debug)]
pub struct ObjectShape {
    name: String,
    fields: Vec<ParamSpec>,
}

impl ObjectShape {
    /// Creates a named object shape from its field specs.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<ParamSpec>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fields,
        })
    }

    /// Returns the shape's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared fields.
    #[must_use]
    pub fn fields(&self) -> &[ParamSpec] {
        &self.fields
    }
}

/// Declarative metadata for a single tool parameter.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    name: String,
    rename: Option<String>,
    param_type: ParamType,
    required: bool,
    constraints: Constraints,
}

impl ParamSpec {
    /// Creates a parameter spec with the raw callable-side name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            rename: None,
            param_type,
            required: false,
            constraints: Constraints::default(),
        }
    }

    /// Overrides the wire-facing name of this parameter.
    #[must_use]
    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    /// Marks this parameter as required (must not be absent).
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attaches validation constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Returns the raw callable-side name.
    #[must_use]
    pub fn raw_name(&self) -> &str {
        &self.name
    }

    /// Returns the wire-facing name: the explicit override when present,
    /// the raw name otherwise.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    /// Returns the parameter type.
    #[must_use]
    pub const fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    /// Returns whether this parameter must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the attached constraints.
    #[must_use]
    pub const fn constraints(&self) -> &Constraints {
        &self.constraints
    }
}
