//! Adapters that turn callables into publishable tool definitions.

use std::str::FromStr;

use mediator_primitives::{Error as NameError, ToolAnnotations, ToolName};
use mediator_schema::{SchemaError, SchemaGenerator, describe_callable};
use serde_json::Value;
use thiserror::Error;

use crate::method::{ToolDecl, ToolMethod};

/// Result alias for adapter construction.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors produced while adapting a callable into a tool definition.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Required declarative metadata was absent.
    #[error("missing tool metadata: {detail}")]
    MissingMetadata {
        /// Which piece of metadata was missing.
        detail: String,
    },

    /// The declared or derived tool name failed validation.
    #[error("invalid tool name")]
    InvalidName {
        /// Underlying validation failure.
        #[from]
        source: NameError,
    },

    /// Input schema generation failed.
    #[error("schema generation failed")]
    Schema {
        /// Underlying generator failure.
        #[from]
        source: SchemaError,
    },
}

impl AdapterError {
    fn missing(detail: impl Into<String>) -> Self {
        Self::MissingMetadata {
            detail: detail.into(),
        }
    }
}

/// Where an adapted tool originates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ToolSource {
    /// A callable belonging to a registered service.
    Service {
        /// Name of the owning service.
        service: String,
    },
    /// A standalone registered function.
    Function,
    /// A tool published by a remote server and proxied locally.
    Remote {
        /// Name of the remote server.
        server: String,
    },
}

/// Common surface of all adapted tools, as published to the engine.
pub trait ToolAdapter: Send + Sync {
    /// Published tool name.
    fn method(&self) -> &ToolName;
    /// Published description.
    fn description(&self) -> &str;
    /// Published input schema, already in wire format.
    fn schema(&self) -> &Value;
    /// Published behavior hints, when the tool declares any.
    fn annotations(&self) -> Option<&ToolAnnotations>;
    /// Origin of the tool.
    fn source(&self) -> &ToolSource;
}

/// Adapter over a [`ToolMethod`] callable descriptor.
///
/// Name falls back to a camelCase-to-snake_case transform of the raw
/// callable name; description falls back to one synthesized from the
/// parameter metadata; schema falls back to the generator.
pub struct MethodAdapter {
    method: ToolName,
    description: String,
    schema: Value,
    annotations: Option<ToolAnnotations>,
    source: ToolSource,
}

impl MethodAdapter {
    /// Adapts a callable descriptor into a publishable tool.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidName`] when the declared or derived
    /// name fails validation, or [`AdapterError::Schema`] when schema
    /// generation fails.
    pub fn adapt(
        method: &ToolMethod,
        generator: &SchemaGenerator,
        source: ToolSource,
    ) -> AdapterResult<Self> {
        let name = match method.decl().and_then(ToolDecl::name) {
            Some(declared) => ToolName::from_str(declared)?,
            None => ToolName::derive(method.raw_name())?,
        };
        let description = match method.decl().and_then(ToolDecl::description) {
            Some(declared) => declared.to_owned(),
            None => describe_callable(name.as_str(), method.params()),
        };
        let schema = match method.decl().and_then(ToolDecl::schema_override) {
            Some(declared) => declared.clone(),
            None => generator
                .generate(name.as_str(), method.params())?
                .to_value(),
        };
        let annotations = method
            .decl()
            .map(ToolDecl::annotations)
            .filter(|annotations| !annotations.is_empty())
            .cloned();
        Ok(Self {
            method: name,
            description,
            schema,
            annotations,
            source,
        })
    }
}

impl ToolAdapter for MethodAdapter {
    fn method(&self) -> &ToolName {
        &self.method
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> Option<&ToolAnnotations> {
        self.annotations.as_ref()
    }

    fn source(&self) -> &ToolSource {
        &self.source
    }
}

/// Adapter over a fully-declared request shape.
///
/// Unlike [`MethodAdapter`] there is nothing to fall back on, so every
/// piece of metadata must be declared up front.
#[derive(Debug)]
pub struct RequestAdapter {
    method: ToolName,
    description: String,
    schema: Value,
    annotations: Option<ToolAnnotations>,
    source: ToolSource,
}

impl RequestAdapter {
    /// Adapts a declared request shape into a publishable tool.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::MissingMetadata`] when the declaration
    /// omits the name, description, or schema, and
    /// [`AdapterError::InvalidName`] when the name fails validation.
    pub fn adapt(decl: &ToolDecl, source: ToolSource) -> AdapterResult<Self> {
        let name = decl
            .name()
            .ok_or_else(|| AdapterError::missing("tool name"))?;
        let description = decl
            .description()
            .ok_or_else(|| AdapterError::missing(format!("description for '{name}'")))?;
        let schema = decl
            .schema_override()
            .ok_or_else(|| AdapterError::missing(format!("input schema for '{name}'")))?;
        let annotations = Some(decl.annotations())
            .filter(|annotations| !annotations.is_empty())
            .cloned();
        Ok(Self {
            method: ToolName::from_str(name)?,
            description: description.to_owned(),
            schema: schema.clone(),
            annotations,
            source,
        })
    }
}

impl ToolAdapter for RequestAdapter {
    fn method(&self) -> &ToolName {
        &self.method
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> Option<&ToolAnnotations> {
        self.annotations.as_ref()
    }

    fn source(&self) -> &ToolSource {
        &self.source
    }
}

/// Adapter over a tool definition published by a remote server.
///
/// Name, description, and schema are taken verbatim; they arrived in wire
/// format already.
pub struct RemoteToolAdapter {
    method: ToolName,
    description: String,
    schema: Value,
    annotations: Option<ToolAnnotations>,
    source: ToolSource,
}

impl RemoteToolAdapter {
    /// Wraps a remote tool definition.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidName`] when the remote name does not
    /// satisfy local naming rules.
    pub fn adapt(
        name: &str,
        description: impl Into<String>,
        schema: Value,
        annotations: Option<ToolAnnotations>,
        server: impl Into<String>,
    ) -> AdapterResult<Self> {
        Ok(Self {
            method: ToolName::from_str(name)?,
            description: description.into(),
            schema,
            annotations,
            source: ToolSource::Remote {
                server: server.into(),
            },
        })
    }
}

impl ToolAdapter for RemoteToolAdapter {
    fn method(&self) -> &ToolName {
        &self.method
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    fn annotations(&self) -> Option<&ToolAnnotations> {
        self.annotations.as_ref()
    }

    fn source(&self) -> &ToolSource {
        &self.source
    }
}
