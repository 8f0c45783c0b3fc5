//! Inbound mediator request.

use mediator_primitives::{RequestId, ToolName};
use serde_json::{Map, Value};

/// A tool invocation routed through the mediator.
///
/// Requests are routed by tool name; the correlation id travels with the
/// request for logging and tracing.
#[derive(Clone, Debug)]
pub struct Request {
    id: RequestId,
    tool: ToolName,
    arguments: Map<String, Value>,
}

impl Request {
    /// Creates a request with a fresh correlation id.
    #[must_use]
    pub fn new(tool: ToolName, arguments: Map<String, Value>) -> Self {
        Self {
            id: RequestId::random(),
            tool,
            arguments,
        }
    }

    /// Creates a request with an explicit correlation id.
    #[must_use]
    pub fn with_id(id: RequestId, tool: ToolName, arguments: Map<String, Value>) -> Self {
        Self {
            id,
            tool,
            arguments,
        }
    }

    /// Returns the correlation id.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the requested tool name.
    #[must_use]
    pub const fn tool(&self) -> &ToolName {
        &self.tool
    }

    /// Returns the argument object.
    #[must_use]
    pub const fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }
}
