//! Payload types for the tool-call protocol methods.

use mediator_primitives::{ClientInfo, ServerInfo, ToolAnnotations};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session handshake request method.
pub const METHOD_INITIALIZE: &str = "initialize";
/// Tool enumeration request method.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// Tool invocation request method.
pub const METHOD_TOOLS_CALL: &str = "tools/call";
/// Notification sent by a client after a completed handshake.
pub const NOTIFY_INITIALIZED: &str = "notifications/initialized";
/// Notification sent by a server whose tool list changed.
pub const NOTIFY_TOOLS_LIST_CHANGED: &str = "notifications/tools/list_changed";

/// A published tool definition as it appears in `tools/list`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    /// Published tool name, the routing key for `tools/call`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema of the tool's input object.
    pub input_schema: Value,
    /// Advisory behavior hints, when the tool declares any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

/// One content block of a tool-call result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text content.
    Text {
        /// The text payload.
        text: String,
    },
}

/// Result of a tool invocation.
///
/// Failures are carried in-band: `is_error` is set and the content
/// describes what went wrong. The wire frame itself is still a success.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content blocks produced by the tool.
    pub content: Vec<Content>,
    /// Whether this result describes a failure.
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an in-band failure result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Creates a successful result from an arbitrary JSON value, rendered
    /// as a text block.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(text) => Self::text(text.clone()),
            other => Self::text(other.to_string()),
        }
    }
}

/// Parameters of a `tools/call` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to invoke.
    pub name: String,
    /// Argument object keyed by parameter name.
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Roots capability flags advertised by a client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootsCapability {
    /// Whether the client notifies on root-list changes.
    #[serde(default)]
    pub list_changed: bool,
}

/// Capability flags advertised by a client during `initialize`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Context-roots support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<RootsCapability>,
    /// Model-sampling support; presence of the object signals support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Map<String, Value>>,
}

/// Tools capability flags advertised by a server.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether the server emits tools-changed notifications.
    #[serde(default)]
    pub list_changed: bool,
}

/// Capability flags advertised by a server during `initialize`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Parameters of an `initialize` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol revision the client speaks.
    pub protocol_version: String,
    /// Capability flags of the client.
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    /// Client identity.
    pub client_info: ClientInfo,
}

/// Result of an `initialize` request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol revision the server speaks.
    pub protocol_version: String,
    /// Capability flags of the server.
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    /// Server identity.
    pub server_info: ServerInfo,
}

/// Result of a `tools/list` request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolsListResult {
    /// All currently published tools.
    pub tools: Vec<ToolSpec>,
}
