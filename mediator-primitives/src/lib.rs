//! Core shared types for the MCP mediator workspace.

#![warn(missing_docs, clippy::pedantic)]

mod annotations;
mod error;
mod ids;
mod info;

/// Behavior hints published alongside tool definitions.
pub use annotations::ToolAnnotations;
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Validated tool name and per-invocation request identifier.
pub use ids::{RequestId, ToolName};
/// Server/client identity and capability flags exchanged during initialization.
pub use info::{ClientCapability, ClientInfo, ServerInfo, PROTOCOL_VERSION};
