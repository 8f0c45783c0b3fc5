//! Wire layer: JSON-RPC 2.0 framing, tool-call payload types, and the
//! engine boundary the dispatcher publishes tools through.

#![warn(missing_docs, clippy::pedantic)]

mod engine;
mod jsonrpc;
mod stdio;
mod types;

pub use engine::{RegisteredTool, ServerEngine, ToolCallback};
pub use jsonrpc::{
    ErrorObject, JSONRPC_VERSION, Notification, Request, Response, WireError, WireResult,
    error_codes,
};
pub use stdio::StdioServerEngine;
pub use types::{
    CallToolParams, CallToolResult, ClientCapabilities, Content, InitializeParams,
    InitializeResult, METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, NOTIFY_INITIALIZED,
    NOTIFY_TOOLS_LIST_CHANGED, RootsCapability, ServerCapabilities, ToolSpec, ToolsCapability,
    ToolsListResult,
};
