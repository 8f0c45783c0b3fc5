//! Engine boundary between the dispatcher and the underlying protocol
//! server.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::jsonrpc::WireResult;
use crate::types::{CallToolResult, ToolSpec};

/// Callback invoked by the engine when a published tool is called.
///
/// Receives the raw argument object from the wire and always produces a
/// [`CallToolResult`]; failures travel in-band via the `is_error` flag.
pub type ToolCallback =
    Arc<dyn Fn(Map<String, Value>) -> BoxFuture<'static, CallToolResult> + Send + Sync>;

/// A tool registration held by an engine: its published definition and
/// the callback that executes it.
#[derive(Clone)]
pub struct RegisteredTool {
    /// Published definition.
    pub spec: ToolSpec,
    /// Execution callback.
    pub callback: ToolCallback,
}

/// Protocol server the dispatcher publishes its tools through.
///
/// Registration is last-wins: registering a name again replaces the
/// previous entry so a refreshed tool list can be pushed wholesale.
pub trait ServerEngine: Send + Sync {
    /// Publishes a tool with its execution callback.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::WireError`] when the engine cannot accept the
    /// registration.
    fn register_tool(&self, spec: ToolSpec, callback: ToolCallback) -> WireResult<()>;

    /// Withdraws a published tool. Unknown names are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::WireError`] when the engine cannot apply the
    /// withdrawal.
    fn unregister_tool(&self, name: &str) -> WireResult<()>;

    /// Lists the currently published tool definitions.
    fn list_tools(&self) -> Vec<ToolSpec>;

    /// Emits a tools-changed notification to the connected client.
    fn notify_tools_changed(&self);
}
