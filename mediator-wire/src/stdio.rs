//! Newline-delimited JSON-RPC server engine over arbitrary byte streams.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use mediator_primitives::{PROTOCOL_VERSION, ServerInfo};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::engine::{RegisteredTool, ServerEngine, ToolCallback};
use crate::jsonrpc::{Notification, Response, WireError, WireResult, error_codes};
use crate::types::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, METHOD_INITIALIZE,
    METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, NOTIFY_INITIALIZED, NOTIFY_TOOLS_LIST_CHANGED,
    ServerCapabilities, ToolSpec, ToolsCapability, ToolsListResult,
};

/// Server engine speaking newline-delimited JSON-RPC over a byte stream
/// pair, typically stdin/stdout.
///
/// Tool registrations are held in memory; [`StdioServerEngine::serve`]
/// drives the read loop until the peer closes the stream. All outbound
/// frames, including responses produced by concurrently running tool
/// calls, funnel through a single writer task so frames never interleave.
pub struct StdioServerEngine {
    server_info: ServerInfo,
    tools: RwLock<HashMap<String, RegisteredTool>>,
    outbound_tx: mpsc::UnboundedSender<String>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl std::fmt::Debug for StdioServerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tools = self.tools.read().expect("tool table poisoned");
        let names: Vec<_> = tools.keys().cloned().collect();
        f.debug_struct("StdioServerEngine")
            .field("server", &self.server_info.name())
            .field("tools", &names)
            .finish()
    }
}

impl StdioServerEngine {
    /// Creates an engine advertising the supplied server identity.
    #[must_use]
    pub fn new(server_info: ServerInfo) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            server_info,
            tools: RwLock::new(HashMap::new()),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
        }
    }

    /// Serves the protocol over the supplied stream pair until the reader
    /// reaches end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AlreadyServing`] on a second call and
    /// [`WireError::Io`] when the transport fails.
    ///
    /// # Panics
    ///
    /// Panics if the internal receiver lock is poisoned.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> WireResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut outbound = {
            let mut slot = self.outbound_rx.lock().expect("receiver slot poisoned");
            slot.take().ok_or(WireError::AlreadyServing)?
        };

        let mut lines = BufReader::new(reader).lines();
        let mut writer = writer;
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) if line.trim().is_empty() => {}
                        Some(line) => self.handle_line(&line),
                        None => break,
                    }
                }
                frame = outbound.recv() => {
                    let Some(text) = frame else { break };
                    writer.write_all(text.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
            }
        }
        debug!(server = %self.server_info.name(), "stdio engine stream closed");
        Ok(())
    }

    fn handle_line(&self, line: &str) {
        let frame: Value = match serde_json::from_str(line) {
            Ok(frame) => frame,
            Err(parse_err) => {
                warn!(%parse_err, "discarding unparseable frame");
                self.send_response(Response::failure(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    "frame is not valid JSON",
                ));
                return;
            }
        };

        let Some(method) = frame.get("method").and_then(Value::as_str) else {
            self.send_response(Response::failure(
                frame.get("id").cloned().unwrap_or(Value::Null),
                error_codes::INVALID_REQUEST,
                "frame has no method",
            ));
            return;
        };

        match frame.get("id") {
            Some(id) if !id.is_null() => {
                self.handle_request(id.clone(), method, frame.get("params"));
            }
            _ => self.handle_notification(method),
        }
    }

    fn handle_request(&self, id: Value, method: &str, params: Option<&Value>) {
        match method {
            METHOD_INITIALIZE => self.handle_initialize(id, params),
            METHOD_TOOLS_LIST => {
                let result = ToolsListResult {
                    tools: self.list_tools(),
                };
                self.send_result(id, &result);
            }
            METHOD_TOOLS_CALL => self.handle_tool_call(id, params),
            other => {
                self.send_response(Response::failure(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("unknown method '{other}'"),
                ));
            }
        }
    }

    fn handle_initialize(&self, id: Value, params: Option<&Value>) {
        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params.clone()) {
                Ok(init) => debug!(
                    client = %init.client_info.name(),
                    version = %init.protocol_version,
                    "client initializing"
                ),
                Err(decode_err) => {
                    self.send_response(Response::failure(
                        id,
                        error_codes::INVALID_PARAMS,
                        format!("invalid initialize params: {decode_err}"),
                    ));
                    return;
                }
            }
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: true }),
            },
            server_info: self.server_info.clone(),
        };
        self.send_result(id, &result);
    }

    fn handle_tool_call(&self, id: Value, params: Option<&Value>) {
        let params = params.cloned().unwrap_or(Value::Null);
        let call: CallToolParams = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(decode_err) => {
                self.send_response(Response::failure(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("invalid tools/call params: {decode_err}"),
                ));
                return;
            }
        };

        let callback = {
            let tools = self.tools.read().expect("tool table poisoned");
            tools.get(&call.name).map(|tool| tool.callback.clone())
        };
        let Some(callback) = callback else {
            let result = CallToolResult::error(format!("tool '{}' is not registered", call.name));
            self.send_result(id, &result);
            return;
        };

        let outbound = self.outbound_tx.clone();
        tokio::spawn(async move {
            let result = callback(call.arguments).await;
            match serde_json::to_value(&result) {
                Ok(value) => send_frame(&outbound, &Response::success(id, value)),
                Err(encode_err) => {
                    error!(%encode_err, "failed to encode tool result");
                    send_frame(
                        &outbound,
                        &Response::failure(
                            id,
                            error_codes::INTERNAL_ERROR,
                            "failed to encode tool result",
                        ),
                    );
                }
            }
        });
    }

    fn handle_notification(&self, method: &str) {
        if method == NOTIFY_INITIALIZED {
            debug!("client completed initialization");
        } else {
            debug!(%method, "ignoring notification");
        }
    }

    fn send_result<T: serde::Serialize>(&self, id: Value, result: &T) {
        match serde_json::to_value(result) {
            Ok(value) => self.send_response(Response::success(id, value)),
            Err(encode_err) => {
                error!(%encode_err, "failed to encode response");
                self.send_response(Response::failure(
                    id,
                    error_codes::INTERNAL_ERROR,
                    "failed to encode response",
                ));
            }
        }
    }

    fn send_response(&self, response: Response) {
        send_frame(&self.outbound_tx, &response);
    }
}

fn send_frame<T: serde::Serialize>(tx: &mpsc::UnboundedSender<String>, frame: &T) {
    match serde_json::to_string(frame) {
        Ok(text) => {
            if tx.send(text).is_err() {
                debug!("outbound channel closed, dropping frame");
            }
        }
        Err(encode_err) => error!(%encode_err, "failed to encode outbound frame"),
    }
}

impl ServerEngine for StdioServerEngine {
    fn register_tool(&self, spec: ToolSpec, callback: ToolCallback) -> WireResult<()> {
        let mut tools = self.tools.write().expect("tool table poisoned");
        debug!(tool = %spec.name, "registering tool");
        tools.insert(spec.name.clone(), RegisteredTool { spec, callback });
        Ok(())
    }

    fn unregister_tool(&self, name: &str) -> WireResult<()> {
        let mut tools = self.tools.write().expect("tool table poisoned");
        if tools.remove(name).is_some() {
            debug!(tool = %name, "unregistered tool");
        }
        Ok(())
    }

    fn list_tools(&self) -> Vec<ToolSpec> {
        let tools = self.tools.read().expect("tool table poisoned");
        let mut specs: Vec<_> = tools.values().map(|tool| tool.spec.clone()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    fn notify_tools_changed(&self) {
        send_frame(&self.outbound_tx, &Notification::new(NOTIFY_TOOLS_LIST_CHANGED));
    }
}
