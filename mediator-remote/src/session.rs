//! JSON-RPC client session against one remote server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mediator_primitives::{ClientCapability, ClientInfo, PROTOCOL_VERSION};
use mediator_wire::{
    CallToolParams, CallToolResult, ClientCapabilities, InitializeParams, InitializeResult,
    METHOD_INITIALIZE, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, NOTIFY_INITIALIZED, Notification,
    Request, Response, RootsCapability, ToolSpec, ToolsListResult,
};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::transport::TransportStreams;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// A live connection to one remote server.
///
/// Calls are correlated by numeric id through a pending map; replies may
/// arrive in any order. Every call is bounded by the per-server timeout.
/// When the session is dropped its i/o tasks stop and a spawned server
/// process, if any, is killed.
pub struct RemoteSession {
    server: String,
    timeout: Duration,
    next_id: AtomicU64,
    pending: PendingMap,
    outbound: mpsc::UnboundedSender<String>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
    child: Mutex<Option<Child>>,
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("server", &self.server)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteSession {
    pub(crate) fn open(server: String, streams: TransportStreams, timeout: Duration) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        let reader_pending = Arc::clone(&pending);
        let reader_server = server.clone();
        let mut reader = BufReader::new(streams.reader).lines();
        let reader_task = tokio::spawn(async move {
            loop {
                match reader.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match serde_json::from_str::<Response>(&line) {
                        Ok(response) => route_response(&reader_pending, &reader_server, response),
                        Err(_) => debug!(server = %reader_server, "ignoring non-response frame"),
                    },
                    Ok(None) => break,
                    Err(read_err) => {
                        warn!(server = %reader_server, %read_err, "remote stream read failed");
                        break;
                    }
                }
            }
            // Dropping the senders wakes every waiter with a closed error.
            reader_pending
                .lock()
                .expect("pending map poisoned")
                .clear();
        });

        let mut writer = streams.writer;
        let writer_task = tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if writer.write_all(text.as_bytes()).await.is_err()
                    || writer.write_all(b"\n").await.is_err()
                    || writer.flush().await.is_err()
                {
                    break;
                }
            }
        });

        Self {
            server,
            timeout,
            next_id: AtomicU64::new(1),
            pending,
            outbound,
            reader_task,
            writer_task,
            child: Mutex::new(streams.child),
        }
    }

    /// Returns the name of the remote server.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Performs the initialize handshake and acknowledges it, declaring
    /// the supplied client capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Handshake`] when the result cannot be
    /// decoded, plus any transport-level [`RemoteError`].
    pub async fn initialize(
        &self,
        client_info: ClientInfo,
        capabilities: &[ClientCapability],
    ) -> RemoteResult<InitializeResult> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            capabilities: wire_capabilities(capabilities),
            client_info,
        };
        let params = self.encode(&params)?;
        let result = self.call(METHOD_INITIALIZE, Some(params)).await?;
        let result: InitializeResult =
            serde_json::from_value(result).map_err(|decode_err| RemoteError::Handshake {
                server: self.server.clone(),
                detail: decode_err.to_string(),
            })?;

        debug!(
            server = %self.server,
            remote = %result.server_info.name(),
            version = %result.protocol_version,
            "remote server initialized"
        );
        self.notify(NOTIFY_INITIALIZED)?;
        Ok(result)
    }

    /// Lists the tools published by the remote server.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Protocol`] for undecodable replies, plus
    /// any transport-level [`RemoteError`].
    pub async fn list_tools(&self) -> RemoteResult<Vec<ToolSpec>> {
        let result = self.call(METHOD_TOOLS_LIST, None).await?;
        let result: ToolsListResult = self.decode(result)?;
        Ok(result.tools)
    }

    /// Invokes a remote tool.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Timeout`] when the call exceeds the
    /// configured timeout, plus any transport-level [`RemoteError`].
    /// In-band tool failures come back as a result with `is_error` set.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> RemoteResult<CallToolResult> {
        let params = self.encode(&CallToolParams {
            name: name.to_owned(),
            arguments,
        })?;
        let result = self.call(METHOD_TOOLS_CALL, Some(params)).await?;
        self.decode(result)
    }

    /// Sends a raw request and awaits its reply.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Rpc`] for error replies,
    /// [`RemoteError::Timeout`] on expiry, and [`RemoteError::Closed`]
    /// when the connection went away.
    pub async fn call(&self, method: &str, params: Option<Value>) -> RemoteResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending map poisoned")
            .insert(id, reply_tx);

        let frame = Request::new(json!(id), method, params);
        let text = self.encode_frame(&frame, id)?;
        if self.outbound.send(text).is_err() {
            self.forget(id);
            return Err(RemoteError::Closed {
                server: self.server.clone(),
            });
        }

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Err(_elapsed) => {
                self.forget(id);
                Err(RemoteError::Timeout {
                    server: self.server.clone(),
                    method: method.to_owned(),
                })
            }
            Ok(Err(_closed)) => Err(RemoteError::Closed {
                server: self.server.clone(),
            }),
            Ok(Ok(response)) => match response.error {
                Some(error) => Err(RemoteError::Rpc {
                    server: self.server.clone(),
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(response.result.unwrap_or(Value::Null)),
            },
        }
    }

    /// Sends a notification; no reply is expected.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Closed`] when the connection went away.
    pub fn notify(&self, method: &str) -> RemoteResult<()> {
        let frame = Notification::new(method);
        let text = serde_json::to_string(&frame).map_err(|encode_err| RemoteError::Protocol {
            server: self.server.clone(),
            detail: encode_err.to_string(),
        })?;
        self.outbound
            .send(text)
            .map_err(|_| RemoteError::Closed {
                server: self.server.clone(),
            })
    }

    /// Closes the session: i/o tasks stop and a spawned server process is
    /// killed.
    ///
    /// # Panics
    ///
    /// Panics if the child-process lock is poisoned.
    pub fn close(&self) {
        self.reader_task.abort();
        self.writer_task.abort();
        if let Some(mut child) = self.child.lock().expect("child lock poisoned").take() {
            let _ = child.start_kill();
        }
    }

    fn forget(&self, id: u64) {
        self.pending
            .lock()
            .expect("pending map poisoned")
            .remove(&id);
    }

    fn encode<T: serde::Serialize>(&self, payload: &T) -> RemoteResult<Value> {
        serde_json::to_value(payload).map_err(|encode_err| RemoteError::Protocol {
            server: self.server.clone(),
            detail: encode_err.to_string(),
        })
    }

    fn encode_frame(&self, frame: &Request, id: u64) -> RemoteResult<String> {
        serde_json::to_string(frame).map_err(|encode_err| {
            self.forget(id);
            RemoteError::Protocol {
                server: self.server.clone(),
                detail: encode_err.to_string(),
            }
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(&self, value: Value) -> RemoteResult<T> {
        serde_json::from_value(value).map_err(|decode_err| RemoteError::Protocol {
            server: self.server.clone(),
            detail: decode_err.to_string(),
        })
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Translates declared capability flags into their wire shape.
pub(crate) fn wire_capabilities(capabilities: &[ClientCapability]) -> ClientCapabilities {
    let mut wire = ClientCapabilities {
        roots: None,
        sampling: None,
    };
    for capability in capabilities {
        match capability {
            ClientCapability::Roots { list_changed } => {
                wire.roots = Some(RootsCapability {
                    list_changed: *list_changed,
                });
            }
            ClientCapability::Sampling => {
                wire.sampling = Some(Map::new());
            }
        }
    }
    wire
}

fn route_response(pending: &PendingMap, server: &str, response: Response) {
    if response.result.is_none() && response.error.is_none() {
        // A server-initiated request also decodes here; it is not a reply.
        debug!(%server, "discarding frame that is not a reply");
        return;
    }
    let Some(id) = response.id.as_u64() else {
        debug!(%server, "discarding response without numeric id");
        return;
    };
    let sender = pending.lock().expect("pending map poisoned").remove(&id);
    match sender {
        Some(sender) => {
            let _ = sender.send(response);
        }
        None => debug!(%server, id, "discarding reply with no waiter"),
    }
}
