//! Proxying dispatcher: republishes remote tools through a local engine.

use std::sync::{Arc, Mutex};

use mediator_config::ProxyConfig;
use mediator_kernel::{DefaultMediator, DispatchError, DispatchResult, Request, RequestHandler};
use mediator_primitives::ClientInfo;
use mediator_tools::AdapterError;
use mediator_wire::{CallToolResult, ServerEngine, ToolCallback, WireError};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::connector::RemoteConnector;
use crate::error::RemoteError;
use crate::handler::RemoteToolHandler;
use crate::session::RemoteSession;

/// Errors produced while initializing or running a proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A remote server could not be connected; the whole initialization
    /// is aborted.
    #[error("remote connection failed")]
    Remote {
        /// Underlying remote failure.
        #[from]
        source: RemoteError,
    },

    /// The local dispatcher could not be initialized.
    #[error("local dispatch failed")]
    Dispatch {
        /// Underlying dispatch failure.
        #[from]
        source: DispatchError,
    },

    /// A remote tool could not be adapted for local publication.
    #[error("remote tool adaptation failed")]
    Adapter {
        /// Underlying adaptation failure.
        #[from]
        source: AdapterError,
    },

    /// The engine rejected a registration.
    #[error("engine operation failed")]
    Engine {
        /// Underlying engine failure.
        #[from]
        source: WireError,
    },

    /// The proxy's client identity failed validation.
    #[error("invalid proxy identity")]
    Identity {
        /// Underlying validation failure.
        #[from]
        source: mediator_primitives::Error,
    },
}

/// A mediator that serves its own tools plus every tool published by the
/// configured remote servers.
///
/// Engine callbacks for remote tools forward straight to the remote
/// session; a [`RemoteToolHandler`] is registered as well so nested
/// dispatches made by local handlers reach remote tools.
pub struct ProxyMediator {
    mediator: DefaultMediator,
    config: ProxyConfig,
    connector: RemoteConnector,
    sessions: Mutex<Vec<Arc<RemoteSession>>>,
}

impl std::fmt::Debug for ProxyMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyMediator")
            .field("server", &self.config.base().server_info().name())
            .field("remotes", &self.config.remotes().len())
            .finish_non_exhaustive()
    }
}

impl ProxyMediator {
    /// Creates a proxy for the supplied configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Identity`] when the base server identity
    /// cannot be presented as a client identity.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let server_info = config.base().server_info();
        let client_info = ClientInfo::new(server_info.name(), server_info.version())?;
        Ok(Self {
            mediator: DefaultMediator::from_config(config.base()),
            config,
            connector: RemoteConnector::new(client_info),
            sessions: Mutex::new(Vec::new()),
        })
    }

    /// Returns the underlying local mediator.
    #[must_use]
    pub const fn mediator(&self) -> &DefaultMediator {
        &self.mediator
    }

    /// Registers a local handler; see
    /// [`DefaultMediator::register_handler`].
    ///
    /// # Errors
    ///
    /// Propagates any [`DispatchError`] from the underlying mediator.
    pub fn register_handler(&self, handler: Arc<dyn RequestHandler>) -> DispatchResult<()> {
        self.mediator.register_handler(handler)
    }

    /// Executes a request locally; remote tools are reachable too.
    ///
    /// # Errors
    ///
    /// Propagates any [`DispatchError`] from the dispatch.
    pub async fn execute(&self, request: Request) -> DispatchResult<Value> {
        self.mediator.execute(request).await
    }

    /// Connects every configured remote server, attaches the engine, and
    /// publishes local plus remote tools.
    ///
    /// Any connect or handshake failure aborts the whole initialization.
    /// Exactly one tools-changed notification is emitted at the end.
    ///
    /// # Errors
    ///
    /// Returns the first failure along the sequence.
    ///
    /// # Panics
    ///
    /// Panics if the session list lock is poisoned.
    pub async fn initialize(&self, engine: Arc<dyn ServerEngine>) -> Result<(), ProxyError> {
        if !self.config.base().tools_enabled() {
            // Remote republication is pointless without tool support.
            self.mediator.initialize(engine)?;
            info!(
                server = %self.config.base().server_info().name(),
                "tool support disabled, skipping remote connections"
            );
            return Ok(());
        }

        let mut connected = Vec::with_capacity(self.config.remotes().len());
        for remote in self.config.remotes() {
            connected.push(self.connector.connect(remote).await?);
        }

        let mut forwards = Vec::new();
        for server in &connected {
            let session = Arc::clone(server.session());
            let specs = server.tools().to_vec();
            let handler = RemoteToolHandler::new(Arc::clone(&session), specs.clone())?;
            self.mediator.register_handler(Arc::new(handler))?;
            for spec in specs {
                // Exclusions cover remote tools too.
                if self.config.base().excluded().contains(&spec.name) {
                    continue;
                }
                forwards.push((Arc::clone(&session), spec));
            }
        }

        self.mediator.initialize(Arc::clone(&engine))?;

        // Replace the dispatch-path callbacks for remote tools with
        // direct forwarding; registration is last-wins.
        let forwarded = forwards.len();
        for (session, spec) in forwards {
            let callback = forwarding_callback(session, spec.name.clone());
            engine.register_tool(spec, callback)?;
        }
        engine.notify_tools_changed();

        let mut sessions = self.sessions.lock().expect("session list poisoned");
        sessions.extend(connected.iter().map(|server| Arc::clone(server.session())));
        info!(
            server = %self.config.base().server_info().name(),
            remotes = connected.len(),
            remote_tools = forwarded,
            "proxy initialized"
        );
        Ok(())
    }

    /// Stops the proxy: the local mediator stops and every remote
    /// session is closed.
    ///
    /// # Panics
    ///
    /// Panics if the session list lock is poisoned.
    pub fn stop(&self) {
        self.mediator.stop();
        let sessions = self.sessions.lock().expect("session list poisoned");
        for session in sessions.iter() {
            session.close();
        }
    }
}

fn forwarding_callback(session: Arc<RemoteSession>, tool: String) -> ToolCallback {
    Arc::new(move |arguments| {
        let session = Arc::clone(&session);
        let tool = tool.clone();
        Box::pin(async move {
            match session.call_tool(&tool, arguments).await {
                Ok(result) => result,
                Err(remote_err) => CallToolResult::error(remote_err.to_string()),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use mediator_config::MediatorConfig;
    use mediator_primitives::ServerInfo;

    use super::*;

    #[test]
    fn proxy_without_remotes_builds() {
        let base = MediatorConfig::builder(ServerInfo::new("proxy", "0.1.0").unwrap())
            .build()
            .unwrap();
        let config = ProxyConfig::builder(base).build().unwrap();
        let proxy = ProxyMediator::new(config).unwrap();
        assert!(!proxy.mediator().is_running());
    }
}
