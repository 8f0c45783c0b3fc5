//! Connects to remote servers and discovers their tools.

use std::sync::Arc;

use mediator_config::RemoteServerConfig;
use mediator_primitives::{ClientCapability, ClientInfo};
use mediator_wire::{InitializeResult, ToolSpec};
use tracing::info;

use crate::error::RemoteResult;
use crate::session::RemoteSession;
use crate::transport;

/// A remote server after a successful handshake: the live session, the
/// identity it reported, and the tools it publishes.
pub struct ConnectedServer {
    session: Arc<RemoteSession>,
    initialize: InitializeResult,
    tools: Vec<ToolSpec>,
}

impl ConnectedServer {
    /// Returns the live session.
    #[must_use]
    pub fn session(&self) -> &Arc<RemoteSession> {
        &self.session
    }

    /// Returns the handshake result reported by the server.
    #[must_use]
    pub const fn initialize_result(&self) -> &InitializeResult {
        &self.initialize
    }

    /// Returns the tools the server publishes.
    #[must_use]
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }
}

/// Opens transports and performs the fixed connect sequence against
/// remote servers: open, `initialize`, acknowledge, `tools/list`.
#[derive(Clone, Debug)]
pub struct RemoteConnector {
    client_info: ClientInfo,
    capabilities: Vec<ClientCapability>,
}

impl RemoteConnector {
    /// Creates a connector presenting the supplied client identity.
    ///
    /// By default it declares roots with change notifications and
    /// sampling support.
    #[must_use]
    pub fn new(client_info: ClientInfo) -> Self {
        Self {
            client_info,
            capabilities: vec![
                ClientCapability::Roots { list_changed: true },
                ClientCapability::Sampling,
            ],
        }
    }

    /// Replaces the capability flags declared during the handshake.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Vec<ClientCapability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Connects to one remote server and discovers its tools.
    ///
    /// Any failure along the sequence aborts the connection attempt;
    /// there is no partial result.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::RemoteError`] describing the failing step.
    pub async fn connect(&self, config: &RemoteServerConfig) -> RemoteResult<ConnectedServer> {
        let streams = transport::open(config.name(), config.transport()).await?;
        let session = Arc::new(RemoteSession::open(
            config.name().to_owned(),
            streams,
            config.timeout(),
        ));

        let initialize = session
            .initialize(self.client_info.clone(), &self.capabilities)
            .await?;
        let tools = session.list_tools().await?;
        info!(
            server = %config.name(),
            remote = %initialize.server_info.name(),
            tools = tools.len(),
            "connected to remote server"
        );

        Ok(ConnectedServer {
            session,
            initialize,
            tools,
        })
    }
}
