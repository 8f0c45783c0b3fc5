//! Remote side of the mediator: connecting to other tool servers and
//! republishing their tools through a local proxy.

#![warn(missing_docs, clippy::pedantic)]

mod connector;
mod error;
mod handler;
mod proxy;
mod session;
mod transport;

pub use connector::{ConnectedServer, RemoteConnector};
pub use error::{RemoteError, RemoteResult};
pub use handler::RemoteToolHandler;
pub use proxy::{ProxyError, ProxyMediator};
pub use session::RemoteSession;
