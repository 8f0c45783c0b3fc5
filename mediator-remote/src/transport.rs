//! Byte-stream transports for reaching remote servers.

use std::process::Stdio;

use mediator_config::RemoteTransport;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// An opened transport: a stream pair plus, for spawned servers, the
/// child process handle keeping it alive.
pub(crate) struct TransportStreams {
    pub(crate) reader: BoxedReader,
    pub(crate) writer: BoxedWriter,
    pub(crate) child: Option<Child>,
}

/// Opens the transport configured for a remote server.
pub(crate) async fn open(server: &str, transport: &RemoteTransport) -> RemoteResult<TransportStreams> {
    match transport {
        RemoteTransport::Stdio { command, args, env } => {
            debug!(%server, %command, "spawning remote server process");
            let mut child = Command::new(command)
                .args(args)
                .envs(env)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .spawn()
                .map_err(|source| RemoteError::Connect {
                    server: server.to_owned(),
                    source,
                })?;

            let stdin = child.stdin.take().ok_or_else(|| RemoteError::Connect {
                server: server.to_owned(),
                source: std::io::Error::other("child stdin unavailable"),
            })?;
            let stdout = child.stdout.take().ok_or_else(|| RemoteError::Connect {
                server: server.to_owned(),
                source: std::io::Error::other("child stdout unavailable"),
            })?;

            Ok(TransportStreams {
                reader: Box::new(stdout),
                writer: Box::new(stdin),
                child: Some(child),
            })
        }
        RemoteTransport::Tcp { address } => {
            debug!(%server, %address, "connecting to remote server");
            let stream = TcpStream::connect(address)
                .await
                .map_err(|source| RemoteError::Connect {
                    server: server.to_owned(),
                    source,
                })?;
            let (reader, writer) = stream.into_split();
            Ok(TransportStreams {
                reader: Box::new(reader),
                writer: Box::new(writer),
                child: None,
            })
        }
    }
}
