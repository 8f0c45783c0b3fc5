//! Minimal mediator server: one echo tool, served over stdin/stdout.
//!
//! Run it and drive it by hand:
//!
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"tools/list"}
//! {"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}
//! ```

use std::sync::Arc;

use mcp_mediator::config::{MediatorConfig, ServerTransport};
use mcp_mediator::kernel::{DefaultMediator, FunctionHandler};
use mcp_mediator::primitives::ServerInfo;
use mcp_mediator::schema::{ParamSpec, ParamType};
use mcp_mediator::tools::{ToolDecl, ToolMethod};
use mcp_mediator::wire::{ServerEngine, StdioServerEngine};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let server_info = ServerInfo::new("echo-stdio", env!("CARGO_PKG_VERSION"))?;
    let config = MediatorConfig::builder(server_info.clone()).build()?;
    let mediator = DefaultMediator::from_config(&config);

    let echo = ToolMethod::new("echo", |args: Vec<Value>| async move {
        Ok(args.into_iter().next().unwrap_or(Value::Null))
    })
    .with_params(vec![
        ParamSpec::new("message", ParamType::string()).required(),
    ])
    .with_decl(ToolDecl::new().with_description("Echoes the message back"));
    mediator.register_handler(Arc::new(FunctionHandler::new(echo)?))?;

    let engine = Arc::new(StdioServerEngine::new(server_info));
    mediator.initialize(Arc::clone(&engine) as Arc<dyn ServerEngine>)?;

    match config.transport() {
        ServerTransport::Stdio => {
            info!("echo server ready on stdio");
            engine.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
        }
    }
    mediator.stop();
    Ok(())
}
