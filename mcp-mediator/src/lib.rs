//! Tool-mediator framework facade.
//!
//! Depend on this crate via `cargo add mcp-mediator`. It bundles the
//! mediator crates behind feature flags so embedders can pull in only
//! the layers they need: a local server needs `kernel` and `wire`, a
//! proxy adds `remote`.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use mediator_primitives as primitives;

/// Parameter metadata and schema generation (enabled by `schema` feature).
#[cfg(feature = "schema")]
pub use mediator_schema as schema;

/// Tool adapters and argument resolution (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use mediator_tools as tools;

/// JSON-RPC wire types and server engines (enabled by `wire` feature).
#[cfg(feature = "wire")]
pub use mediator_wire as wire;

/// Handlers, contexts, and the dispatcher (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use mediator_kernel as kernel;

/// Remote connector and proxy (enabled by `remote` feature).
#[cfg(feature = "remote")]
pub use mediator_remote as remote;

/// Configuration model (enabled by `config` feature).
#[cfg(feature = "config")]
pub use mediator_config as config;
