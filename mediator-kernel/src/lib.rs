//! Dispatch core of the mediator: request handlers, execution contexts,
//! the bounded dispatch pool, and the default dispatcher that publishes
//! tools to a server engine.

#![warn(missing_docs, clippy::pedantic)]

mod context;
mod dispatcher;
mod error;
mod handler;
mod minimal;
mod pool;
mod registry;
mod request;

pub use context::ExecutionContext;
pub use dispatcher::{DefaultMediator, DefaultMediatorBuilder, MediatorStatus};
pub use error::{DispatchError, DispatchResult, error_chain};
pub use handler::{
    DeclaredHandler, FunctionHandler, RequestHandler, ServiceHandler, ServiceHandlerBuilder,
};
pub use minimal::MinimalMediator;
pub use pool::{DispatchPool, PoolConfig};
pub use registry::HandlerRegistry;
pub use request::Request;
