//! Tool surface of the mediator: callable descriptors, adapters that turn
//! them into publishable tool definitions, and argument resolution with
//! pluggable type conversion.

#![warn(missing_docs, clippy::pedantic)]

mod adapter;
mod convert;
mod method;
mod resolver;

pub use adapter::{
    AdapterError, AdapterResult, MethodAdapter, RemoteToolAdapter, RequestAdapter, ToolAdapter,
    ToolSource,
};
pub use convert::{ConvertError, ConvertResult, Converter, ConverterRegistry};
pub use method::{InvocationError, InvokeFuture, InvokeResult, MethodInvoker, ToolDecl, ToolMethod};
pub use resolver::{ResolveError, ResolveResult, resolve_arguments};
