//! Callable descriptors registered against the mediator.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mediator_primitives::ToolAnnotations;
use mediator_schema::ParamSpec;
use serde_json::Value;
use thiserror::Error;

/// Result alias for tool invocation.
pub type InvokeResult = Result<Value, InvocationError>;

/// Future alias produced by tool invokers.
pub type InvokeFuture = Pin<Box<dyn Future<Output = InvokeResult> + Send>>;

/// Error raised by a tool implementation.
#[derive(Debug, Error)]
#[error("tool invocation failed: {reason}")]
pub struct InvocationError {
    reason: String,
}

impl InvocationError {
    /// Creates an invocation error from the supplied reason.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the failure reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Trait implemented by the executable side of a tool method.
///
/// Invokers receive the resolved arguments in declared parameter order.
pub trait MethodInvoker: Send + Sync {
    /// Invokes the callable with positional arguments.
    fn invoke(&self, args: Vec<Value>) -> InvokeFuture;
}

impl<F, Fut> MethodInvoker for F
where
    F: Send + Sync + Fn(Vec<Value>) -> Fut,
    Fut: Future<Output = InvokeResult> + Send + 'static,
{
    fn invoke(&self, args: Vec<Value>) -> InvokeFuture {
        Box::pin((self)(args))
    }
}

/// Declarative tool metadata attached to a callable.
#[derive(Clone, Debug, Default)]
pub struct ToolDecl {
    name: Option<String>,
    description: Option<String>,
    schema_override: Option<Value>,
    annotations: ToolAnnotations,
}

impl ToolDecl {
    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the published tool name, overriding name derivation.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the published description, overriding the synthesized one.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a pre-built input schema, bypassing generation.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema_override = Some(schema);
        self
    }

    /// Attaches behavior hints published alongside the tool.
    #[must_use]
    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Returns the declared name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the declared description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the schema override, if any.
    #[must_use]
    pub const fn schema_override(&self) -> Option<&Value> {
        self.schema_override.as_ref()
    }

    /// Returns the declared behavior hints.
    #[must_use]
    pub const fn annotations(&self) -> &ToolAnnotations {
        &self.annotations
    }
}

/// A registered callable: raw name, optional metadata, parameter list,
/// and the closure that executes it.
#[derive(Clone)]
pub struct ToolMethod {
    raw_name: String,
    decl: Option<ToolDecl>,
    params: Vec<ParamSpec>,
    invoker: Arc<dyn MethodInvoker>,
}

impl std::fmt::Debug for ToolMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolMethod")
            .field("raw_name", &self.raw_name)
            .field("decl", &self.decl)
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

impl ToolMethod {
    /// Creates a tool method from its raw callable name and invoker.
    pub fn new<I>(raw_name: impl Into<String>, invoker: I) -> Self
    where
        I: MethodInvoker + 'static,
    {
        Self {
            raw_name: raw_name.into(),
            decl: None,
            params: Vec::new(),
            invoker: Arc::new(invoker),
        }
    }

    /// Attaches declarative metadata.
    #[must_use]
    pub fn with_decl(mut self, decl: ToolDecl) -> Self {
        self.decl = Some(decl);
        self
    }

    /// Declares the parameter list.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParamSpec>) -> Self {
        self.params = params;
        self
    }

    /// Returns the raw callable-side name.
    #[must_use]
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Returns the attached metadata, if any.
    #[must_use]
    pub const fn decl(&self) -> Option<&ToolDecl> {
        self.decl.as_ref()
    }

    /// Returns whether this callable carries declarative metadata.
    #[must_use]
    pub const fn is_declared(&self) -> bool {
        self.decl.is_some()
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Invokes the underlying callable with positional arguments.
    pub fn invoke(&self, args: Vec<Value>) -> InvokeFuture {
        self.invoker.invoke(args)
    }
}
