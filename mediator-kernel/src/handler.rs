//! Request handlers: the executable side of registered tools.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use mediator_primitives::ToolName;
use mediator_schema::SchemaGenerator;
use mediator_tools::{
    AdapterResult, ConverterRegistry, InvocationError, InvokeFuture, InvokeResult, MethodAdapter,
    RequestAdapter, ToolAdapter, ToolDecl, ToolMethod, ToolSource, resolve_arguments,
};
use serde_json::{Map, Value};
use tracing::warn;

use crate::context::ExecutionContext;
use crate::request::Request;

/// A handler that accepts and executes mediator requests.
///
/// Routing is by tool name: the dispatcher asks each registered handler
/// in registration order and picks the first whose `can_handle` matches.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Name of the handler, used for logging.
    fn name(&self) -> &str;

    /// Returns whether this handler accepts the given tool.
    fn can_handle(&self, tool: &ToolName) -> bool;

    /// Returns the publishable definitions of every tool this handler
    /// accepts.
    ///
    /// # Errors
    ///
    /// Returns an [`mediator_tools::AdapterError`] when a tool cannot be
    /// adapted for publication.
    fn tool_adapters(&self) -> AdapterResult<Vec<Arc<dyn ToolAdapter>>>;

    /// Executes the request within the supplied context.
    async fn handle(
        &self,
        request: &Request,
        ctx: Arc<ExecutionContext>,
    ) -> Result<Value, InvocationError>;
}

struct TableEntry {
    method: ToolMethod,
    adapter: Arc<MethodAdapter>,
}

type AdapterTable = HashMap<ToolName, TableEntry>;

/// Handler exposing the callables of one service as tools.
///
/// The adapter table is built lazily on first use. Callables without
/// declarative metadata are filtered out unless `include_undeclared` is
/// set; explicitly excluded callables are always dropped. A callable
/// whose adaptation fails is skipped with a warning rather than taking
/// the whole service down.
pub struct ServiceHandler {
    service: String,
    methods: Vec<ToolMethod>,
    include_undeclared: bool,
    exclusions: HashSet<String>,
    converters: Arc<ConverterRegistry>,
    generator: SchemaGenerator,
    table: RwLock<Option<Arc<AdapterTable>>>,
}

impl std::fmt::Debug for ServiceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandler")
            .field("service", &self.service)
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ServiceHandler`].
pub struct ServiceHandlerBuilder {
    service: String,
    methods: Vec<ToolMethod>,
    include_undeclared: bool,
    exclusions: HashSet<String>,
    converters: Option<Arc<ConverterRegistry>>,
    generator: SchemaGenerator,
}

impl ServiceHandlerBuilder {
    /// Adds one callable.
    #[must_use]
    pub fn method(mut self, method: ToolMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds several callables.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = ToolMethod>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Also exposes callables that carry no declarative metadata.
    #[must_use]
    pub const fn include_undeclared(mut self) -> Self {
        self.include_undeclared = true;
        self
    }

    /// Excludes a callable by its raw name, declared or not.
    #[must_use]
    pub fn exclude(mut self, raw_name: impl Into<String>) -> Self {
        self.exclusions.insert(raw_name.into());
        self
    }

    /// Uses the supplied converter registry instead of the defaults.
    #[must_use]
    pub fn converters(mut self, converters: Arc<ConverterRegistry>) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Uses the supplied schema generator instead of the default.
    #[must_use]
    pub fn generator(mut self, generator: SchemaGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Builds the handler. The adapter table is not built until first use.
    #[must_use]
    pub fn build(self) -> ServiceHandler {
        ServiceHandler {
            service: self.service,
            methods: self.methods,
            include_undeclared: self.include_undeclared,
            exclusions: self.exclusions,
            converters: self
                .converters
                .unwrap_or_else(|| Arc::new(ConverterRegistry::with_defaults())),
            generator: self.generator,
            table: RwLock::new(None),
        }
    }
}

impl ServiceHandler {
    /// Starts building a handler for the named service.
    #[must_use]
    pub fn builder(service: impl Into<String>) -> ServiceHandlerBuilder {
        ServiceHandlerBuilder {
            service: service.into(),
            methods: Vec::new(),
            include_undeclared: false,
            exclusions: HashSet::new(),
            converters: None,
            generator: SchemaGenerator::new(),
        }
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    fn table(&self) -> Arc<AdapterTable> {
        {
            let guard = self.table.read().expect("adapter table poisoned");
            if let Some(table) = guard.as_ref() {
                return Arc::clone(table);
            }
        }

        let built = Arc::new(self.build_table());
        let mut guard = self.table.write().expect("adapter table poisoned");
        if let Some(table) = guard.as_ref() {
            Arc::clone(table)
        } else {
            *guard = Some(Arc::clone(&built));
            built
        }
    }

    fn build_table(&self) -> AdapterTable {
        let mut table = AdapterTable::new();
        for method in &self.methods {
            if self.exclusions.contains(method.raw_name()) {
                continue;
            }
            if !method.is_declared() && !self.include_undeclared {
                continue;
            }
            let source = ToolSource::Service {
                service: self.service.clone(),
            };
            match MethodAdapter::adapt(method, &self.generator, source) {
                Ok(adapter) => {
                    table.insert(
                        adapter.method().clone(),
                        TableEntry {
                            method: method.clone(),
                            adapter: Arc::new(adapter),
                        },
                    );
                }
                Err(adapt_err) => {
                    warn!(
                        service = %self.service,
                        callable = %method.raw_name(),
                        %adapt_err,
                        "skipping callable that cannot be adapted"
                    );
                }
            }
        }
        table
    }
}

#[async_trait]
impl RequestHandler for ServiceHandler {
    fn name(&self) -> &str {
        &self.service
    }

    fn can_handle(&self, tool: &ToolName) -> bool {
        self.table().contains_key(tool)
    }

    fn tool_adapters(&self) -> AdapterResult<Vec<Arc<dyn ToolAdapter>>> {
        Ok(self
            .table()
            .values()
            .map(|entry| Arc::clone(&entry.adapter) as Arc<dyn ToolAdapter>)
            .collect())
    }

    async fn handle(
        &self,
        request: &Request,
        _ctx: Arc<ExecutionContext>,
    ) -> Result<Value, InvocationError> {
        let table = self.table();
        let entry = table.get(request.tool()).ok_or_else(|| {
            InvocationError::failure(format!(
                "service '{}' has no tool '{}'",
                self.service,
                request.tool()
            ))
        })?;

        let args = resolve_arguments(entry.method.params(), request.arguments(), &self.converters)
            .map_err(|resolve_err| InvocationError::failure(resolve_err.to_string()))?;
        entry.method.invoke(args).await
    }
}

/// Handler exposing one standalone callable as a tool.
pub struct FunctionHandler {
    method: ToolMethod,
    adapter: Arc<MethodAdapter>,
    converters: Arc<ConverterRegistry>,
}

impl std::fmt::Debug for FunctionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionHandler")
            .field("tool", &self.adapter.method().as_str())
            .finish_non_exhaustive()
    }
}

impl FunctionHandler {
    /// Wraps a callable, adapting it eagerly.
    ///
    /// # Errors
    ///
    /// Returns an [`mediator_tools::AdapterError`] when the callable
    /// cannot be adapted.
    pub fn new(method: ToolMethod) -> AdapterResult<Self> {
        Self::with_converters(method, Arc::new(ConverterRegistry::with_defaults()))
    }

    /// Wraps a callable with a custom converter registry.
    ///
    /// # Errors
    ///
    /// Returns an [`mediator_tools::AdapterError`] when the callable
    /// cannot be adapted.
    pub fn with_converters(
        method: ToolMethod,
        converters: Arc<ConverterRegistry>,
    ) -> AdapterResult<Self> {
        let adapter =
            MethodAdapter::adapt(&method, &SchemaGenerator::new(), ToolSource::Function)?;
        Ok(Self {
            method,
            adapter: Arc::new(adapter),
            converters,
        })
    }

    /// Returns the published tool name.
    #[must_use]
    pub fn tool(&self) -> &ToolName {
        self.adapter.method()
    }
}

#[async_trait]
impl RequestHandler for FunctionHandler {
    fn name(&self) -> &str {
        self.adapter.method().as_str()
    }

    fn can_handle(&self, tool: &ToolName) -> bool {
        self.adapter.method() == tool
    }

    fn tool_adapters(&self) -> AdapterResult<Vec<Arc<dyn ToolAdapter>>> {
        Ok(vec![Arc::clone(&self.adapter) as Arc<dyn ToolAdapter>])
    }

    async fn handle(
        &self,
        request: &Request,
        _ctx: Arc<ExecutionContext>,
    ) -> Result<Value, InvocationError> {
        let args = resolve_arguments(self.method.params(), request.arguments(), &self.converters)
            .map_err(|resolve_err| InvocationError::failure(resolve_err.to_string()))?;
        self.method.invoke(args).await
    }
}

type RawInvoker = Arc<dyn Fn(Map<String, Value>) -> InvokeFuture + Send + Sync>;

/// Handler exposing one fully-declared tool backed by a raw-argument
/// closure.
///
/// There is no parameter resolution: the declared schema is published
/// verbatim and the closure receives the argument object exactly as it
/// arrived on the wire. Suits tools whose input shape is authored by
/// hand rather than derived from parameter metadata.
pub struct DeclaredHandler {
    adapter: Arc<RequestAdapter>,
    invoker: RawInvoker,
}

impl std::fmt::Debug for DeclaredHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeclaredHandler")
            .field("tool", &self.adapter.method().as_str())
            .finish_non_exhaustive()
    }
}

impl DeclaredHandler {
    /// Wraps a closure behind a fully-declared tool shape.
    ///
    /// # Errors
    ///
    /// Returns an [`mediator_tools::AdapterError`] when the declaration
    /// omits the name, description, or schema, or the name fails
    /// validation.
    pub fn new<F, Fut>(decl: &ToolDecl, invoker: F) -> AdapterResult<Self>
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = InvokeResult> + Send + 'static,
    {
        let adapter = RequestAdapter::adapt(decl, ToolSource::Function)?;
        Ok(Self {
            adapter: Arc::new(adapter),
            invoker: Arc::new(move |arguments| Box::pin(invoker(arguments))),
        })
    }

    /// Returns the published tool name.
    #[must_use]
    pub fn tool(&self) -> &ToolName {
        self.adapter.method()
    }
}

#[async_trait]
impl RequestHandler for DeclaredHandler {
    fn name(&self) -> &str {
        self.adapter.method().as_str()
    }

    fn can_handle(&self, tool: &ToolName) -> bool {
        self.adapter.method() == tool
    }

    fn tool_adapters(&self) -> AdapterResult<Vec<Arc<dyn ToolAdapter>>> {
        Ok(vec![Arc::clone(&self.adapter) as Arc<dyn ToolAdapter>])
    }

    async fn handle(
        &self,
        request: &Request,
        _ctx: Arc<ExecutionContext>,
    ) -> Result<Value, InvocationError> {
        (self.invoker)(request.arguments().clone()).await
    }
}
