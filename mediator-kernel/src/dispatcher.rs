//! Default dispatcher: routes requests to handlers and publishes their
//! tools to a server engine.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use mediator_config::MediatorConfig;
use mediator_primitives::{ServerInfo, ToolName};
use mediator_wire::{CallToolResult, ServerEngine, ToolCallback, ToolSpec};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::ExecutionContext;
use crate::error::{DispatchError, DispatchResult, error_chain};
use crate::handler::RequestHandler;
use crate::minimal::MinimalMediator;
use crate::pool::{DispatchPool, PoolConfig};
use crate::registry::HandlerRegistry;
use crate::request::Request;

/// Lifecycle status of a mediator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediatorStatus {
    /// Constructed; handlers can be registered, no engine attached.
    Created,
    /// Publishing tools to the engine.
    Initializing,
    /// Engine attached, accepting requests.
    Running,
    /// Shut down; no further requests accepted.
    Stopped,
    /// Initialization failed; no further requests accepted.
    Error,
}

impl MediatorStatus {
    /// Returns `true` when requests are accepted in this status.
    #[must_use]
    pub const fn accepts_requests(self) -> bool {
        matches!(self, Self::Created | Self::Initializing | Self::Running)
    }
}

pub(crate) struct MediatorCore {
    server_info: ServerInfo,
    registry: HandlerRegistry,
    pool: DispatchPool,
    tools_enabled: bool,
    excluded: HashSet<String>,
    engine: RwLock<Option<Arc<dyn ServerEngine>>>,
    status: RwLock<MediatorStatus>,
}

impl MediatorCore {
    fn status(&self) -> MediatorStatus {
        *self.status.read().expect("status lock poisoned")
    }

    fn set_status(&self, status: MediatorStatus) {
        let mut guard = self.status.write().expect("status lock poisoned");
        if *guard != status {
            debug!(from = ?*guard, to = ?status, "mediator status transition");
            *guard = status;
        }
    }

    fn engine(&self) -> Option<Arc<dyn ServerEngine>> {
        self.engine.read().expect("engine lock poisoned").clone()
    }

    pub(crate) fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub(crate) async fn dispatch(
        self: &Arc<Self>,
        request: Request,
        parent: Option<Arc<ExecutionContext>>,
    ) -> DispatchResult<Value> {
        let status = self.status();
        if !status.accepts_requests() {
            return Err(DispatchError::NotRunning { status });
        }

        let tool = request.tool().clone();
        let handler = self
            .registry
            .find(&tool)
            .ok_or_else(|| DispatchError::NoHandlerFound {
                tool: tool.to_string(),
            })?;

        debug!(
            request_id = %request.id(),
            tool = %tool,
            handler = %handler.name(),
            nested = parent.is_some(),
            "dispatching request"
        );

        let mediator = MinimalMediator::new(Arc::clone(self));
        let ctx = match parent {
            Some(parent) => ExecutionContext::child(mediator, parent),
            None => ExecutionContext::root(mediator),
        };

        let handle = self
            .pool
            .spawn(tool.as_str(), async move { handler.handle(&request, ctx).await })
            .await?;

        match handle.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(invocation)) => {
                warn!(tool = %tool, error = %invocation, "handler failed");
                Err(DispatchError::HandlerFailed {
                    tool: tool.to_string(),
                    source: invocation,
                })
            }
            Err(join_err) => {
                warn!(tool = %tool, %join_err, "dispatched task did not complete");
                Err(DispatchError::Interrupted {
                    tool: tool.to_string(),
                    detail: join_err.to_string(),
                })
            }
        }
    }

    fn callback_for(self: &Arc<Self>, tool: ToolName) -> ToolCallback {
        let core = Arc::clone(self);
        Arc::new(move |arguments| {
            let core = Arc::clone(&core);
            let tool = tool.clone();
            Box::pin(async move {
                let request = Request::new(tool, arguments);
                match core.dispatch(request, None).await {
                    Ok(value) => CallToolResult::from_value(&value),
                    Err(dispatch_err) => CallToolResult::error(error_chain(&dispatch_err)),
                }
            })
        })
    }

    fn publish_handler(
        self: &Arc<Self>,
        engine: &Arc<dyn ServerEngine>,
        handler: &Arc<dyn RequestHandler>,
    ) -> DispatchResult<usize> {
        if !self.tools_enabled {
            return Ok(0);
        }
        let mut published = 0;
        for adapter in handler.tool_adapters()? {
            if self.excluded.contains(adapter.method().as_str()) {
                debug!(tool = %adapter.method(), "tool excluded from publication");
                continue;
            }
            let spec = ToolSpec {
                name: adapter.method().to_string(),
                description: adapter.description().to_owned(),
                input_schema: adapter.schema().clone(),
                annotations: adapter.annotations().cloned(),
            };
            let callback = self.callback_for(adapter.method().clone());
            engine.register_tool(spec, callback)?;
            published += 1;
        }
        Ok(published)
    }
}

/// The default mediator: a handler registry plus a bounded dispatch pool,
/// optionally attached to a server engine.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct DefaultMediator {
    core: Arc<MediatorCore>,
}

impl std::fmt::Debug for DefaultMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMediator")
            .field("server", &self.core.server_info.name())
            .field("status", &self.status())
            .field("handlers", &self.core.registry.len())
            .finish()
    }
}

/// Builder for [`DefaultMediator`].
pub struct DefaultMediatorBuilder {
    server_info: ServerInfo,
    pool: PoolConfig,
    tools_enabled: bool,
    excluded: HashSet<String>,
}

impl DefaultMediatorBuilder {
    /// Overrides the dispatch pool configuration.
    #[must_use]
    pub const fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Disables tool publication entirely; requests still dispatch.
    #[must_use]
    pub const fn disable_tools(mut self) -> Self {
        self.tools_enabled = false;
        self
    }

    /// Excludes tools from publication by their published name.
    #[must_use]
    pub fn exclude_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded.extend(tools.into_iter().map(Into::into));
        self
    }

    /// Builds the mediator in `Created` status.
    #[must_use]
    pub fn build(self) -> DefaultMediator {
        DefaultMediator {
            core: Arc::new(MediatorCore {
                server_info: self.server_info,
                registry: HandlerRegistry::new(),
                pool: DispatchPool::new(self.pool),
                tools_enabled: self.tools_enabled,
                excluded: self.excluded,
                engine: RwLock::new(None),
                status: RwLock::new(MediatorStatus::Created),
            }),
        }
    }
}

impl DefaultMediator {
    /// Creates a mediator with the default pool configuration.
    #[must_use]
    pub fn new(server_info: ServerInfo) -> Self {
        Self::builder(server_info).build()
    }

    /// Creates a mediator from a validated configuration: server identity,
    /// tool-support flag, and publication exclusions all apply.
    #[must_use]
    pub fn from_config(config: &MediatorConfig) -> Self {
        let mut builder = Self::builder(config.server_info().clone())
            .exclude_tools(config.excluded().iter().cloned());
        if !config.tools_enabled() {
            builder = builder.disable_tools();
        }
        builder.build()
    }

    /// Starts building a mediator.
    #[must_use]
    pub fn builder(server_info: ServerInfo) -> DefaultMediatorBuilder {
        DefaultMediatorBuilder {
            server_info,
            pool: PoolConfig::default(),
            tools_enabled: true,
            excluded: HashSet::new(),
        }
    }

    /// Returns the identity this mediator advertises.
    #[must_use]
    pub fn server_info(&self) -> &ServerInfo {
        &self.core.server_info
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> MediatorStatus {
        self.core.status()
    }

    /// Returns `true` while the mediator is attached to an engine.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status() == MediatorStatus::Running
    }

    /// Returns the narrow view handed to execution contexts.
    #[must_use]
    pub fn minimal(&self) -> MinimalMediator {
        MinimalMediator::new(Arc::clone(&self.core))
    }

    /// Registers a handler.
    ///
    /// Before initialization this only records the handler. Once running,
    /// the handler's tools are also published to the engine immediately
    /// and a tools-changed notification is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Adapter`] or [`DispatchError::Engine`]
    /// when publication of an already-running mediator fails.
    pub fn register_handler(&self, handler: Arc<dyn RequestHandler>) -> DispatchResult<()> {
        self.core.registry.register(Arc::clone(&handler));
        if self.is_running()
            && let Some(engine) = self.core.engine()
        {
            let published = self.core.publish_handler(&engine, &handler)?;
            if published > 0 {
                engine.notify_tools_changed();
                info!(
                    handler = %handler.name(),
                    tools = published,
                    "published late-registered handler"
                );
            }
        }
        Ok(())
    }

    /// Removes every handler registered under the given name.
    ///
    /// Tools that no surviving handler accepts are withdrawn from the
    /// engine, followed by a single tools-changed notification. Returns
    /// `false` when no handler carried the name.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Adapter`] when a removed handler's
    /// adapters cannot be enumerated, or [`DispatchError::Engine`] when
    /// withdrawal fails.
    pub fn unregister_handler(&self, name: &str) -> DispatchResult<bool> {
        let removed = self.core.registry.remove(name);
        if removed.is_empty() {
            return Ok(false);
        }
        if let Some(engine) = self.core.engine() {
            let mut withdrawn = 0;
            for handler in &removed {
                for adapter in handler.tool_adapters()? {
                    // Another handler may still own the name; dispatch
                    // re-routes per call, so only orphaned tools go.
                    if !self.core.registry.is_registered(adapter.method()) {
                        engine.unregister_tool(adapter.method().as_str())?;
                        withdrawn += 1;
                    }
                }
            }
            if withdrawn > 0 {
                engine.notify_tools_changed();
            }
            info!(handler = name, tools = withdrawn, "unregistered handler");
        }
        Ok(true)
    }

    /// Returns whether any handler accepts the tool.
    #[must_use]
    pub fn is_handler_registered(&self, tool: &ToolName) -> bool {
        self.core.registry.is_registered(tool)
    }

    /// Attaches a server engine, publishing every registered handler's
    /// tools to it.
    ///
    /// # Errors
    ///
    /// Returns the first publication failure; the mediator is left in
    /// `Error` status and accepts no further requests.
    pub fn initialize(&self, engine: Arc<dyn ServerEngine>) -> DispatchResult<()> {
        self.core.set_status(MediatorStatus::Initializing);

        let mut published = 0;
        for handler in self.core.registry.snapshot() {
            match self.core.publish_handler(&engine, &handler) {
                Ok(count) => published += count,
                Err(publish_err) => {
                    self.core.set_status(MediatorStatus::Error);
                    return Err(publish_err);
                }
            }
        }

        {
            let mut slot = self.core.engine.write().expect("engine lock poisoned");
            *slot = Some(engine);
        }
        self.core.set_status(MediatorStatus::Running);
        info!(
            server = %self.core.server_info.name(),
            tools = published,
            "mediator initialized"
        );
        Ok(())
    }

    /// Executes a request and awaits its result.
    ///
    /// The handler runs as its own task on the dispatch pool; this call
    /// blocks until it completes. A task that is cancelled or panics
    /// surfaces as [`DispatchError::Interrupted`], but the underlying
    /// work is not forcibly cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoHandlerFound`] for unroutable tools,
    /// [`DispatchError::HandlerFailed`] for handler errors, and
    /// [`DispatchError::NotRunning`] after shutdown.
    pub async fn execute(&self, request: Request) -> DispatchResult<Value> {
        self.core.dispatch(request, None).await
    }

    /// Stops the mediator: no further requests are accepted and the
    /// dispatch pool is closed. In-flight tasks run to completion.
    pub fn stop(&self) {
        self.core.set_status(MediatorStatus::Stopped);
        self.core.pool.close();
        info!(server = %self.core.server_info.name(), "mediator stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use mediator_schema::{ParamSpec, ParamType};
    use mediator_tools::{ToolDecl, ToolMethod};
    use mediator_wire::StdioServerEngine;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::FunctionHandler;

    fn echo_handler() -> Arc<dyn RequestHandler> {
        let method = ToolMethod::new("echoMessage", |args: Vec<Value>| async move {
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        })
        .with_params(vec![ParamSpec::new("message", ParamType::string()).required()])
        .with_decl(ToolDecl::new().with_description("Echoes the message back"));
        Arc::new(FunctionHandler::new(method).unwrap())
    }

    fn mediator() -> DefaultMediator {
        DefaultMediator::new(ServerInfo::new("test-mediator", "0.1.0").unwrap())
    }

    fn request(tool: &str, arguments: Value) -> Request {
        let Value::Object(arguments) = arguments else {
            unreachable!("test arguments must be an object");
        };
        Request::new(ToolName::from_str(tool).unwrap(), arguments)
    }

    #[tokio::test]
    async fn execute_routes_to_handler() {
        let mediator = mediator();
        mediator.register_handler(echo_handler()).unwrap();

        let value = mediator
            .execute(request("echo_message", json!({ "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(value, json!("hi"));
    }

    #[tokio::test]
    async fn unroutable_tool_is_no_handler_found() {
        let mediator = mediator();
        let err = mediator
            .execute(request("missing", json!({})))
            .await
            .expect_err("no handler registered");
        assert!(matches!(err, DispatchError::NoHandlerFound { tool } if tool == "missing"));
    }

    #[tokio::test]
    async fn handler_failure_preserves_message_chain() {
        let mediator = mediator();
        let method = ToolMethod::new("alwaysFails", |_args: Vec<Value>| async move {
            Err(mediator_tools::InvocationError::failure("disk full"))
        })
        .with_decl(ToolDecl::new().with_description("Always fails"));
        mediator
            .register_handler(Arc::new(FunctionHandler::new(method).unwrap()))
            .unwrap();

        let err = mediator
            .execute(request("always_fails", json!({})))
            .await
            .expect_err("handler fails");
        assert!(error_chain(&err).contains("disk full"));
    }

    #[tokio::test]
    async fn initialize_publishes_tools_and_runs() {
        let mediator = mediator();
        mediator.register_handler(echo_handler()).unwrap();

        let engine = Arc::new(StdioServerEngine::new(
            ServerInfo::new("engine", "0.1.0").unwrap(),
        ));
        mediator
            .initialize(Arc::clone(&engine) as Arc<dyn mediator_wire::ServerEngine>)
            .unwrap();

        assert!(mediator.is_running());
        let tools = engine.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo_message");
    }

    #[tokio::test]
    async fn late_registration_republishes() {
        let mediator = mediator();
        let engine = Arc::new(StdioServerEngine::new(
            ServerInfo::new("engine", "0.1.0").unwrap(),
        ));
        mediator
            .initialize(Arc::clone(&engine) as Arc<dyn mediator_wire::ServerEngine>)
            .unwrap();

        mediator.register_handler(echo_handler()).unwrap();
        assert_eq!(engine.list_tools().len(), 1);
    }

    #[tokio::test]
    async fn stopped_mediator_rejects_requests() {
        let mediator = mediator();
        mediator.register_handler(echo_handler()).unwrap();
        mediator.stop();

        let err = mediator
            .execute(request("echo_message", json!({ "message": "hi" })))
            .await
            .expect_err("stopped mediator");
        assert!(matches!(
            err,
            DispatchError::NotRunning {
                status: MediatorStatus::Stopped
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_requests_all_complete() {
        let mediator = mediator();
        mediator.register_handler(echo_handler()).unwrap();

        let mut joins = Vec::new();
        for i in 0..16 {
            let mediator = mediator.clone();
            joins.push(tokio::spawn(async move {
                mediator
                    .execute(request("echo_message", json!({ "message": format!("m{i}") })))
                    .await
            }));
        }

        for (i, join) in joins.into_iter().enumerate() {
            let value = join.await.unwrap().unwrap();
            assert_eq!(value, json!(format!("m{i}")));
        }
    }

    struct NestingHandler {
        tool: ToolName,
        inner: ToolName,
    }

    #[async_trait::async_trait]
    impl RequestHandler for NestingHandler {
        fn name(&self) -> &str {
            "nesting"
        }

        fn can_handle(&self, tool: &ToolName) -> bool {
            tool == &self.tool
        }

        fn tool_adapters(
            &self,
        ) -> mediator_tools::AdapterResult<Vec<Arc<dyn mediator_tools::ToolAdapter>>> {
            Ok(Vec::new())
        }

        async fn handle(
            &self,
            request: &Request,
            ctx: Arc<crate::ExecutionContext>,
        ) -> Result<Value, mediator_tools::InvocationError> {
            assert_eq!(ctx.depth(), 0);
            let nested = Request::new(self.inner.clone(), request.arguments().clone());
            ctx.execute(nested)
                .await
                .map_err(|err| mediator_tools::InvocationError::failure(err.to_string()))
        }
    }

    struct DepthReportingHandler {
        tool: ToolName,
    }

    #[async_trait::async_trait]
    impl RequestHandler for DepthReportingHandler {
        fn name(&self) -> &str {
            "depth-reporter"
        }

        fn can_handle(&self, tool: &ToolName) -> bool {
            tool == &self.tool
        }

        fn tool_adapters(
            &self,
        ) -> mediator_tools::AdapterResult<Vec<Arc<dyn mediator_tools::ToolAdapter>>> {
            Ok(Vec::new())
        }

        async fn handle(
            &self,
            _request: &Request,
            ctx: Arc<crate::ExecutionContext>,
        ) -> Result<Value, mediator_tools::InvocationError> {
            assert!(ctx.parent().is_some());
            Ok(json!(ctx.depth()))
        }
    }

    #[tokio::test]
    async fn nested_execute_links_parent_context() {
        let mediator = mediator();
        mediator
            .register_handler(Arc::new(NestingHandler {
                tool: ToolName::from_str("outer").unwrap(),
                inner: ToolName::from_str("inner").unwrap(),
            }))
            .unwrap();
        mediator
            .register_handler(Arc::new(DepthReportingHandler {
                tool: ToolName::from_str("inner").unwrap(),
            }))
            .unwrap();

        let depth = mediator
            .execute(request("outer", json!({})))
            .await
            .unwrap();
        assert_eq!(depth, json!(1));
    }

    fn constant_handler(raw_name: &str, value: Value) -> Arc<dyn RequestHandler> {
        let method = ToolMethod::new(raw_name, move |_args: Vec<Value>| {
            let value = value.clone();
            async move { Ok(value) }
        })
        .with_decl(ToolDecl::new().with_description("constant"));
        Arc::new(FunctionHandler::new(method).unwrap())
    }

    #[tokio::test]
    async fn reregistered_tool_dispatches_to_latest_handler() {
        let mediator = mediator();
        mediator
            .register_handler(constant_handler("answer", json!("first")))
            .unwrap();
        mediator
            .register_handler(constant_handler("answer", json!("second")))
            .unwrap();

        let value = mediator.execute(request("answer", json!({}))).await.unwrap();
        assert_eq!(value, json!("second"));
    }

    #[tokio::test]
    async fn reregistration_keeps_engine_and_dispatch_aligned() {
        let mediator = mediator();
        let engine = Arc::new(StdioServerEngine::new(
            ServerInfo::new("engine", "0.1.0").unwrap(),
        ));
        mediator
            .initialize(Arc::clone(&engine) as Arc<dyn mediator_wire::ServerEngine>)
            .unwrap();

        mediator
            .register_handler(constant_handler("answer", json!("first")))
            .unwrap();
        mediator
            .register_handler(constant_handler("answer", json!("second")))
            .unwrap();

        // One published entry, and it routes to the latest registration.
        assert_eq!(engine.list_tools().len(), 1);
        let value = mediator.execute(request("answer", json!({}))).await.unwrap();
        assert_eq!(value, json!("second"));
    }

    #[tokio::test]
    async fn unregister_withdraws_tools_and_routing() {
        let mediator = mediator();
        let engine = Arc::new(StdioServerEngine::new(
            ServerInfo::new("engine", "0.1.0").unwrap(),
        ));
        mediator
            .initialize(Arc::clone(&engine) as Arc<dyn mediator_wire::ServerEngine>)
            .unwrap();
        mediator.register_handler(echo_handler()).unwrap();
        assert_eq!(engine.list_tools().len(), 1);

        assert!(mediator.unregister_handler("echo_message").unwrap());
        assert!(engine.list_tools().is_empty());

        let err = mediator
            .execute(request("echo_message", json!({ "message": "hi" })))
            .await
            .expect_err("handler removed");
        assert!(matches!(err, DispatchError::NoHandlerFound { .. }));

        assert!(!mediator.unregister_handler("echo_message").unwrap());
    }

    #[tokio::test]
    async fn excluded_tools_are_not_published_but_still_execute() {
        let mediator = DefaultMediator::builder(ServerInfo::new("test-mediator", "0.1.0").unwrap())
            .exclude_tools(["echo_message"])
            .build();
        mediator.register_handler(echo_handler()).unwrap();

        let engine = Arc::new(StdioServerEngine::new(
            ServerInfo::new("engine", "0.1.0").unwrap(),
        ));
        mediator
            .initialize(Arc::clone(&engine) as Arc<dyn mediator_wire::ServerEngine>)
            .unwrap();

        assert!(engine.list_tools().is_empty());
        let value = mediator
            .execute(request("echo_message", json!({ "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(value, json!("hi"));
    }

    #[tokio::test]
    async fn config_disables_publication() {
        let config = MediatorConfig::builder(ServerInfo::new("test-mediator", "0.1.0").unwrap())
            .disable_tools()
            .build()
            .unwrap();
        let mediator = DefaultMediator::from_config(&config);
        mediator.register_handler(echo_handler()).unwrap();

        let engine = Arc::new(StdioServerEngine::new(
            ServerInfo::new("engine", "0.1.0").unwrap(),
        ));
        mediator
            .initialize(Arc::clone(&engine) as Arc<dyn mediator_wire::ServerEngine>)
            .unwrap();

        assert!(engine.list_tools().is_empty());
        // Late registration publishes nothing either.
        mediator
            .register_handler(constant_handler("answer", json!(42)))
            .unwrap();
        assert!(engine.list_tools().is_empty());
    }

    #[tokio::test]
    async fn config_exclusions_apply() {
        let config = MediatorConfig::builder(ServerInfo::new("test-mediator", "0.1.0").unwrap())
            .exclude("echo_message")
            .build()
            .unwrap();
        let mediator = DefaultMediator::from_config(&config);
        mediator.register_handler(echo_handler()).unwrap();
        mediator
            .register_handler(constant_handler("answer", json!(42)))
            .unwrap();

        let engine = Arc::new(StdioServerEngine::new(
            ServerInfo::new("engine", "0.1.0").unwrap(),
        ));
        mediator
            .initialize(Arc::clone(&engine) as Arc<dyn mediator_wire::ServerEngine>)
            .unwrap();

        let tools = engine.list_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "answer");
    }
}
