//! Narrow mediator view handed to execution contexts.

use std::sync::Arc;

use mediator_primitives::ToolName;
use serde_json::Value;

use crate::dispatcher::MediatorCore;
use crate::error::DispatchResult;
use crate::request::Request;

/// The execution surface of a mediator: dispatch and lookup, nothing
/// else. Handlers reach the mediator through this view so they cannot
/// re-initialize or stop it mid-flight.
#[derive(Clone)]
pub struct MinimalMediator {
    core: Arc<MediatorCore>,
}

impl std::fmt::Debug for MinimalMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinimalMediator").finish_non_exhaustive()
    }
}

impl MinimalMediator {
    pub(crate) fn new(core: Arc<MediatorCore>) -> Self {
        Self { core }
    }

    pub(crate) fn core(&self) -> &Arc<MediatorCore> {
        &self.core
    }

    /// Executes a request in a fresh root context.
    ///
    /// Prefer [`crate::ExecutionContext::execute`] inside handlers so the
    /// nested invocation keeps its parent link.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::DispatchError`] from the dispatch.
    pub async fn execute(&self, request: Request) -> DispatchResult<Value> {
        self.core.dispatch(request, None).await
    }

    /// Returns whether any handler accepts the tool.
    #[must_use]
    pub fn is_handler_registered(&self, tool: &ToolName) -> bool {
        self.core.registry().is_registered(tool)
    }
}
