//! Per-invocation execution contexts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::DispatchResult;
use crate::minimal::MinimalMediator;
use crate::request::Request;

/// Context installed for each dispatched request.
///
/// Contexts are passed explicitly to handlers rather than held in any
/// ambient slot. A handler that dispatches a nested request through
/// [`ExecutionContext::execute`] gives the nested invocation a child
/// context whose parent link points back here.
pub struct ExecutionContext {
    mediator: MinimalMediator,
    parent: Option<Arc<ExecutionContext>>,
    storage: Mutex<HashMap<String, Value>>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    pub(crate) fn root(mediator: MinimalMediator) -> Arc<Self> {
        Arc::new(Self {
            mediator,
            parent: None,
            storage: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn child(mediator: MinimalMediator, parent: Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            mediator,
            parent: Some(parent),
            storage: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the narrow mediator view available to handlers.
    #[must_use]
    pub const fn mediator(&self) -> &MinimalMediator {
        &self.mediator
    }

    /// Returns the parent context, if this invocation was nested.
    #[must_use]
    pub const fn parent(&self) -> Option<&Arc<ExecutionContext>> {
        self.parent.as_ref()
    }

    /// Returns how many ancestors this context has.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_ref();
        while let Some(parent) = current {
            depth += 1;
            current = parent.parent.as_ref();
        }
        depth
    }

    /// Stores a value in this context's scratch storage.
    ///
    /// # Panics
    ///
    /// Panics if the storage lock is poisoned.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        let mut storage = self.storage.lock().expect("context storage poisoned");
        storage.insert(key.into(), value);
    }

    /// Reads a value from this context's scratch storage.
    ///
    /// # Panics
    ///
    /// Panics if the storage lock is poisoned.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let storage = self.storage.lock().expect("context storage poisoned");
        storage.get(key).cloned()
    }

    /// Dispatches a nested request; the new invocation runs in a child
    /// context whose parent is this one.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::DispatchError`] from the nested dispatch.
    pub async fn execute(self: &Arc<Self>, request: Request) -> DispatchResult<Value> {
        self.mediator
            .core()
            .dispatch(request, Some(Arc::clone(self)))
            .await
    }
}
