//! Registry of request handlers.

use std::sync::{Arc, RwLock};

use mediator_primitives::ToolName;

use crate::handler::RequestHandler;

/// Stores request handlers in registration order.
///
/// Lookup walks the handlers newest-first and returns the first whose
/// `can_handle` accepts the tool, so re-registering a tool hands routing
/// to the latest owner. Reads take a snapshot; registration during
/// dispatch is safe.
#[derive(Default)]
pub struct HandlerRegistry {
    inner: RwLock<Vec<Arc<dyn RequestHandler>>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("handler registry poisoned");
        let names: Vec<_> = inner.iter().map(|handler| handler.name().to_owned()).collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn register(&self, handler: Arc<dyn RequestHandler>) {
        let mut inner = self.inner.write().expect("handler registry poisoned");
        inner.push(handler);
    }

    /// Returns the most recently registered handler accepting the tool.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn find(&self, tool: &ToolName) -> Option<Arc<dyn RequestHandler>> {
        let inner = self.inner.read().expect("handler registry poisoned");
        inner
            .iter()
            .rev()
            .find(|handler| handler.can_handle(tool))
            .cloned()
    }

    /// Removes every handler with the given name, returning the removed
    /// handlers in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn remove(&self, name: &str) -> Vec<Arc<dyn RequestHandler>> {
        let mut inner = self.inner.write().expect("handler registry poisoned");
        let mut removed = Vec::new();
        inner.retain(|handler| {
            if handler.name() == name {
                removed.push(Arc::clone(handler));
                false
            } else {
                true
            }
        });
        removed
    }

    /// Returns whether any handler accepts the tool.
    #[must_use]
    pub fn is_registered(&self, tool: &ToolName) -> bool {
        self.find(tool).is_some()
    }

    /// Returns a snapshot of all handlers in registration order.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn RequestHandler>> {
        let inner = self.inner.read().expect("handler registry poisoned");
        inner.clone()
    }

    /// Returns the number of registered handlers.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("handler registry poisoned");
        inner.len()
    }

    /// Returns whether no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use mediator_schema::ParamSpec;
    use mediator_tools::{ToolDecl, ToolMethod};
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::FunctionHandler;

    fn constant_handler(raw_name: &str, value: Value) -> Arc<dyn RequestHandler> {
        let method = ToolMethod::new(raw_name, move |_args: Vec<Value>| {
            let value = value.clone();
            async move { Ok(value) }
        })
        .with_params(Vec::<ParamSpec>::new())
        .with_decl(ToolDecl::new().with_description("constant"));
        Arc::new(FunctionHandler::new(method).unwrap())
    }

    #[test]
    fn latest_matching_handler_wins() {
        let registry = HandlerRegistry::new();
        let first = constant_handler("answer", json!(1));
        let second = constant_handler("answer", json!(2));
        registry.register(Arc::clone(&first));
        registry.register(Arc::clone(&second));

        let tool = ToolName::from_str("answer").unwrap();
        let found = registry.find(&tool).expect("handler");
        assert!(Arc::ptr_eq(&found, &second));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_drops_every_handler_with_the_name() {
        let registry = HandlerRegistry::new();
        registry.register(constant_handler("answer", json!(1)));
        registry.register(constant_handler("answer", json!(2)));
        registry.register(constant_handler("other", json!(3)));

        let removed = registry.remove("answer");
        assert_eq!(removed.len(), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.find(&ToolName::from_str("answer").unwrap()).is_none());
        assert!(registry.remove("answer").is_empty());
    }

    #[test]
    fn unknown_tool_finds_nothing() {
        let registry = HandlerRegistry::new();
        registry.register(constant_handler("answer", json!(1)));

        let tool = ToolName::from_str("question").unwrap();
        assert!(registry.find(&tool).is_none());
        assert!(!registry.is_registered(&tool));
    }
}
