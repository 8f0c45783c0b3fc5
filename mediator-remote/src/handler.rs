//! Request handler forwarding to a remote session.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use mediator_kernel::{ExecutionContext, Request, RequestHandler};
use mediator_primitives::ToolName;
use mediator_tools::{
    AdapterResult, InvocationError, RemoteToolAdapter, ToolAdapter,
};
use mediator_wire::{CallToolResult, Content, ToolSpec};
use serde_json::Value;

use crate::session::RemoteSession;

/// Exposes the tools of one remote server to the local dispatch path, so
/// nested `execute` calls made by local handlers reach remote tools too.
pub struct RemoteToolHandler {
    session: Arc<RemoteSession>,
    tools: HashMap<ToolName, ToolSpec>,
}

impl std::fmt::Debug for RemoteToolHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteToolHandler")
            .field("server", &self.session.server())
            .field("tools", &self.tools.len())
            .finish()
    }
}

impl RemoteToolHandler {
    /// Wraps a session and the tools it serves.
    ///
    /// # Errors
    ///
    /// Returns an [`mediator_tools::AdapterError`] when a remote tool
    /// name does not satisfy local naming rules.
    pub fn new(session: Arc<RemoteSession>, specs: Vec<ToolSpec>) -> AdapterResult<Self> {
        let mut tools = HashMap::with_capacity(specs.len());
        for spec in specs {
            tools.insert(ToolName::from_str(&spec.name)?, spec);
        }
        Ok(Self { session, tools })
    }
}

/// Flattens a call result into a dispatch value, turning in-band errors
/// into invocation failures.
pub(crate) fn result_to_value(result: CallToolResult) -> Result<Value, InvocationError> {
    let text = result
        .content
        .iter()
        .map(|block| match block {
            Content::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n");
    if result.is_error {
        Err(InvocationError::failure(text))
    } else {
        Ok(Value::String(text))
    }
}

#[async_trait]
impl RequestHandler for RemoteToolHandler {
    fn name(&self) -> &str {
        self.session.server()
    }

    fn can_handle(&self, tool: &ToolName) -> bool {
        self.tools.contains_key(tool)
    }

    fn tool_adapters(&self) -> AdapterResult<Vec<Arc<dyn ToolAdapter>>> {
        let mut adapters: Vec<Arc<dyn ToolAdapter>> = Vec::with_capacity(self.tools.len());
        for spec in self.tools.values() {
            let adapter = RemoteToolAdapter::adapt(
                &spec.name,
                spec.description.clone(),
                spec.input_schema.clone(),
                spec.annotations.clone(),
                self.session.server(),
            )?;
            adapters.push(Arc::new(adapter));
        }
        Ok(adapters)
    }

    async fn handle(
        &self,
        request: &Request,
        _ctx: Arc<ExecutionContext>,
    ) -> Result<Value, InvocationError> {
        let result = self
            .session
            .call_tool(request.tool().as_str(), request.arguments().clone())
            .await
            .map_err(|remote_err| InvocationError::failure(remote_err.to_string()))?;
        result_to_value(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_results_become_invocation_failures() {
        let err = result_to_value(CallToolResult::error("remote disk full"))
            .expect_err("error result");
        assert!(err.reason().contains("remote disk full"));
    }

    #[test]
    fn text_blocks_are_joined() {
        let result = CallToolResult {
            content: vec![
                Content::Text { text: "a".into() },
                Content::Text { text: "b".into() },
            ],
            is_error: false,
        };
        assert_eq!(result_to_value(result).unwrap(), Value::String("a\nb".into()));
    }
}
