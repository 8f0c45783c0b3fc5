//! Error taxonomy of the dispatch core.

use mediator_tools::{AdapterError, InvocationError};
use mediator_wire::WireError;
use thiserror::Error;

use crate::dispatcher::MediatorStatus;

/// Result alias for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors produced while dispatching requests or managing the mediator.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered handler accepts the requested tool.
    #[error("no handler found for tool '{tool}'")]
    NoHandlerFound {
        /// Requested tool name.
        tool: String,
    },

    /// The handler accepted the request but its execution failed.
    #[error("handler failed for tool '{tool}'")]
    HandlerFailed {
        /// Requested tool name.
        tool: String,
        /// Failure reported by the handler.
        #[source]
        source: InvocationError,
    },

    /// The dispatched task was cancelled or panicked before completing.
    #[error("dispatch interrupted for tool '{tool}': {detail}")]
    Interrupted {
        /// Requested tool name.
        tool: String,
        /// What happened to the task.
        detail: String,
    },

    /// The mediator is not in a state that accepts requests.
    #[error("mediator is not running (status: {status:?})")]
    NotRunning {
        /// Status observed at dispatch time.
        status: MediatorStatus,
    },

    /// The dispatch pool was closed and accepts no new tasks.
    #[error("dispatch pool closed")]
    PoolClosed,

    /// A handler's tools could not be adapted for publication.
    #[error("tool adaptation failed")]
    Adapter {
        /// Underlying adaptation failure.
        #[from]
        source: AdapterError,
    },

    /// The server engine rejected a registration or notification.
    #[error("engine operation failed")]
    Engine {
        /// Underlying engine failure.
        #[from]
        source: WireError,
    },
}

/// Renders an error with its full source chain, outermost first.
#[must_use]
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_preserves_handler_message() {
        let err = DispatchError::HandlerFailed {
            tool: "echo".into(),
            source: InvocationError::failure("backing store offline"),
        };

        let rendered = error_chain(&err);
        assert!(rendered.contains("handler failed for tool 'echo'"));
        assert!(rendered.contains("backing store offline"));
    }
}
