//! Shared error definitions for mediator primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the mediator workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided request identifier could not be parsed.
    #[error("invalid request id: {source}")]
    InvalidRequestId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Tool name failed validation.
    #[error("invalid tool name `{name}`: {reason}")]
    InvalidToolName {
        /// The offending name string.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Server or client identity failed validation.
    #[error("invalid implementation info: {reason}")]
    InvalidInfo {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
