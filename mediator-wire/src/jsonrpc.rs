//! JSON-RPC 2.0 frame types shared by the server engine and the remote
//! client session.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Protocol version string carried on every frame.
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes used on the wire.
pub mod error_codes {
    /// Frame was not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// Frame was valid JSON but not a valid request.
    pub const INVALID_REQUEST: i64 = -32600;
    /// Requested method does not exist.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Request parameters were invalid for the method.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Server-side failure while handling the request.
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Result alias for wire operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors produced by the wire layer.
#[derive(Debug, Error)]
pub enum WireError {
    /// A frame could not be parsed or was structurally invalid.
    #[error("malformed frame: {detail}")]
    Malformed {
        /// What was wrong with the frame.
        detail: String,
    },

    /// The underlying transport failed.
    #[error("transport i/o failed")]
    Io {
        /// Underlying i/o failure.
        #[from]
        source: std::io::Error,
    },

    /// The transport or an internal channel closed while frames were
    /// still expected.
    #[error("transport closed")]
    Closed,

    /// The engine's serve loop was started twice.
    #[error("engine is already serving")]
    AlreadyServing,
}

impl WireError {
    /// Creates a malformed-frame error from the supplied detail.
    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }
}

/// A JSON-RPC request carrying an id and expecting a response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Correlation id echoed on the response.
    pub id: Value,
    /// Method name.
    pub method: String,
    /// Method parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Creates a request frame.
    #[must_use]
    pub fn new(id: Value, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC notification: no id, no response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Method parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Creates a notification frame.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.into(),
            params: None,
        }
    }
}

/// Error object carried on a failed response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Machine-readable error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC response, either a result or an error.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Correlation id from the originating request.
    pub id: Value,
    /// Successful result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Creates a successful response frame.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a failed response frame.
    #[must_use]
    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_round_trips() {
        let request = Request::new(json!(1), "tools/list", None);
        let text = serde_json::to_string(&request).unwrap();
        let parsed: Request = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.method, "tools/list");
        assert_eq!(parsed.id, json!(1));
        assert!(parsed.params.is_none());
        assert!(!text.contains("params"));
    }

    #[test]
    fn failure_response_carries_error_object() {
        let response = Response::failure(json!(7), error_codes::METHOD_NOT_FOUND, "no such method");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
    }
}
