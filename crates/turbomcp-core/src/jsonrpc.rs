//! JSON-RPC 2.0 envelope: parsing any incoming frame into a tagged union.
//!
//! A frame missing `method` is a response (or error); `method` plus `id` is
//! a request; `method` with no `id` is a notification.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const JSONRPC_VERSION: &str = "2.0";

/// Request/response correlation id — a string or a number on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// String identifier.
    String(String),
    /// Numeric identifier.
    Number(i64),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// A JSON-RPC error object, also used as this crate's protocol-level error type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code. The five JSON-RPC codes are fixed; tool/application codes
    /// are free-form negative integers by convention.
    pub code: i32,
    /// Short human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Construct an application-defined error.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data, builder-style.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// `-32700` — the frame was not valid JSON.
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// `-32600` — structurally valid JSON but not a valid JSON-RPC frame.
    #[must_use]
    pub fn invalid_request() -> Self {
        Self::new(-32600, "Invalid Request")
    }

    /// `-32601` — no handler registered for this method.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {method}"))
    }

    /// `-32602` — arguments failed schema validation, or the tool is unknown.
    #[must_use]
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(-32602, details.into())
    }

    /// `-32603` — the handler failed in a way not otherwise categorized.
    #[must_use]
    pub fn internal_error(details: impl Into<String>) -> Self {
        Self::new(-32603, format!("Internal error: {}", details.into()))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// One parsed JSON-RPC message, tagged by which of `method`/`id`/`result`/
/// `error` it carries.
#[derive(Debug, Clone)]
pub enum Frame {
    /// `method` + `id`: expects a response.
    Request {
        /// Correlation id.
        id: RequestId,
        /// Method name.
        method: String,
        /// Method parameters, if any.
        params: Option<Value>,
    },
    /// `method`, no `id`: fire-and-forget.
    Notification {
        /// Method name.
        method: String,
        /// Method parameters, if any.
        params: Option<Value>,
    },
    /// No `method`, has `result`.
    Response {
        /// Correlation id.
        id: RequestId,
        /// The result payload.
        result: Value,
    },
    /// No `method`, has `error`. `id` is `None` only for frames that failed
    /// to parse before an id could be recovered (e.g. malformed JSON).
    Error {
        /// Correlation id, if one could be recovered.
        id: Option<RequestId>,
        /// The error object.
        error: RpcError,
    },
}

impl Frame {
    /// Parse a single JSON document into a tagged [`Frame`].
    ///
    /// Malformed JSON yields `Err(RpcError::parse_error())`; a structurally
    /// valid document that is neither object nor carries a recognizable
    /// request/notification/response/error shape yields
    /// `Err(RpcError::invalid_request())`.
    pub fn parse(bytes: &[u8]) -> Result<Self, RpcError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|_| RpcError::parse_error())?;
        Self::from_value(value)
    }

    /// As [`Self::parse`], but from an already-decoded JSON value (the HTTP
    /// transport receives a parsed body, not raw bytes).
    pub fn from_value(value: Value) -> Result<Self, RpcError> {
        let obj = value.as_object().ok_or_else(RpcError::invalid_request)?;

        if let Some(method_val) = obj.get("method") {
            let method = method_val
                .as_str()
                .ok_or_else(RpcError::invalid_request)?
                .to_string();
            let params = obj.get("params").cloned();
            return Ok(match obj.get("id") {
                Some(id_val) if !id_val.is_null() => {
                    let id = parse_request_id(id_val)?;
                    Frame::Request { id, method, params }
                }
                _ => Frame::Notification { method, params },
            });
        }

        let id = match obj.get("id") {
            Some(id_val) if !id_val.is_null() => Some(parse_request_id(id_val)?),
            _ => None,
        };

        if let Some(error_val) = obj.get("error") {
            let error: RpcError =
                serde_json::from_value(error_val.clone()).map_err(|_| RpcError::invalid_request())?;
            return Ok(Frame::Error { id, error });
        }

        if let Some(result) = obj.get("result") {
            let id = id.ok_or_else(RpcError::invalid_request)?;
            return Ok(Frame::Response {
                id,
                result: result.clone(),
            });
        }

        Err(RpcError::invalid_request())
    }

    /// Serialize back to a single JSON document (no trailing delimiter —
    /// framing is the transport's responsibility).
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.to_value()).expect("Frame values are always serializable")
    }

    /// Serialize to a `serde_json::Value`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("jsonrpc".into(), Value::String(JSONRPC_VERSION.into()));
        match self {
            Frame::Request { id, method, params } => {
                obj.insert("id".into(), id_to_value(id));
                obj.insert("method".into(), Value::String(method.clone()));
                if let Some(p) = params {
                    obj.insert("params".into(), p.clone());
                }
            }
            Frame::Notification { method, params } => {
                obj.insert("method".into(), Value::String(method.clone()));
                if let Some(p) = params {
                    obj.insert("params".into(), p.clone());
                }
            }
            Frame::Response { id, result } => {
                obj.insert("id".into(), id_to_value(id));
                obj.insert("result".into(), result.clone());
            }
            Frame::Error { id, error } => {
                obj.insert(
                    "id".into(),
                    id.as_ref().map(id_to_value).unwrap_or(Value::Null),
                );
                obj.insert(
                    "error".into(),
                    serde_json::to_value(error).expect("RpcError is always serializable"),
                );
            }
        }
        Value::Object(obj)
    }

    /// Build a request frame.
    #[must_use]
    pub fn request(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Frame::Request {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Build a notification frame.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Frame::Notification {
            method: method.into(),
            params,
        }
    }

    /// Build a success response frame.
    #[must_use]
    pub fn response(id: impl Into<RequestId>, result: Value) -> Self {
        Frame::Response {
            id: id.into(),
            result,
        }
    }

    /// Build an error response frame.
    #[must_use]
    pub fn error(id: Option<RequestId>, error: RpcError) -> Self {
        Frame::Error { id, error }
    }
}

fn id_to_value(id: &RequestId) -> Value {
    match id {
        RequestId::String(s) => Value::String(s.clone()),
        RequestId::Number(n) => Value::Number((*n).into()),
    }
}

fn parse_request_id(value: &Value) -> Result<RequestId, RpcError> {
    serde_json::from_value(value.clone()).map_err(|_| RpcError::invalid_request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_request_with_method_and_id() {
        let raw = br#"{"jsonrpc":"2.0","id":1,"method":"ping","params":{}}"#;
        match Frame::parse(raw).unwrap() {
            Frame::Request { id, method, .. } => {
                assert_eq!(id, RequestId::Number(1));
                assert_eq!(method, "ping");
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn parses_notification_with_method_no_id() {
        let raw = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        match Frame::parse(raw).unwrap() {
            Frame::Notification { method, .. } => assert_eq!(method, "notifications/initialized"),
            other => panic!("expected Notification, got {other:?}"),
        }
    }

    #[test]
    fn parses_response_with_no_method() {
        let raw = br#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#;
        match Frame::parse(raw).unwrap() {
            Frame::Response { id, result } => {
                assert_eq!(id, RequestId::Number(1));
                assert_eq!(result, serde_json::json!({"ok": true}));
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn parses_error_response() {
        let raw = br#"{"jsonrpc":"2.0","id":4,"error":{"code":-32602,"message":"Unknown tool: invalid_tool_name"}}"#;
        match Frame::parse(raw).unwrap() {
            Frame::Error { id, error } => {
                assert_eq!(id, Some(RequestId::Number(4)));
                assert_eq!(error.code, -32602);
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = Frame::parse(b"not json").unwrap_err();
        assert_eq!(err.code, -32700);
    }

    #[test]
    fn non_object_json_is_invalid_request() {
        let err = Frame::parse(b"[1,2,3]").unwrap_err();
        assert_eq!(err.code, -32600);
    }

    #[test]
    fn response_without_id_or_result_or_error_is_invalid_request() {
        let err = Frame::parse(br#"{"jsonrpc":"2.0"}"#).unwrap_err();
        assert_eq!(err.code, -32600);
    }

    #[test]
    fn round_trips_request_through_to_bytes_and_back() {
        let frame = Frame::request(1i64, "ping", None);
        let bytes = frame.to_bytes();
        match Frame::parse(&bytes).unwrap() {
            Frame::Request { id, method, params } => {
                assert_eq!(id, RequestId::Number(1));
                assert_eq!(method, "ping");
                assert!(params.is_none());
            }
            other => panic!("expected Request, got {other:?}"),
        }
    }

    #[test]
    fn error_code_constructors_use_fixed_codes() {
        assert_eq!(RpcError::parse_error().code, -32700);
        assert_eq!(RpcError::invalid_request().code, -32600);
        assert_eq!(RpcError::method_not_found("x").code, -32601);
        assert_eq!(RpcError::invalid_params("x").code, -32602);
        assert_eq!(RpcError::internal_error("x").code, -32603);
    }
}
