//! JSON-RPC 2.0 framing

use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON-RPC version string (always "2.0")
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes used by this server
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Request arrived before `notifications/initialized`
    pub const NOT_INITIALIZED: i32 = -32002;
    /// Unknown resource URI
    pub const RESOURCE_NOT_FOUND: i32 = -32002;

    /// A required external binary is missing
    pub const TOOL_NOT_INSTALLED: i32 = -32100;
    /// The compiler rejected the program
    pub const COMPILE_FAILED: i32 = -32101;
    /// An external process exceeded its deadline
    pub const PROCESS_TIMEOUT: i32 = -32102;
}

/// Request ID - string, number, or null
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
    Null,
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

/// JSON-RPC Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// JSON-RPC Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: RequestId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(codes::PARSE_ERROR, "Parse error")
    }

    pub fn invalid_request() -> Self {
        Self::new(codes::INVALID_REQUEST, "Invalid Request")
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, msg)
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, msg)
    }

    pub fn not_initialized() -> Self {
        Self::new(codes::NOT_INITIALIZED, "Server not initialized")
    }

    pub fn resource_not_found(uri: &str) -> Self {
        Self::new(codes::RESOURCE_NOT_FOUND, format!("Resource not found: {}", uri))
    }
}

/// JSON-RPC Notification (no id, no response expected)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: None,
        }
    }
}

/// Incoming message, classified by which members are present
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// A response from the client; this server never issues requests
    Response,
}

impl IncomingMessage {
    /// Classify a parsed JSON value
    pub fn classify(json: serde_json::Value) -> Result<Self, JsonRpcError> {
        let has_id = json.get("id").is_some();
        let has_method = json.get("method").is_some();

        match (has_id, has_method) {
            (true, true) => serde_json::from_value(json)
                .map(IncomingMessage::Request)
                .map_err(|_| JsonRpcError::invalid_request()),
            (false, true) => serde_json::from_value(json)
                .map(IncomingMessage::Notification)
                .map_err(|_| JsonRpcError::invalid_request()),
            (true, false) if json.get("result").is_some() || json.get("error").is_some() => {
                Ok(IncomingMessage::Response)
            }
            _ => Err(JsonRpcError::invalid_request()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = JsonRpcRequest::new(1i64, "tools/list");
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"tools/list\""));
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_response_error() {
        let resp = JsonRpcResponse::error(
            RequestId::Number(1),
            JsonRpcError::method_not_found("unknown"),
        );
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("-32601"));
        assert!(!json.contains("\"result\""));
    }

    #[test]
    fn test_toolchain_codes_are_distinct() {
        let standard = [
            codes::PARSE_ERROR,
            codes::INVALID_REQUEST,
            codes::METHOD_NOT_FOUND,
            codes::INVALID_PARAMS,
            codes::INTERNAL_ERROR,
            codes::NOT_INITIALIZED,
        ];
        let toolchain = [
            codes::TOOL_NOT_INSTALLED,
            codes::COMPILE_FAILED,
            codes::PROCESS_TIMEOUT,
        ];
        assert_eq!(toolchain, [-32100, -32101, -32102]);
        assert!(toolchain.iter().all(|code| !standard.contains(code)));
    }

    #[test]
    fn test_classify() {
        let req = serde_json::json!({"jsonrpc": "2.0", "id": "a", "method": "ping"});
        assert!(matches!(
            IncomingMessage::classify(req),
            Ok(IncomingMessage::Request(_))
        ));

        let notif = serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(matches!(
            IncomingMessage::classify(notif),
            Ok(IncomingMessage::Notification(_))
        ));

        let resp = serde_json::json!({"jsonrpc": "2.0", "id": 3, "result": {}});
        assert!(matches!(
            IncomingMessage::classify(resp),
            Ok(IncomingMessage::Response)
        ));

        let junk = serde_json::json!({"jsonrpc": "2.0"});
        assert!(IncomingMessage::classify(junk).is_err());
    }
}
