//! Integration tests for MCP protocol flow
//!
//! These tests drive a complete server over an in-memory pipe with a scripted
//! toolchain: initialization, lifecycle gating and tool/resource/prompt
//! operations.

use serde_json::{json, Value};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use simplicity_mcp::protocol::codes;
use simplicity_mcp::transport::{spawn_channels, LineReader, TransportError};
use simplicity_mcp::{McpServer, ToolContext};
use simplicity_toolchain::{generate_example, ExamplePattern};

/// Client end of a server running over a duplex pipe
struct TestClient {
    reader: LineReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    server: JoinHandle<Result<(), TransportError>>,
    /// Responses read while waiting for a different id
    pending: Vec<Value>,
}

impl TestClient {
    fn start() -> Self {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (client_read, client_write) = tokio::io::split(client);

        let server = tokio::spawn(
            McpServer::new(ToolContext::mock()).serve(spawn_channels(server_read, server_write, 16)),
        );

        Self {
            reader: LineReader::new(client_read),
            writer: client_write,
            server,
            pending: Vec::new(),
        }
    }

    async fn send(&mut self, message: Value) {
        let mut line = message.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    async fn send_request(&mut self, id: i64, method: &str, params: Value) {
        self.send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await;
    }

    async fn read(&mut self) -> Option<Value> {
        let line = self.reader.read_message().await.unwrap()?;
        Some(serde_json::from_str(&line).unwrap())
    }

    /// Wait for the response carrying `id`; tool calls may answer out of order
    async fn response(&mut self, id: i64) -> Value {
        if let Some(pos) = self.pending.iter().position(|r| r["id"] == id) {
            return self.pending.remove(pos);
        }
        loop {
            let message = self.read().await.expect("server closed before responding");
            if message["id"] == id {
                return message;
            }
            self.pending.push(message);
        }
    }

    async fn request(&mut self, id: i64, method: &str, params: Value) -> Value {
        self.send_request(id, method, params).await;
        self.response(id).await
    }

    async fn call_tool(&mut self, id: i64, name: &str, arguments: Value) -> Value {
        let response = self
            .request(id, "tools/call", json!({ "name": name, "arguments": arguments }))
            .await;
        assert!(response["error"].is_null(), "unexpected error: {}", response);
        response["result"].clone()
    }

    async fn initialize(&mut self) {
        let response = self
            .request(
                0,
                "initialize",
                json!({
                    "protocolVersion": "2025-11-25",
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "1.0.0" }
                }),
            )
            .await;
        assert!(response["error"].is_null());
        self.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await;
    }

    /// Close the input side and collect everything the server still sends
    async fn finish(mut self) -> Vec<Value> {
        self.writer.shutdown().await.unwrap();
        let mut rest = std::mem::take(&mut self.pending);
        while let Some(message) = self.read().await {
            rest.push(message);
        }
        self.server.await.unwrap().unwrap();
        rest
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_full_initialization_flow() {
    let mut client = TestClient::start();

    let response = client
        .request(
            1,
            "initialize",
            json!({
                "protocolVersion": "2025-11-25",
                "capabilities": { "roots": { "listChanged": true } },
                "clientInfo": { "name": "test-client", "version": "1.0.0" }
            }),
        )
        .await;

    let result = &response["result"];
    assert_eq!(result["protocolVersion"], "2025-11-25");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
    assert!(result["capabilities"]["prompts"].is_object());
    assert_eq!(result["serverInfo"]["name"], "simplicity-mcp");

    // Not usable until the client confirms
    let response = client.request(2, "tools/list", json!({})).await;
    assert_eq!(response["error"]["code"], codes::NOT_INITIALIZED);

    let response = client.request(3, "ping", json!({})).await;
    assert_eq!(response["result"], json!({}));

    client
        .send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .await;

    let response = client.request(4, "tools/list", json!({})).await;
    assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 17);

    assert!(client.finish().await.is_empty());
}

#[tokio::test]
async fn test_tool_call_before_initialized() {
    let mut client = TestClient::start();

    let response = client
        .request(
            1,
            "tools/call",
            json!({ "name": "simplicity_get_features", "arguments": {} }),
        )
        .await;
    assert_eq!(response["error"]["code"], codes::NOT_INITIALIZED);

    client.finish().await;
}

#[tokio::test]
async fn test_invalid_messages() {
    let mut client = TestClient::start();
    client.initialize().await;

    let response = client
        .request(1, "resources/subscribe", json!({ "uri": "simplicity://features" }))
        .await;
    assert_eq!(response["error"]["code"], codes::METHOD_NOT_FOUND);

    client.send(json!({ "jsonrpc": "1.0", "id": 2, "method": "ping" })).await;
    let response = client.response(2).await;
    assert_eq!(response["error"]["code"], codes::INVALID_REQUEST);

    client.finish().await;
}

// ============================================================================
// Tool Tests
// ============================================================================

#[tokio::test]
async fn test_validate_syntax_reports_problems() {
    let mut client = TestClient::start();
    client.initialize().await;

    let result = client
        .call_tool(
            1,
            "simplicity_validate_syntax",
            json!({ "source": "fn helper() {}\nfn main() { if true { } }" }),
        )
        .await;
    assert!(result["isError"].is_null());
    assert_eq!(result["structuredContent"]["valid"], false);
    assert!(!result["structuredContent"]["errors"]
        .as_array()
        .unwrap()
        .is_empty());

    client.finish().await;
}

#[tokio::test]
async fn test_compile_source_with_scripted_compiler() {
    let mut client = TestClient::start();
    client.initialize().await;

    let source = generate_example(ExamplePattern::Basic);
    let result = client
        .call_tool(1, "simplicity_compile_source", json!({ "source": source }))
        .await;

    let structured = &result["structuredContent"];
    assert_eq!(structured["success"], true);
    assert!(!structured["program"].as_str().unwrap().is_empty());
    assert_eq!(structured["validation"]["valid"], true);

    client.finish().await;
}

#[tokio::test]
async fn test_deploy_with_auto_fund() {
    let mut client = TestClient::start();
    client.initialize().await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contract.simf");
    std::fs::write(&path, generate_example(ExamplePattern::Assertion)).unwrap();

    let result = client
        .call_tool(
            1,
            "simplicity_deploy_contract",
            json!({ "file_path": path.to_string_lossy(), "auto_fund": true }),
        )
        .await;

    let structured = &result["structuredContent"];
    assert_eq!(structured["success"], true);
    assert!(structured["address"].is_string());
    assert!(structured["funding"]["txid"].is_string());

    client.finish().await;
}

#[tokio::test]
async fn test_unknown_tool_is_tool_error() {
    let mut client = TestClient::start();
    client.initialize().await;

    let result = client.call_tool(1, "simplicity_sign_transaction", json!({})).await;
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Unknown tool"));

    client.finish().await;
}

#[tokio::test]
async fn test_concurrent_tool_calls_all_answered() {
    let mut client = TestClient::start();
    client.initialize().await;

    for id in 1..=5 {
        client
            .send_request(
                id,
                "tools/call",
                json!({ "name": "simplicity_get_address", "arguments": { "program": "zSQIS29W33fvVt9371bfd+9W33fvVt93hgGA" } }),
            )
            .await;
    }
    client.send_request(6, "ping", json!({})).await;

    let mut ids: Vec<i64> = client
        .finish()
        .await
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
}

// ============================================================================
// Resource and Prompt Tests
// ============================================================================

#[tokio::test]
async fn test_resources_read() {
    let mut client = TestClient::start();
    client.initialize().await;

    let response = client
        .request(1, "resources/read", json!({ "uri": "simplicity://examples/basic" }))
        .await;
    let text = response["result"]["contents"][0]["text"].as_str().unwrap();
    assert!(text.contains("fn main()"));

    let response = client
        .request(2, "resources/read", json!({ "uri": "simplicity://tools/status" }))
        .await;
    let status: Value =
        serde_json::from_str(response["result"]["contents"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(status["compilerAvailable"], true);

    let response = client
        .request(3, "resources/read", json!({ "uri": "simplicity://examples/htlc" }))
        .await;
    assert_eq!(response["error"]["code"], codes::RESOURCE_NOT_FOUND);

    client.finish().await;
}

#[tokio::test]
async fn test_prompts_get() {
    let mut client = TestClient::start();
    client.initialize().await;

    let response = client
        .request(
            1,
            "prompts/get",
            json!({
                "name": "debug_compile_error",
                "arguments": { "error_message": "Expected ';', found 'if'" }
            }),
        )
        .await;
    let message = &response["result"]["messages"][0];
    assert_eq!(message["role"], "user");
    assert!(message["content"]["text"]
        .as_str()
        .unwrap()
        .contains("Expected ';'"));

    let response = client
        .request(2, "prompts/get", json!({ "name": "deploy_contract", "arguments": {} }))
        .await;
    assert_eq!(response["error"]["code"], codes::INVALID_PARAMS);

    client.finish().await;
}
