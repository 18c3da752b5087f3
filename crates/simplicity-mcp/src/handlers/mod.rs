//! MCP request handlers
//!
//! This module contains handlers for all MCP protocol methods.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::invariants;
use crate::prompts;
use crate::protocol::*;
use crate::resources;
use crate::tools::{self, ToolContext};

/// MCP Server state
pub struct McpServerState {
    /// Protocol version negotiated
    pub protocol_version: Option<String>,

    /// Set by `notifications/initialized`
    pub initialized: bool,

    pub client_capabilities: Option<ClientCapabilities>,

    pub client_info: Option<ClientInfo>,

    /// Shared toolchain handles for tool calls and resource reads
    pub ctx: ToolContext,
}

impl McpServerState {
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            protocol_version: None,
            initialized: false,
            client_capabilities: None,
            client_info: None,
            ctx,
        }
    }

    pub fn tool_context(&self) -> ToolContext {
        self.ctx.clone()
    }
}

/// Whether a request may be served in the current lifecycle state
pub fn is_allowed(state: &McpServerState, method: &str) -> bool {
    state.initialized || method == "initialize" || method == "ping"
}

/// Handle an incoming JSON-RPC request
pub async fn handle_request(
    state: &mut McpServerState,
    request: &JsonRpcRequest,
) -> JsonRpcResponse {
    debug!("Handling request: {} (id: {})", request.method, request.id);

    if let Err(error) = invariants::validate_request(request) {
        return JsonRpcResponse::error(request.id.clone(), error);
    }

    if !is_allowed(state, &request.method) {
        return JsonRpcResponse::error(request.id.clone(), JsonRpcError::not_initialized());
    }

    let result = match request.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(state, request),
        "ping" => Ok(serde_json::json!({})),

        // Tools
        "tools/list" => handle_tools_list(request),
        "tools/call" => call_tool(&state.ctx, request).await,

        // Resources
        "resources/list" => handle_resources_list(request),
        "resources/read" => handle_resources_read(state, request),
        "resources/templates/list" => handle_resources_templates_list(request),

        // Prompts
        "prompts/list" => handle_prompts_list(request),
        "prompts/get" => handle_prompts_get(request),

        // Unknown method
        _ => Err(JsonRpcError::method_not_found(&request.method)),
    };

    respond(request, result)
}

/// Handle a `tools/call` request outside the server state
///
/// The server runs each tool call as its own task with a cloned context, so
/// this takes the context rather than the state.
pub async fn handle_tools_call(ctx: &ToolContext, request: &JsonRpcRequest) -> JsonRpcResponse {
    let result = call_tool(ctx, request).await;
    respond(request, result)
}

/// Handle an incoming notification
pub fn handle_notification(state: &mut McpServerState, notification: &JsonRpcNotification) {
    debug!("Handling notification: {}", notification.method);

    match notification.method.as_str() {
        "notifications/initialized" => {
            info!("Client sent initialized notification");
            state.initialized = true;
        }
        "notifications/cancelled" => {
            // Tool calls run to completion; the client ignores the late response
            if let Some(request_id) = notification
                .params
                .as_ref()
                .and_then(|p| p.get("requestId"))
            {
                warn!("Request cancelled: {}", request_id);
            }
        }
        _ => {
            debug!("Unknown notification: {}", notification.method);
        }
    }
}

fn respond(
    request: &JsonRpcRequest,
    result: Result<serde_json::Value, JsonRpcError>,
) -> JsonRpcResponse {
    match result {
        Ok(value) => JsonRpcResponse::success(request.id.clone(), value),
        Err(error) => JsonRpcResponse::error(request.id.clone(), error),
    }
}

fn required_params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, JsonRpcError> {
    request
        .params
        .as_ref()
        .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))
        .and_then(|p| {
            serde_json::from_value(p.clone())
                .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
        })
}

fn optional_params<T: DeserializeOwned + Default>(
    request: &JsonRpcRequest,
) -> Result<T, JsonRpcError> {
    request
        .params
        .as_ref()
        .map(|p| serde_json::from_value(p.clone()))
        .transpose()
        .map_err(|e| JsonRpcError::invalid_params(e.to_string()))
        .map(Option::unwrap_or_default)
}

fn to_value<T: serde::Serialize>(value: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

// ============================================================================
// Lifecycle Handlers
// ============================================================================

fn handle_initialize(
    state: &mut McpServerState,
    request: &JsonRpcRequest,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: InitializeParams = required_params(request)?;

    info!(
        "Initialize request from {} (version: {})",
        params.client_info.name, params.protocol_version
    );

    if params.protocol_version != MCP_PROTOCOL_VERSION {
        warn!(
            "Protocol version mismatch: client={}, server={}",
            params.protocol_version, MCP_PROTOCOL_VERSION
        );
    }

    state.protocol_version = Some(params.protocol_version);
    state.client_capabilities = Some(params.capabilities);
    state.client_info = Some(params.client_info);

    to_value(InitializeResult::new(MCP_PROTOCOL_VERSION.to_string()))
}

// ============================================================================
// Tools Handlers
// ============================================================================

fn handle_tools_list(request: &JsonRpcRequest) -> Result<serde_json::Value, JsonRpcError> {
    let _params: ListParams = optional_params(request)?;

    to_value(ToolsListResult {
        tools: tools::get_all_tools(),
        next_cursor: None,
    })
}

async fn call_tool(
    ctx: &ToolContext,
    request: &JsonRpcRequest,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: ToolsCallParams = required_params(request)?;

    debug!("Calling tool: {}", params.name);

    let result = tools::execute_tool(ctx, &params.name, params.arguments).await;
    to_value(result)
}

// ============================================================================
// Resources Handlers
// ============================================================================

fn handle_resources_list(request: &JsonRpcRequest) -> Result<serde_json::Value, JsonRpcError> {
    let _params: ListParams = optional_params(request)?;

    to_value(ResourcesListResult {
        resources: resources::get_all_resources(),
        next_cursor: None,
    })
}

fn handle_resources_read(
    state: &McpServerState,
    request: &JsonRpcRequest,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: ResourcesReadParams = required_params(request)?;

    debug!("Reading resource: {}", params.uri);

    to_value(resources::read_resource(&state.ctx, &params.uri)?)
}

fn handle_resources_templates_list(
    request: &JsonRpcRequest,
) -> Result<serde_json::Value, JsonRpcError> {
    let _params: ListParams = optional_params(request)?;

    to_value(ResourceTemplatesListResult {
        resource_templates: resources::get_all_templates(),
        next_cursor: None,
    })
}

// ============================================================================
// Prompts Handlers
// ============================================================================

fn handle_prompts_list(request: &JsonRpcRequest) -> Result<serde_json::Value, JsonRpcError> {
    let _params: ListParams = optional_params(request)?;

    to_value(PromptsListResult {
        prompts: prompts::get_all_prompts(),
        next_cursor: None,
    })
}

fn handle_prompts_get(request: &JsonRpcRequest) -> Result<serde_json::Value, JsonRpcError> {
    let params: PromptsGetParams = required_params(request)?;

    debug!("Getting prompt: {}", params.name);

    let result = prompts::get_prompt(&params.name, params.arguments.as_ref())
        .map_err(JsonRpcError::invalid_params)?;

    to_value(result)
}
