//! MCP Server implementation
//!
//! Lifecycle and listing requests are answered inline, in arrival order.
//! Each `tools/call` runs as its own task so a long compile or faucet request
//! does not hold up other requests; its response is written whenever it
//! finishes.

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::handlers::{
    handle_notification, handle_request, handle_tools_call, is_allowed, McpServerState,
};
use crate::invariants;
use crate::protocol::{IncomingMessage, JsonRpcError, JsonRpcResponse, RequestId};
use crate::tools::ToolContext;
use crate::transport::{create_stdio_channels, Channels, MessageSender, TransportError};

/// Channel capacity between the transport tasks and the server loop
const CHANNEL_BUFFER: usize = 64;

/// MCP Server
pub struct McpServer {
    state: McpServerState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(ctx: ToolContext) -> Self {
        Self {
            state: McpServerState::new(ctx),
        }
    }

    /// Run the server using stdio transport
    pub async fn run_stdio(self) -> Result<(), TransportError> {
        info!("Starting Simplicity MCP server (stdio transport)");
        self.serve(create_stdio_channels(CHANNEL_BUFFER)).await
    }

    /// Serve until the input side closes, then flush every pending response
    pub async fn serve(mut self, channels: Channels) -> Result<(), TransportError> {
        let Channels {
            sender,
            mut receiver,
            writer,
        } = channels;
        let mut calls: JoinSet<()> = JoinSet::new();

        while let Some(message) = receiver.recv().await {
            // Reap finished tool calls so the set does not grow unbounded
            while let Some(joined) = calls.try_join_next() {
                if let Err(e) = joined {
                    error!("Tool call task failed: {}", e);
                }
            }

            let json: serde_json::Value = match serde_json::from_str(&message) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Failed to parse JSON: {}", e);
                    reply(&sender, JsonRpcResponse::error(RequestId::Null, JsonRpcError::parse_error()))
                        .await?;
                    continue;
                }
            };

            let id = json
                .get("id")
                .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok())
                .unwrap_or(RequestId::Null);

            match IncomingMessage::classify(json) {
                Ok(IncomingMessage::Request(request)) => {
                    let dispatch = request.method == "tools/call"
                        && is_allowed(&self.state, &request.method)
                        && invariants::validate_request(&request).is_ok();

                    if dispatch {
                        let ctx = self.state.tool_context();
                        let sender = sender.clone();
                        calls.spawn(async move {
                            let response = handle_tools_call(&ctx, &request).await;
                            if let Err(e) = sender.send_response(&response).await {
                                error!("Failed to write tool response: {}", e);
                            }
                        });
                    } else {
                        let response = handle_request(&mut self.state, &request).await;
                        reply(&sender, response).await?;
                    }
                }
                Ok(IncomingMessage::Notification(notification)) => {
                    handle_notification(&mut self.state, &notification);
                }
                Ok(IncomingMessage::Response) => {
                    debug!("Received response from client (ignored)");
                }
                Err(error) => {
                    warn!("Invalid message");
                    reply(&sender, JsonRpcResponse::error(id, error)).await?;
                }
            }
        }

        info!("Input closed; waiting for {} tool call(s)", calls.len());
        while let Some(joined) = calls.join_next().await {
            if let Err(e) = joined {
                error!("Tool call task failed: {}", e);
            }
        }

        drop(sender);
        if let Err(e) = writer.await {
            error!("Output writer failed: {}", e);
        }

        info!("Simplicity MCP server stopped");
        Ok(())
    }
}

async fn reply(sender: &MessageSender, response: JsonRpcResponse) -> Result<(), TransportError> {
    sender.send_response(&response).await
}
