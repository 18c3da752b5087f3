//! Simplicity MCP Server
//!
//! This crate implements a Model Context Protocol (MCP) server that lets any
//! MCP-compatible AI agent write, compile, inspect and deploy SimplicityHL
//! contracts through the `simplicity-toolchain` crate.
//!
//! # Features
//!
//! - **Tools**: syntax validation, compilation, program inspection, PSET
//!   construction and the deploy/spend/fund workflows
//! - **Resources**: feature catalog, live toolchain status, example programs
//! - **Prompts**: guided workflows for writing, debugging and deploying contracts
//!
//! # Transport Support
//!
//! - **stdio**: Standard input/output (for Claude Desktop, VS Code, etc.)
//!
//! # Example Usage
//!
//! ```no_run
//! use simplicity_mcp::{McpServer, ToolContext};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let server = McpServer::new(ToolContext::mock());
//!     server.run_stdio().await.expect("Server failed");
//! }
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP version 2025-11-25.

pub mod handlers;
pub mod invariants;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{
    ClientCapabilities, ClientInfo, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION,
    ServerCapabilities, ServerInfo, Tool, ToolContent, ToolsCallResult,
};
pub use server::McpServer;
pub use tools::{ToolContext, ToolName};
