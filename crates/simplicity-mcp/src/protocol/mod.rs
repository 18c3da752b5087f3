//! MCP protocol types
//!
//! JSON-RPC framing plus the lifecycle, tool, resource and prompt messages
//! this server speaks.

pub mod capabilities;
pub mod jsonrpc;
pub mod lifecycle;
pub mod messages;

pub use capabilities::*;
pub use jsonrpc::*;
pub use lifecycle::*;
pub use messages::*;
