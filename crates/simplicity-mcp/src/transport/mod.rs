//! MCP transports
//!
//! Only stdio is implemented; the line framing is generic over any async
//! byte stream so tests can drive the server through an in-memory pipe.

pub mod stdio;

pub use stdio::*;
