//! Error types for the Simplicity toolchain

use thiserror::Error;

use crate::process::Binary;

/// Result type alias for toolchain operations
pub type Result<T> = std::result::Result<T, ToolchainError>;

/// Errors raised while driving the external toolchain
///
/// These stay inside the crate boundary: the gateway and workflow convert them
/// into result structs before handing anything back to a caller.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required binary is not resolvable
    #[error("{binary} binary '{program}' is not installed or not on PATH")]
    NotInstalled { binary: Binary, program: String },

    /// Process could not be spawned
    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    /// Process exceeded its deadline
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// Process exited unsuccessfully; carries its diagnostic output verbatim
    #[error("{0}")]
    Failed(String),

    /// Input file is missing
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Faucet request failed
    #[error("Faucet error: {0}")]
    Faucet(String),
}
