//! Initialization handshake

use serde::{Deserialize, Serialize};

use super::capabilities::{ClientCapabilities, ClientInfo, ServerCapabilities, ServerInfo};

/// Guidance returned to the client at initialization
const INSTRUCTIONS: &str = "Simplicity toolchain server. Start with simplicity_check_tools to see \
     which binaries are installed, use simplicity_get_features and simplicity_generate_example \
     before writing code, run simplicity_validate_syntax before compiling, and feed compiler \
     errors to simplicity_suggest_fix. simplicity_deploy_contract compiles, derives the address \
     and can fund it from the Liquid testnet faucet.";

/// Initialize request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,

    #[serde(default)]
    pub capabilities: ClientCapabilities,

    pub client_info: ClientInfo,
}

/// Initialize response result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl InitializeResult {
    pub fn new(protocol_version: String) -> Self {
        Self {
            protocol_version,
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo::default(),
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_params_without_capabilities() {
        let json = r#"{
            "protocolVersion": "2025-11-25",
            "clientInfo": { "name": "test-client", "version": "1.0.0" }
        }"#;

        let params: InitializeParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.protocol_version, "2025-11-25");
        assert_eq!(params.client_info.name, "test-client");
    }

    #[test]
    fn test_initialize_result_serialize() {
        let result = InitializeResult::new("2025-11-25".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["serverInfo"]["name"], "simplicity-mcp");
        assert!(json["instructions"]
            .as_str()
            .unwrap()
            .contains("simplicity_check_tools"));
    }
}
