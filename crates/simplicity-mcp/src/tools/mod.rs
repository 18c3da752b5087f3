//! Simplicity MCP Tool definitions
//!
//! This module defines all the tools that the Simplicity MCP server exposes.
//! Tools are grouped by family; each family module provides the definitions
//! and executors for its tools.

mod authoring;
mod compile;
mod deploy;
mod inspect;
mod pset;
mod setup;

pub use setup::status_json;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use simplicity_toolchain::{
    CommandRunner, Faucet, HttpFaucet, ProcessGateway, ScriptedFaucet, ScriptedRunner,
    SystemRunner, ToolchainConfig, ToolchainError, Workflow,
};

use crate::protocol::{codes, JsonRpcError, Tool, ToolContent, ToolsCallResult};

/// Tool execution context
///
/// Cloned into every spawned tool call; everything inside is shared and
/// read-only.
#[derive(Clone)]
pub struct ToolContext {
    pub gateway: Arc<ProcessGateway>,
    pub workflow: Arc<Workflow>,
}

impl ToolContext {
    /// Context that spawns real binaries and talks to the configured faucet
    pub fn new(config: ToolchainConfig) -> Result<Self, ToolchainError> {
        let faucet = HttpFaucet::new(&config)?;
        Ok(Self::with_parts(
            config,
            Arc::new(SystemRunner::new()),
            Arc::new(faucet),
        ))
    }

    /// Context over a custom process runner and faucet
    pub fn with_parts(
        config: ToolchainConfig,
        runner: Arc<dyn CommandRunner>,
        faucet: Arc<dyn Faucet>,
    ) -> Self {
        let gateway = Arc::new(ProcessGateway::with_runner(config, runner));
        let workflow = Arc::new(Workflow::new(gateway.clone(), faucet));
        Self { gateway, workflow }
    }

    /// Context answering every call with canned output
    pub fn mock() -> Self {
        Self::with_parts(
            ToolchainConfig::default(),
            Arc::new(ScriptedRunner::demo()),
            Arc::new(ScriptedFaucet::demo()),
        )
    }
}

/// Every tool this server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CompileFile,
    CompileSource,
    GetAddress,
    DecodeProgram,
    ValidateSyntax,
    GetFeatures,
    GenerateExample,
    SuggestFix,
    CheckTools,
    InstallTools,
    DeployContract,
    SpendContract,
    FundAddress,
    PsetCreate,
    PsetUpdateInput,
    PsetFinalize,
    PsetExtract,
}

impl ToolName {
    pub const ALL: [ToolName; 17] = [
        ToolName::CompileFile,
        ToolName::CompileSource,
        ToolName::GetAddress,
        ToolName::DecodeProgram,
        ToolName::ValidateSyntax,
        ToolName::GetFeatures,
        ToolName::GenerateExample,
        ToolName::SuggestFix,
        ToolName::CheckTools,
        ToolName::InstallTools,
        ToolName::DeployContract,
        ToolName::SpendContract,
        ToolName::FundAddress,
        ToolName::PsetCreate,
        ToolName::PsetUpdateInput,
        ToolName::PsetFinalize,
        ToolName::PsetExtract,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::CompileFile => "simplicity_compile_file",
            ToolName::CompileSource => "simplicity_compile_source",
            ToolName::GetAddress => "simplicity_get_address",
            ToolName::DecodeProgram => "simplicity_decode_program",
            ToolName::ValidateSyntax => "simplicity_validate_syntax",
            ToolName::GetFeatures => "simplicity_get_features",
            ToolName::GenerateExample => "simplicity_generate_example",
            ToolName::SuggestFix => "simplicity_suggest_fix",
            ToolName::CheckTools => "simplicity_check_tools",
            ToolName::InstallTools => "simplicity_install_tools",
            ToolName::DeployContract => "simplicity_deploy_contract",
            ToolName::SpendContract => "simplicity_spend_contract",
            ToolName::FundAddress => "simplicity_fund_address",
            ToolName::PsetCreate => "simplicity_pset_create",
            ToolName::PsetUpdateInput => "simplicity_pset_update_input",
            ToolName::PsetFinalize => "simplicity_pset_finalize",
            ToolName::PsetExtract => "simplicity_pset_extract",
        }
    }

    fn definition(self) -> Tool {
        match self {
            ToolName::CompileFile => compile::compile_file_definition(),
            ToolName::CompileSource => compile::compile_source_definition(),
            ToolName::GetAddress => inspect::get_address_definition(),
            ToolName::DecodeProgram => inspect::decode_program_definition(),
            ToolName::ValidateSyntax => authoring::validate_syntax_definition(),
            ToolName::GetFeatures => authoring::get_features_definition(),
            ToolName::GenerateExample => authoring::generate_example_definition(),
            ToolName::SuggestFix => authoring::suggest_fix_definition(),
            ToolName::CheckTools => setup::check_tools_definition(),
            ToolName::InstallTools => setup::install_tools_definition(),
            ToolName::DeployContract => deploy::deploy_contract_definition(),
            ToolName::SpendContract => deploy::spend_contract_definition(),
            ToolName::FundAddress => deploy::fund_address_definition(),
            ToolName::PsetCreate => pset::create_definition(),
            ToolName::PsetUpdateInput => pset::update_input_definition(),
            ToolName::PsetFinalize => pset::finalize_definition(),
            ToolName::PsetExtract => pset::extract_definition(),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| format!("Unknown tool: {}", s))
    }
}

/// Get all tool definitions
pub fn get_all_tools() -> Vec<Tool> {
    ToolName::ALL.into_iter().map(ToolName::definition).collect()
}

/// Execute a tool by name
pub async fn execute_tool(
    ctx: &ToolContext,
    name: &str,
    arguments: serde_json::Value,
) -> ToolsCallResult {
    let tool = match name.parse::<ToolName>() {
        Ok(tool) => tool,
        Err(message) => return ToolsCallResult::error(message),
    };

    let span = info_span!("tool_call", tool = %tool, invocation_id = %Uuid::new_v4());
    async move {
        debug!("Executing tool");
        let result = match tool {
            ToolName::CompileFile => compile::execute_compile_file(ctx, arguments).await,
            ToolName::CompileSource => compile::execute_compile_source(ctx, arguments).await,
            ToolName::GetAddress => inspect::execute_get_address(ctx, arguments).await,
            ToolName::DecodeProgram => inspect::execute_decode_program(ctx, arguments).await,
            ToolName::ValidateSyntax => authoring::execute_validate_syntax(arguments),
            ToolName::GetFeatures => authoring::execute_get_features(),
            ToolName::GenerateExample => authoring::execute_generate_example(arguments),
            ToolName::SuggestFix => authoring::execute_suggest_fix(arguments),
            ToolName::CheckTools => setup::execute_check_tools(ctx),
            ToolName::InstallTools => setup::execute_install_tools(ctx).await,
            ToolName::DeployContract => deploy::execute_deploy_contract(ctx, arguments).await,
            ToolName::SpendContract => deploy::execute_spend_contract(ctx, arguments).await,
            ToolName::FundAddress => deploy::execute_fund_address(ctx, arguments).await,
            ToolName::PsetCreate => pset::execute_create(ctx, arguments).await,
            ToolName::PsetUpdateInput => pset::execute_update_input(ctx, arguments).await,
            ToolName::PsetFinalize => pset::execute_finalize(ctx, arguments).await,
            ToolName::PsetExtract => pset::execute_extract(ctx, arguments).await,
        };
        if result.is_error() {
            warn!("Tool call failed");
        }
        result
    }
    .instrument(span)
    .await
}

// ============================================================================
// Shared helpers for the tool families
// ============================================================================

/// Deserialize tool arguments; a missing argument object counts as `{}`
pub(crate) fn parse_args<T: DeserializeOwned>(
    arguments: serde_json::Value,
) -> Result<T, ToolsCallResult> {
    let arguments = if arguments.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolsCallResult::error(format!("Invalid parameters: {}", e)))
}

/// Turn an argument check failure into a tool error
pub(crate) fn invalid(error: JsonRpcError) -> ToolsCallResult {
    ToolsCallResult::error(format!("Invalid parameters: {}", error.message))
}

/// Successful result carrying a serialized value
pub(crate) fn success<T: Serialize>(text: impl Into<String>, value: &T) -> ToolsCallResult {
    ToolsCallResult::success_with_structured(vec![ToolContent::text(text)], to_structured(value))
}

/// Failed result carrying a serialized value, tagged with an error code
pub(crate) fn failure<T: Serialize>(
    text: impl Into<String>,
    value: &T,
    code: Option<i32>,
) -> ToolsCallResult {
    let mut structured = to_structured(value);
    if let (Some(code), serde_json::Value::Object(map)) = (code, &mut structured) {
        map.insert("errorCode".to_string(), code.into());
    }
    ToolsCallResult::failure(vec![ToolContent::text(text)], structured)
}

/// Error code for a failed external operation
///
/// Missing binaries and timeouts have dedicated codes; anything else falls
/// back to `otherwise`.
pub(crate) fn error_code(
    error: Option<&str>,
    install_hint: Option<&str>,
    otherwise: Option<i32>,
) -> Option<i32> {
    if install_hint.is_some() {
        Some(codes::TOOL_NOT_INSTALLED)
    } else if error.is_some_and(|e| e.contains(" timed out after ")) {
        Some(codes::PROCESS_TIMEOUT)
    } else {
        otherwise
    }
}

fn to_structured<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

/// Multi-line error text with an optional install hint and suggestions
pub(crate) fn describe_failure(
    title: &str,
    error: Option<&str>,
    install_hint: Option<&str>,
    suggestions: &[String],
) -> String {
    let mut text = format!("{}: {}", title, error.unwrap_or("unknown error"));
    if let Some(hint) = install_hint {
        text.push_str("\n\n");
        text.push_str(hint);
    }
    if !suggestions.is_empty() {
        text.push_str("\n\nSuggestions:");
        for suggestion in suggestions {
            text.push_str("\n- ");
            text.push_str(suggestion);
        }
    }
    text
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>(), Ok(tool));
        }
        assert!("simplicity_sign_transaction".parse::<ToolName>().is_err());
    }

    #[test]
    fn test_all_tools_have_definitions() {
        let tools = get_all_tools();
        assert_eq!(tools.len(), ToolName::ALL.len());

        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len());

        for tool in &tools {
            assert!(tool.name.starts_with("simplicity_"));
            assert_eq!(tool.input_schema["type"], "object");
            assert!(tool.annotations.is_some());
            assert!(!tool.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let ctx = ToolContext::mock();
        let result = execute_tool(&ctx, "simplicity_teleport", serde_json::json!({})).await;
        assert!(result.is_error());
        assert_eq!(testing::text(&result), "Unknown tool: simplicity_teleport");
    }

    #[tokio::test]
    async fn test_null_arguments_accepted() {
        let ctx = ToolContext::mock();
        let result = execute_tool(&ctx, "simplicity_get_features", serde_json::Value::Null).await;
        assert!(!result.is_error());
    }

    #[test]
    fn test_failure_adds_error_code() {
        let result = failure(
            "boom",
            &serde_json::json!({"success": false}),
            Some(codes::COMPILE_FAILED),
        );
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["errorCode"], -32101);
    }

    #[test]
    fn test_error_code_classification() {
        assert_eq!(
            error_code(Some("x"), Some("install it"), None),
            Some(codes::TOOL_NOT_INSTALLED)
        );
        assert_eq!(
            error_code(Some("simc timed out after 60s"), None, None),
            Some(codes::PROCESS_TIMEOUT)
        );
        assert_eq!(
            error_code(Some("syntax"), None, Some(codes::COMPILE_FAILED)),
            Some(codes::COMPILE_FAILED)
        );
    }
}
