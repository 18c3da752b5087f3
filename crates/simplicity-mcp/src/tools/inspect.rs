//! Program inspection tools

use serde::Deserialize;

use super::{error_code, failure, invalid, parse_args, success, ToolContext};
use crate::invariants;
use crate::protocol::{Tool, ToolAnnotations, ToolContent, ToolsCallResult};

/// Input for tools taking a compiled program
#[derive(Debug, Deserialize)]
pub struct ProgramParams {
    /// Base64-encoded program
    pub program: String,
}

fn program_input_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "program": {
                "type": "string",
                "description": "Base64-encoded compiled program (output of a compile tool)"
            }
        },
        "required": ["program"]
    })
}

pub fn get_address_definition() -> Tool {
    Tool {
        name: "simplicity_get_address".to_string(),
        title: Some("Get Contract Address".to_string()),
        description: "Derive the Liquid address, program hash and witness structure of a \
             compiled program using hal-simplicity."
            .to_string(),
        input_schema: program_input_schema(),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "success": { "type": "boolean" },
                "address": { "type": "string" },
                "testnet_address": { "type": "string" },
                "program_hash": { "type": "string" },
                "witness_structure": {},
                "jets": { "type": "string" },
                "error": { "type": "string" }
            },
            "required": ["success"]
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub fn decode_program_definition() -> Tool {
    Tool {
        name: "simplicity_decode_program".to_string(),
        title: Some("Decode Program".to_string()),
        description: "Decode a compiled program with hal-simplicity and return everything \
             the inspector reports about it."
            .to_string(),
        input_schema: program_input_schema(),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "success": { "type": "boolean" },
                "decoded": {},
                "error": { "type": "string" }
            },
            "required": ["success"]
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

fn parse_program(arguments: serde_json::Value) -> Result<String, ToolsCallResult> {
    let params: ProgramParams = parse_args(arguments)?;
    invariants::validate_program(&params.program)
        .map(str::to_string)
        .map_err(invalid)
}

pub async fn execute_get_address(ctx: &ToolContext, arguments: serde_json::Value) -> ToolsCallResult {
    let program = match parse_program(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };

    let info = ctx.gateway.get_program_info(&program).await;
    if !info.success {
        let text = super::describe_failure(
            "Inspection failed",
            info.error.as_deref(),
            info.install_hint.as_deref(),
            &[],
        );
        let code = error_code(info.error.as_deref(), info.install_hint.as_deref(), None);
        return failure(text, &info, code);
    }

    let text = format!(
        "Program info\n\
         ├─ Address: {}\n\
         ├─ Testnet address: {}\n\
         └─ Program hash: {}",
        info.address.as_deref().unwrap_or("(not reported)"),
        info.testnet_address.as_deref().unwrap_or("(not reported)"),
        info.program_hash.as_deref().unwrap_or("(not reported)"),
    );
    success(text, &info)
}

pub async fn execute_decode_program(
    ctx: &ToolContext,
    arguments: serde_json::Value,
) -> ToolsCallResult {
    let program = match parse_program(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };

    let decoded = ctx.gateway.decode_program(&program).await;
    if !decoded.success {
        let text = super::describe_failure(
            "Decode failed",
            decoded.error.as_deref(),
            decoded.install_hint.as_deref(),
            &[],
        );
        let code = error_code(decoded.error.as_deref(), decoded.install_hint.as_deref(), None);
        return failure(text, &decoded, code);
    }

    let value = decoded.decoded.clone().unwrap_or(serde_json::Value::Null);
    ToolsCallResult::success_with_structured(
        vec![ToolContent::json(&value)],
        serde_json::to_value(&decoded).unwrap_or(serde_json::Value::Null),
    )
}
