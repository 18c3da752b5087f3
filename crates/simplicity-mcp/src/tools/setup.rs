//! Toolchain setup tools

use simplicity_toolchain::Binary;

use super::{failure, success, ToolContext};
use crate::protocol::{Tool, ToolAnnotations, ToolsCallResult};

pub fn check_tools_definition() -> Tool {
    Tool {
        name: "simplicity_check_tools".to_string(),
        title: Some("Check Toolchain".to_string()),
        description: "Report which external binaries (simc, hal-simplicity, \
             hal-simplicity-pset) are installed, with install instructions for missing ones."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "compilerAvailable": { "type": "boolean" },
                "generalBinaryAvailable": { "type": "boolean" },
                "signingBinaryAvailable": { "type": "boolean" },
                "instructions": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["compilerAvailable", "generalBinaryAvailable", "signingBinaryAvailable"]
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub fn install_tools_definition() -> Tool {
    Tool {
        name: "simplicity_install_tools".to_string(),
        title: Some("Install Toolchain".to_string()),
        description: "Install missing binaries with cargo where an automatic route exists \
             (simc, hal-simplicity). Can take several minutes."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "outcomes": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "binary": { "type": "string" },
                            "success": { "type": "boolean" },
                            "already_installed": { "type": "boolean" },
                            "error": { "type": "string" },
                            "instructions": { "type": "string" }
                        }
                    }
                }
            }
        })),
        annotations: Some(ToolAnnotations::side_effecting(true, true)),
    }
}

/// Live availability; checked on every call
pub fn status_json(ctx: &ToolContext) -> serde_json::Value {
    let availability = ctx.gateway.availability();
    let instructions = ctx.gateway.install_instructions(&availability);

    let mut value = serde_json::to_value(availability).unwrap_or(serde_json::Value::Null);
    if let serde_json::Value::Object(map) = &mut value {
        map.insert("instructions".to_string(), instructions.into());
    }
    value
}

pub fn execute_check_tools(ctx: &ToolContext) -> ToolsCallResult {
    let status = status_json(ctx);

    let config = ctx.gateway.config();
    let mut text = String::from("Simplicity toolchain");
    for (i, binary) in Binary::ALL.into_iter().enumerate() {
        let branch = if i + 1 == Binary::ALL.len() { "└─" } else { "├─" };
        let state = if ctx.gateway.is_available(binary) {
            "installed"
        } else {
            "missing"
        };
        text.push_str(&format!(
            "\n{} {} ({}): {}",
            branch,
            binary,
            config.program(binary),
            state
        ));
    }
    if let Some(instructions) = status["instructions"].as_array() {
        for line in instructions.iter().filter_map(|l| l.as_str()) {
            text.push_str("\n\n");
            text.push_str(line);
        }
    }

    success(text, &status)
}

pub async fn execute_install_tools(ctx: &ToolContext) -> ToolsCallResult {
    let outcomes = ctx.gateway.install_tools().await;

    let mut text = String::from("Install results");
    for outcome in &outcomes {
        let state = match (outcome.success, outcome.already_installed) {
            (true, true) => "already installed".to_string(),
            (true, false) => "installed".to_string(),
            (false, _) => format!(
                "not installed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
        };
        text.push_str(&format!("\n- {}: {}", outcome.binary, state));
        if let Some(instructions) = &outcome.instructions {
            text.push_str(&format!("\n  {}", instructions));
        }
    }

    let structured = serde_json::json!({ "outcomes": outcomes });
    if outcomes.iter().all(|o| o.success) {
        success(text, &structured)
    } else {
        failure(text, &structured, None)
    }
}
