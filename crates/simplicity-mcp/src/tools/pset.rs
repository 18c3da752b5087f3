//! PSET signing-workflow tools
//!
//! create → update_input → finalize → extract, all routed to the signer
//! binary. The PSET string from each step is the input to the next.

use serde::Deserialize;

use simplicity_toolchain::PsetResult;

use super::{error_code, failure, invalid, parse_args, success, ToolContext};
use crate::invariants;
use crate::protocol::{Tool, ToolAnnotations, ToolsCallResult};

#[derive(Debug, Deserialize)]
pub struct CreateParams {
    /// JSON array of inputs
    pub inputs: String,
    /// JSON array of outputs
    pub outputs: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInputParams {
    pub pset: String,
    pub input_index: u32,
    /// Spent output as txid:vout
    pub utxo: String,
    pub amount: String,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeParams {
    pub pset: String,
    pub input_index: u32,
    pub program: String,
    pub witness: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtractParams {
    pub pset: String,
}

fn pset_output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "success": { "type": "boolean" },
            "pset": { "type": "string", "description": "Base64 PSET for the next step" },
            "transaction": { "type": "string", "description": "Raw transaction hex" },
            "error": { "type": "string" },
            "install_hint": { "type": "string" }
        },
        "required": ["success"]
    })
}

pub fn create_definition() -> Tool {
    Tool {
        name: "simplicity_pset_create".to_string(),
        title: Some("Create PSET".to_string()),
        description: "Create a PSET spending the given inputs to the given outputs."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "inputs": {
                    "type": "string",
                    "description": "JSON array of inputs, e.g. [{\"txid\": \"...\", \"vout\": 0}]"
                },
                "outputs": {
                    "type": "string",
                    "description": "JSON array of outputs, e.g. [{\"address\": \"...\", \"amount\": 0.0001}]"
                }
            },
            "required": ["inputs", "outputs"]
        }),
        output_schema: Some(pset_output_schema()),
        annotations: Some(ToolAnnotations::side_effecting(true, false)),
    }
}

pub fn update_input_definition() -> Tool {
    Tool {
        name: "simplicity_pset_update_input".to_string(),
        title: Some("Update PSET Input".to_string()),
        description: "Attach the spent output's amount, asset and script to one PSET input."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "pset": { "type": "string", "description": "Base64 PSET" },
                "input_index": { "type": "integer", "minimum": 0 },
                "utxo": { "type": "string", "description": "Spent output as txid:vout" },
                "amount": { "type": "string", "description": "Amount in BTC, e.g. 0.001" },
                "asset": { "type": "string", "description": "Asset id (hex)" },
                "script": { "type": "string", "description": "scriptPubKey (hex)" }
            },
            "required": ["pset", "input_index", "utxo", "amount"]
        }),
        output_schema: Some(pset_output_schema()),
        annotations: Some(ToolAnnotations::side_effecting(true, false)),
    }
}

pub fn finalize_definition() -> Tool {
    Tool {
        name: "simplicity_pset_finalize".to_string(),
        title: Some("Finalize PSET Input".to_string()),
        description: "Attach the Simplicity program and its witness to one PSET input."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "pset": { "type": "string", "description": "Base64 PSET" },
                "input_index": { "type": "integer", "minimum": 0 },
                "program": { "type": "string", "description": "Base64-encoded program" },
                "witness": { "type": "string", "description": "Serialized witness" }
            },
            "required": ["pset", "input_index", "program", "witness"]
        }),
        output_schema: Some(pset_output_schema()),
        annotations: Some(ToolAnnotations::side_effecting(true, false)),
    }
}

pub fn extract_definition() -> Tool {
    Tool {
        name: "simplicity_pset_extract".to_string(),
        title: Some("Extract Transaction".to_string()),
        description: "Extract the broadcastable transaction hex from a finalized PSET."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "pset": { "type": "string", "description": "Finalized base64 PSET" }
            },
            "required": ["pset"]
        }),
        output_schema: Some(pset_output_schema()),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub async fn execute_create(ctx: &ToolContext, arguments: serde_json::Value) -> ToolsCallResult {
    let params: CreateParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let checked = invariants::validate_json_array("inputs", &params.inputs)
        .and_then(|_| invariants::validate_json_array("outputs", &params.outputs));
    if let Err(e) = checked {
        return invalid(e);
    }

    let result = ctx.gateway.create_pset(&params.inputs, &params.outputs).await;
    render("PSET created", &result)
}

pub async fn execute_update_input(
    ctx: &ToolContext,
    arguments: serde_json::Value,
) -> ToolsCallResult {
    let params: UpdateInputParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let checked = invariants::validate_program(&params.pset)
        .map_err(|e| rename_field(e, "program", "pset"))
        .and_then(|_| invariants::validate_utxo_ref(&params.utxo))
        .and_then(|_| invariants::validate_amount(&params.amount))
        .and_then(|_| match params.asset.as_deref() {
            Some(asset) => invariants::validate_asset_id(asset),
            None => Ok(""),
        })
        .and_then(|_| match params.script.as_deref() {
            Some(script) => invariants::validate_script(script),
            None => Ok(""),
        });
    if let Err(e) = checked {
        return invalid(e);
    }

    let result = ctx
        .gateway
        .update_pset_input(
            &params.pset,
            params.input_index,
            &params.utxo,
            &params.amount,
            params.asset.as_deref(),
            params.script.as_deref(),
        )
        .await;
    render("PSET input updated", &result)
}

pub async fn execute_finalize(ctx: &ToolContext, arguments: serde_json::Value) -> ToolsCallResult {
    let params: FinalizeParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let checked = invariants::validate_program(&params.pset)
        .map_err(|e| rename_field(e, "program", "pset"))
        .and_then(|_| invariants::validate_program(&params.program))
        .and_then(|_| invariants::require_non_empty("witness", &params.witness));
    if let Err(e) = checked {
        return invalid(e);
    }

    let result = ctx
        .gateway
        .finalize_pset(
            &params.pset,
            params.input_index,
            &params.program,
            &params.witness,
        )
        .await;
    render("PSET input finalized", &result)
}

pub async fn execute_extract(ctx: &ToolContext, arguments: serde_json::Value) -> ToolsCallResult {
    let params: ExtractParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    if let Err(e) = invariants::validate_program(&params.pset) {
        return invalid(rename_field(e, "program", "pset"));
    }

    let result = ctx.gateway.extract_transaction(&params.pset).await;
    render("Transaction extracted", &result)
}

/// PSETs share the base64 check with programs; report the right field name
fn rename_field(
    mut error: crate::protocol::JsonRpcError,
    from: &str,
    to: &str,
) -> crate::protocol::JsonRpcError {
    error.message = error.message.replacen(from, to, 1);
    error
}

fn render(title: &str, result: &PsetResult) -> ToolsCallResult {
    if result.success {
        let text = match (&result.transaction, &result.pset) {
            (Some(tx), _) => format!("{}\n└─ Transaction: {}", title, tx),
            (None, Some(pset)) => format!("{}\n└─ PSET: {}", title, pset),
            (None, None) => title.to_string(),
        };
        return success(text, result);
    }

    let text = super::describe_failure(
        "Signer failed",
        result.error.as_deref(),
        result.install_hint.as_deref(),
        &[],
    );
    let code = error_code(result.error.as_deref(), result.install_hint.as_deref(), None);
    failure(text, result, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codes;
    use crate::tools::testing;
    use simplicity_toolchain::{ScriptedFaucet, ScriptedReply, ScriptedRunner};
    use std::sync::Arc;

    const PSET: &str = "cHNldP8BAgQCAAAAAQQBAQEFAQEB+wQCAAAAAA==";
    const TXID: &str = "5a1f8c3e9b7d2a4c6e8f0a1b3c5d7e9f1a2b4c6d8e0f1a3b5c7d9e1f3a5b7c9d";

    #[tokio::test]
    async fn test_create_routes_to_signer() {
        let runner = Arc::new(ScriptedRunner::all_installed().reply(
            "hal-simplicity-pset",
            ScriptedReply::stdout(format!(r#"{{"pset": "{}"}}"#, PSET)),
        ));
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let result = execute_create(
            &ctx,
            serde_json::json!({
                "inputs": format!(r#"[{{"txid": "{}", "vout": 0}}]"#, TXID),
                "outputs": r#"[{"address": "tex1qdest000000", "amount": 0.0001}]"#
            }),
        )
        .await;

        assert!(!result.is_error());
        assert_eq!(result.structured_content.unwrap()["pset"], PSET);
        assert_eq!(runner.calls_to("hal-simplicity-pset"), 1);
        assert_eq!(runner.calls_to("hal-simplicity"), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_inputs() {
        let runner = Arc::new(ScriptedRunner::all_installed());
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let result = execute_create(
            &ctx,
            serde_json::json!({ "inputs": "[]", "outputs": "[{}]" }),
        )
        .await;

        assert!(result.is_error());
        assert!(testing::text(&result).contains("inputs must contain at least one entry"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_input_validates_before_spawning() {
        let runner = Arc::new(ScriptedRunner::all_installed());
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let result = execute_update_input(
            &ctx,
            serde_json::json!({
                "pset": PSET,
                "input_index": 0,
                "utxo": format!("{}:0", TXID),
                "amount": "0"
            }),
        )
        .await;

        assert!(result.is_error());
        assert!(testing::text(&result).contains("amount must be positive"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_input_forwards_optional_flags() {
        let runner = Arc::new(ScriptedRunner::all_installed().reply(
            "hal-simplicity-pset",
            ScriptedReply::stdout(format!(r#"{{"pset": "{}"}}"#, PSET)),
        ));
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let result = execute_update_input(
            &ctx,
            serde_json::json!({
                "pset": PSET,
                "input_index": 1,
                "utxo": format!("{}:0", TXID),
                "amount": "0.001",
                "asset": TXID,
                "script": "5120abcd"
            }),
        )
        .await;

        assert!(!result.is_error());
        let args = &runner.calls()[0].args;
        assert!(args.iter().any(|a| a == "--asset"));
        assert!(args.iter().any(|a| a == "--script"));
        assert_eq!(args[3], "1");
    }

    #[tokio::test]
    async fn test_extract_missing_signer() {
        let runner = Arc::new(ScriptedRunner::new().installed(&["simc", "hal-simplicity"]));
        let ctx = testing::context(&runner, &Arc::new(ScriptedFaucet::new()));

        let result = execute_extract(&ctx, serde_json::json!({ "pset": PSET })).await;

        assert!(result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["errorCode"], codes::TOOL_NOT_INSTALLED);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_reports_pset_field() {
        let ctx = crate::tools::ToolContext::mock();
        let result = execute_finalize(
            &ctx,
            serde_json::json!({
                "pset": "not base64!",
                "input_index": 0,
                "program": "zSQIS29W33fvVt93hgGA",
                "witness": "00"
            }),
        )
        .await;

        assert!(result.is_error());
        assert!(testing::text(&result).contains("pset is not valid base64"));
    }
}
