//! Deployment workflow tools

use serde::Deserialize;
use std::path::Path;

use simplicity_toolchain::DeployStep;

use super::{error_code, failure, invalid, parse_args, success, ToolContext};
use crate::invariants;
use crate::protocol::{codes, Tool, ToolAnnotations, ToolsCallResult};

/// Deploy contract input parameters
#[derive(Debug, Deserialize)]
pub struct DeployParams {
    pub file_path: String,

    /// Request testnet funds for the derived address
    #[serde(default)]
    pub auto_fund: bool,
}

/// Spend contract input parameters
#[derive(Debug, Deserialize)]
pub struct SpendParams {
    pub program: String,
    pub witness_file: String,

    #[serde(default)]
    pub utxo: Option<String>,

    #[serde(default)]
    pub destination: Option<String>,
}

/// Fund address input parameters
#[derive(Debug, Deserialize)]
pub struct FundParams {
    pub address: String,
}

pub fn deploy_contract_definition() -> Tool {
    Tool {
        name: "simplicity_deploy_contract".to_string(),
        title: Some("Deploy Contract".to_string()),
        description: "Compile a .simf file, derive its Liquid testnet address and optionally \
             fund it from the testnet faucet. Reports which step failed, if any."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the .simf source file"
                },
                "auto_fund": {
                    "type": "boolean",
                    "default": false,
                    "description": "Request testnet funds for the contract address"
                }
            },
            "required": ["file_path"]
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "success": { "type": "boolean" },
                "step": { "type": "string", "enum": ["compile", "get_address"] },
                "program": { "type": "string" },
                "address": { "type": "string" },
                "funding": { "type": "object" },
                "error": { "type": "string" },
                "next_steps": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["success"]
        })),
        annotations: Some(ToolAnnotations::side_effecting(false, true)),
    }
}

pub fn spend_contract_definition() -> Tool {
    Tool {
        name: "simplicity_spend_contract".to_string(),
        title: Some("Prepare Contract Spend".to_string()),
        description: "Load the witness for a deployed program and lay out the PSET steps \
             needed to spend it. Does not sign or broadcast."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "program": {
                    "type": "string",
                    "description": "Base64-encoded compiled program"
                },
                "witness_file": {
                    "type": "string",
                    "description": "Path to the JSON witness file"
                },
                "utxo": {
                    "type": "string",
                    "description": "Funding UTXO as txid:vout"
                },
                "destination": {
                    "type": "string",
                    "description": "Liquid address to pay"
                }
            },
            "required": ["program", "witness_file"]
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "success": { "type": "boolean" },
                "program": { "type": "string" },
                "witness_file": { "type": "string" },
                "witness": {},
                "utxo": { "type": "string" },
                "destination": { "type": "string" },
                "next_steps": { "type": "array", "items": { "type": "string" } },
                "error": { "type": "string" }
            },
            "required": ["success", "program", "witness_file"]
        })),
        annotations: Some(ToolAnnotations::read_only()),
    }
}

pub fn fund_address_definition() -> Tool {
    Tool {
        name: "simplicity_fund_address".to_string(),
        title: Some("Fund Address".to_string()),
        description: "Request Liquid testnet L-BTC for an address from the faucet, retrying \
             a bounded number of times."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "string",
                    "description": "Liquid testnet address"
                }
            },
            "required": ["address"]
        }),
        output_schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "success": { "type": "boolean" },
                "address": { "type": "string" },
                "txid": { "type": "string" },
                "attempts": { "type": "integer" },
                "error": { "type": "string" }
            },
            "required": ["success", "address", "attempts"]
        })),
        annotations: Some(ToolAnnotations::side_effecting(false, true)),
    }
}

pub async fn execute_deploy_contract(
    ctx: &ToolContext,
    arguments: serde_json::Value,
) -> ToolsCallResult {
    let params: DeployParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let file_path = match invariants::validate_file_path("file_path", &params.file_path) {
        Ok(p) => p,
        Err(e) => return invalid(e),
    };

    let result = ctx
        .workflow
        .deploy_contract(Path::new(file_path), params.auto_fund)
        .await;

    let mut text = if result.success {
        format!(
            "Deployed\n├─ Address: {}\n└─ Program: {}",
            result.address.as_deref().unwrap_or_default(),
            result.program.as_deref().unwrap_or_default()
        )
    } else {
        let step = match result.step {
            Some(DeployStep::Compile) => "compile",
            Some(DeployStep::GetAddress) => "get_address",
            None => "unknown",
        };
        format!(
            "Deployment failed at step '{}': {}",
            step,
            result.error.as_deref().unwrap_or("unknown error")
        )
    };
    if let Some(funding) = &result.funding {
        match (&funding.txid, funding.success) {
            (Some(txid), true) => text.push_str(&format!("\nFunded: {}", txid)),
            (None, true) => text.push_str("\nFunding requested"),
            (_, false) => text.push_str(&format!(
                "\nFunding failed after {} attempt(s): {}",
                funding.attempts,
                funding.error.as_deref().unwrap_or("unknown error")
            )),
        }
    }
    if !result.compile.suggestions.is_empty() {
        text.push_str("\n\nSuggestions:");
        for suggestion in &result.compile.suggestions {
            text.push_str(&format!("\n- {}", suggestion));
        }
    }
    if !result.next_steps.is_empty() {
        text.push_str("\n\nNext steps:");
        for (i, step) in result.next_steps.iter().enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, step));
        }
    }

    if result.success {
        return success(text, &result);
    }

    let code = match result.step {
        Some(DeployStep::Compile) => error_code(
            result.compile.error.as_deref(),
            result.compile.install_hint.as_deref(),
            Some(codes::COMPILE_FAILED),
        ),
        _ => {
            let info = result.program_info.as_ref();
            error_code(
                result.error.as_deref(),
                info.and_then(|i| i.install_hint.as_deref()),
                None,
            )
        }
    };
    failure(text, &result, code)
}

pub async fn execute_spend_contract(
    ctx: &ToolContext,
    arguments: serde_json::Value,
) -> ToolsCallResult {
    let params: SpendParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let program = match invariants::validate_program(&params.program) {
        Ok(p) => p,
        Err(e) => return invalid(e),
    };
    let witness_file = match invariants::validate_file_path("witness_file", &params.witness_file)
    {
        Ok(p) => p,
        Err(e) => return invalid(e),
    };
    if let Some(utxo) = params.utxo.as_deref() {
        if let Err(e) = invariants::validate_utxo_ref(utxo) {
            return invalid(e);
        }
    }
    if let Some(destination) = params.destination.as_deref() {
        if let Err(e) = invariants::validate_liquid_address(destination) {
            return invalid(e);
        }
    }

    let plan = ctx
        .workflow
        .spend_contract(
            program,
            Path::new(witness_file),
            params.utxo.as_deref(),
            params.destination.as_deref(),
        )
        .await;

    if !plan.success {
        let text = format!(
            "Cannot prepare spend: {}",
            plan.error.as_deref().unwrap_or("unknown error")
        );
        return failure(text, &plan, None);
    }

    let mut text = String::from("Spend prepared; complete it with the PSET tools:");
    for (i, step) in plan.next_steps.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, step));
    }
    success(text, &plan)
}

pub async fn execute_fund_address(ctx: &ToolContext, arguments: serde_json::Value) -> ToolsCallResult {
    let params: FundParams = match parse_args(arguments) {
        Ok(p) => p,
        Err(e) => return e,
    };
    let address = match invariants::validate_liquid_address(&params.address) {
        Ok(a) => a,
        Err(e) => return invalid(e),
    };

    let outcome = ctx.workflow.fund_address(address).await;
    if !outcome.success {
        let text = format!(
            "Funding {} failed after {} attempt(s): {}",
            outcome.address,
            outcome.attempts,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
        return failure(text, &outcome, None);
    }

    let text = match &outcome.txid {
        Some(txid) => format!("Funded {}\n└─ Transaction: {}", outcome.address, txid),
        None => format!("Funding requested for {}", outcome.address),
    };
    success(text, &outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;
    use simplicity_toolchain::{ScriptedFaucet, ScriptedReply, ScriptedRunner};
    use std::io::Write;
    use std::sync::Arc;

    const PROGRAM: &str = "zSQIS29W33fvVt93hgGA";
    const TXID: &str = "5a1f8c3e9b7d2a4c6e8f0a1b3c5d7e9f1a2b4c6d8e0f1a3b5c7d9e1f3a5b7c9d";
    const ADDRESS: &str = "tex1qsimplicitycontract0";

    fn source_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".simf").tempfile().unwrap();
        writeln!(file, "fn main() {{ () }}").unwrap();
        file
    }

    #[tokio::test]
    async fn test_deploy_with_funding() {
        let runner = Arc::new(
            ScriptedRunner::all_installed()
                .reply("simc", ScriptedReply::stdout(format!("Program:\n{}\n", PROGRAM)))
                .reply(
                    "hal-simplicity",
                    ScriptedReply::stdout(format!(
                        r#"{{"liquid_testnet_address_unconf": "{}"}}"#,
                        ADDRESS
                    )),
                ),
        );
        let faucet = Arc::new(ScriptedFaucet::paying(TXID));
        let ctx = testing::context(&runner, &faucet);
        let file = source_file();

        let result = execute_deploy_contract(
            &ctx,
            serde_json::json!({
                "file_path": file.path().display().to_string(),
                "auto_fund": true
            }),
        )
        .await;

        assert!(!result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["address"], ADDRESS);
        assert_eq!(structured["funding"]["txid"], TXID);
        assert_eq!(faucet.requests(), vec![ADDRESS.to_string()]);
    }

    #[tokio::test]
    async fn test_deploy_funding_failure_keeps_success() {
        let runner = Arc::new(
            ScriptedRunner::all_installed()
                .reply("simc", ScriptedReply::stdout(format!("Program:\n{}\n", PROGRAM)))
                .reply(
                    "hal-simplicity",
                    ScriptedReply::stdout(format!(
                        r#"{{"liquid_testnet_address_unconf": "{}"}}"#,
                        ADDRESS
                    )),
                ),
        );
        let faucet = Arc::new(
            ScriptedFaucet::new()
                .then_fail("rate limited")
                .then_fail("rate limited")
                .then_fail("rate limited"),
        );
        let ctx = testing::context(&runner, &faucet);
        let file = source_file();

        let result = execute_deploy_contract(
            &ctx,
            serde_json::json!({
                "file_path": file.path().display().to_string(),
                "auto_fund": true
            }),
        )
        .await;

        assert!(!result.is_error());
        let structured = result.structured_content.clone().unwrap();
        assert_eq!(structured["success"], true);
        assert!(structured.get("step").is_none());
        assert_eq!(structured["funding"]["success"], false);
        assert!(testing::text(&result).contains("Funding failed after 3 attempt(s)"));
    }

    #[test]
    fn test_deploy_schema_lists_failing_steps() {
        let schema = deploy_contract_definition().output_schema.unwrap();
        assert_eq!(
            schema["properties"]["step"]["enum"],
            serde_json::json!(["compile", "get_address"])
        );
    }

    #[tokio::test]
    async fn test_deploy_compile_failure_short_circuits() {
        let runner = Arc::new(
            ScriptedRunner::all_installed()
                .reply("simc", ScriptedReply::failure("Unknown jet `frobnicate`")),
        );
        let faucet = Arc::new(ScriptedFaucet::always_paying(TXID));
        let ctx = testing::context(&runner, &faucet);
        let file = source_file();

        let result = execute_deploy_contract(
            &ctx,
            serde_json::json!({
                "file_path": file.path().display().to_string(),
                "auto_fund": true
            }),
        )
        .await;

        assert!(result.is_error());
        let structured = result.structured_content.clone().unwrap();
        assert_eq!(structured["step"], "compile");
        assert_eq!(structured["errorCode"], codes::COMPILE_FAILED);
        assert_eq!(runner.calls_to("hal-simplicity"), 0);
        assert!(faucet.requests().is_empty());
        assert!(testing::text(&result).contains("Unknown jet"));
    }

    #[tokio::test]
    async fn test_spend_contract_plan() {
        let ctx = crate::tools::ToolContext::mock();
        let mut witness = tempfile::NamedTempFile::new().unwrap();
        write!(witness, r#"{{"VALUE": {{"value": "42", "type": "u32"}}}}"#).unwrap();

        let result = execute_spend_contract(
            &ctx,
            serde_json::json!({
                "program": PROGRAM,
                "witness_file": witness.path().display().to_string(),
                "utxo": format!("{}:0", TXID)
            }),
        )
        .await;

        assert!(!result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["witness"]["VALUE"]["value"], "42");
        assert_eq!(structured["next_steps"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_spend_contract_rejects_bad_utxo() {
        let ctx = crate::tools::ToolContext::mock();
        let result = execute_spend_contract(
            &ctx,
            serde_json::json!({
                "program": PROGRAM,
                "witness_file": "/tmp/witness.json",
                "utxo": "not-a-utxo"
            }),
        )
        .await;

        assert!(result.is_error());
        assert!(testing::text(&result).contains("utxo must have the form"));
    }

    #[tokio::test]
    async fn test_fund_address_exhausts_retries() {
        let runner = Arc::new(ScriptedRunner::all_installed());
        let faucet = Arc::new(
            ScriptedFaucet::new()
                .then_fail("rate limited")
                .then_fail("rate limited")
                .then_fail("rate limited"),
        );
        let ctx = testing::context(&runner, &faucet);

        let result = execute_fund_address(&ctx, serde_json::json!({ "address": ADDRESS })).await;

        assert!(result.is_error());
        let structured = result.structured_content.unwrap();
        assert_eq!(structured["attempts"], 3);
        assert_eq!(faucet.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_fund_address_rejects_non_liquid() {
        let runner = Arc::new(ScriptedRunner::all_installed());
        let faucet = Arc::new(ScriptedFaucet::always_paying(TXID));
        let ctx = testing::context(&runner, &faucet);

        let result = execute_fund_address(&ctx, serde_json::json!({ "address": "bc1qxyz" })).await;
        assert!(result.is_error());
        assert!(faucet.requests().is_empty());
    }
}
