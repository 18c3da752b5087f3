//! Multi-step contract workflows
//!
//! Deployment runs compile → address → fund and stops at the first hard
//! failure; funding is the only step allowed to fail without failing the
//! whole run. Spending only assembles inputs and the remaining manual steps.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ToolchainError;
use crate::faucet::{fund_with_retry, Faucet};
use crate::gateway::ProcessGateway;
use crate::types::{DeploymentResult, FundingOutcome, SpendPlan};

/// Stage of the deploy workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStep {
    Compile,
    GetAddress,
}

/// Orchestrates the gateway and the faucet
pub struct Workflow {
    gateway: Arc<ProcessGateway>,
    faucet: Arc<dyn Faucet>,
}

impl Workflow {
    pub fn new(gateway: Arc<ProcessGateway>, faucet: Arc<dyn Faucet>) -> Self {
        Self { gateway, faucet }
    }

    pub fn gateway(&self) -> &ProcessGateway {
        &self.gateway
    }

    /// Compile a contract file, derive its address and optionally fund it
    pub async fn deploy_contract(&self, source_path: &Path, auto_fund: bool) -> DeploymentResult {
        info!(path = %source_path.display(), auto_fund, "Deploying contract");

        let compile = self.gateway.compile_file(source_path, None).await;
        let program = match compile.program.clone().filter(|_| compile.success) {
            Some(program) => program,
            None => {
                let mut next_steps = vec![
                    "Fix the compile error, then run the deployment again".to_string(),
                ];
                next_steps.extend(compile.suggestions.iter().cloned());
                if let Some(hint) = &compile.install_hint {
                    next_steps.push(hint.clone());
                }
                return DeploymentResult {
                    success: false,
                    step: Some(DeployStep::Compile),
                    error: compile.error.clone(),
                    compile,
                    program_info: None,
                    program: None,
                    address: None,
                    funding: None,
                    next_steps,
                    completed_at: chrono::Utc::now(),
                };
            }
        };

        let info = self.gateway.get_program_info(&program).await;
        let address = info
            .funding_address()
            .filter(|_| info.success)
            .map(str::to_string);
        let address = match address {
            Some(address) => address,
            None => {
                let error = info
                    .error
                    .clone()
                    .unwrap_or_else(|| "Inspector output contained no address".to_string());
                let mut next_steps =
                    vec!["Derive the address manually from the compiled program".to_string()];
                if let Some(hint) = &info.install_hint {
                    next_steps.push(hint.clone());
                }
                return DeploymentResult {
                    success: false,
                    step: Some(DeployStep::GetAddress),
                    error: Some(error),
                    compile,
                    program_info: Some(info),
                    program: Some(program),
                    address: None,
                    funding: None,
                    next_steps,
                    completed_at: chrono::Utc::now(),
                };
            }
        };

        let mut next_steps = Vec::new();
        let funding = if auto_fund {
            let outcome = self.fund_address(&address).await;
            if !outcome.success {
                warn!(address = %address, "Auto-funding failed; deployment continues unfunded");
                next_steps.push(format!(
                    "Auto-funding failed; fund {} manually at {}",
                    address,
                    self.gateway.config().faucet_url
                ));
            }
            Some(outcome)
        } else {
            next_steps.push(format!(
                "Fund {} from the testnet faucet (simplicity_fund_address)",
                address
            ));
            None
        };
        next_steps.push(
            "Once the funding transaction confirms, spend with simplicity_spend_contract"
                .to_string(),
        );

        info!(address = %address, "Deployment complete");
        DeploymentResult {
            success: true,
            step: None,
            error: None,
            compile,
            program_info: Some(info),
            program: Some(program),
            address: Some(address),
            funding,
            next_steps,
            completed_at: chrono::Utc::now(),
        }
    }

    /// Request testnet funds with the configured retry policy
    pub async fn fund_address(&self, address: &str) -> FundingOutcome {
        let address = address.trim();
        if address.is_empty() {
            return FundingOutcome {
                success: false,
                address: String::new(),
                txid: None,
                attempts: 0,
                error: Some("Address must not be empty".to_string()),
            };
        }

        let config = self.gateway.config();
        fund_with_retry(
            self.faucet.as_ref(),
            address,
            config.faucet_max_attempts,
            config.faucet_retry_delay(),
        )
        .await
    }

    /// Assemble a spend of a funded contract
    ///
    /// Reads the witness file and lays out the PSET steps; nothing is signed
    /// or broadcast here.
    pub async fn spend_contract(
        &self,
        program: &str,
        witness_file: &Path,
        utxo: Option<&str>,
        destination: Option<&str>,
    ) -> SpendPlan {
        let mut plan = SpendPlan {
            success: false,
            program: program.trim().to_string(),
            witness_file: witness_file.display().to_string(),
            witness: None,
            utxo: utxo.map(str::to_string),
            destination: destination.map(str::to_string),
            next_steps: Vec::new(),
            error: None,
        };

        if plan.program.is_empty() {
            plan.error = Some("Program must not be empty".to_string());
            return plan;
        }

        let content = match tokio::fs::read_to_string(witness_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                plan.error =
                    Some(ToolchainError::FileNotFound(plan.witness_file.clone()).to_string());
                return plan;
            }
            Err(e) => {
                plan.error = Some(ToolchainError::Io(e).to_string());
                return plan;
            }
        };

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(witness) => plan.witness = Some(witness),
            Err(e) => {
                plan.error = Some(format!("Witness file is not valid JSON: {}", e));
                return plan;
            }
        }

        plan.next_steps = spend_steps(utxo, destination);
        plan.success = true;
        plan
    }
}

fn spend_steps(utxo: Option<&str>, destination: Option<&str>) -> Vec<String> {
    let input = match utxo {
        Some(utxo) => format!("Use {} as the spending input", utxo),
        None => "Look up the contract's funding UTXO (txid:vout, amount, asset)".to_string(),
    };
    let output = destination.unwrap_or("your destination address");

    vec![
        input,
        format!(
            "simplicity_pset_create with that input and outputs paying {} plus a fee output",
            output
        ),
        "simplicity_pset_update_input with the UTXO's amount, asset and script".to_string(),
        "simplicity_pset_finalize with the program and the serialized witness".to_string(),
        "simplicity_pset_extract, then broadcast the transaction hex".to_string(),
    ]
}
