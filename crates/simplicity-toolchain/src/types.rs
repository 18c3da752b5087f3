//! Result types returned by the gateway and workflow
//!
//! Each operation hands back one of these instead of an `Err`; `success`
//! plus the optional `error` field carry the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::process::Binary;
use crate::workflow::DeployStep;

/// Outcome of a compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,

    /// Base64-encoded program
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Serialized witness, when the compiler produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub warnings: Vec<String>,

    /// Remediation hints for `error`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    /// Set when the compiler binary is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
}

impl CompileResult {
    pub fn compiled(program: String, witness: Option<String>, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            program: Some(program),
            witness,
            error: None,
            warnings,
            suggestions: Vec::new(),
            install_hint: None,
        }
    }

    pub fn failed(error: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            success: false,
            program: None,
            witness: None,
            error: Some(error.into()),
            warnings: Vec::new(),
            suggestions,
            install_hint: None,
        }
    }

    pub fn not_installed(binary: Binary, program: &str) -> Self {
        Self {
            install_hint: Some(binary.install_hint().to_string()),
            ..Self::failed(not_installed_message(binary, program), Vec::new())
        }
    }
}

/// On-chain identity derived from a compiled program
///
/// Parsed best-effort from inspector output: missing fields are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramInfo {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub testnet_address: Option<String>,

    /// Commitment Merkle root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_structure: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jets: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,

    /// Unparsed inspector output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ProgramInfo {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn not_installed(binary: Binary, program: &str) -> Self {
        Self {
            install_hint: Some(binary.install_hint().to_string()),
            ..Self::failed(not_installed_message(binary, program))
        }
    }

    /// Address the testnet faucet should pay: the testnet address when the
    /// inspector reported one, the generic address otherwise
    pub fn funding_address(&self) -> Option<&str> {
        self.testnet_address.as_deref().or(self.address.as_deref())
    }
}

/// Outcome of a program decode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
}

impl DecodeResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            decoded: None,
            error: Some(error.into()),
            install_hint: None,
        }
    }

    pub fn not_installed(binary: Binary, program: &str) -> Self {
        Self {
            install_hint: Some(binary.install_hint().to_string()),
            ..Self::failed(not_installed_message(binary, program))
        }
    }
}

/// Outcome of one PSET workflow step
///
/// `pset` is the opaque token for the next step; `transaction` is only set by
/// extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsetResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pset: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
}

impl PsetResult {
    pub fn with_pset(pset: String) -> Self {
        Self {
            success: true,
            pset: Some(pset),
            transaction: None,
            error: None,
            install_hint: None,
        }
    }

    pub fn with_transaction(transaction: String) -> Self {
        Self {
            success: true,
            pset: None,
            transaction: Some(transaction),
            error: None,
            install_hint: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            pset: None,
            transaction: None,
            error: Some(error.into()),
            install_hint: None,
        }
    }

    pub fn not_installed(binary: Binary, program: &str) -> Self {
        Self {
            install_hint: Some(binary.install_hint().to_string()),
            ..Self::failed(not_installed_message(binary, program))
        }
    }
}

/// Which external binaries are currently resolvable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAvailability {
    pub compiler_available: bool,
    pub general_binary_available: bool,
    pub signing_binary_available: bool,
}

impl ToolAvailability {
    pub fn is_available(&self, binary: Binary) -> bool {
        match binary {
            Binary::Compiler => self.compiler_available,
            Binary::Inspector => self.general_binary_available,
            Binary::Signer => self.signing_binary_available,
        }
    }

    pub fn all_available(&self) -> bool {
        Binary::ALL.iter().all(|b| self.is_available(*b))
    }

    pub fn missing(&self) -> Vec<Binary> {
        Binary::ALL
            .into_iter()
            .filter(|b| !self.is_available(*b))
            .collect()
    }
}

/// Outcome of installing one binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    pub binary: Binary,
    pub success: bool,
    pub already_installed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Manual instructions when automatic installation is not possible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Outcome of a faucet request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingOutcome {
    pub success: bool,
    pub address: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,

    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of the compile → address → fund workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub success: bool,

    /// Stage that stopped the workflow, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<DeployStep>,

    pub compile: CompileResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_info: Option<ProgramInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<FundingOutcome>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// What to do next, given how far the workflow got
    #[serde(default)]
    pub next_steps: Vec<String>,

    pub completed_at: DateTime<Utc>,
}

/// Inputs composed for a manual spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendPlan {
    pub success: bool,
    pub program: String,
    pub witness_file: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub utxo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(default)]
    pub next_steps: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub(crate) fn not_installed_message(binary: Binary, program: &str) -> String {
    format!(
        "{} binary '{}' is not installed or not on PATH. {}",
        binary,
        program,
        binary.install_hint()
    )
}
