//! Simplicity Toolchain - validation, compilation and deployment orchestration
//!
//! This crate drives the external Simplicity tooling on behalf of the MCP
//! server: it lints SimplicityHL source before it reaches the compiler, routes
//! each operation to the right external binary, sequences the
//! compile → address → fund workflow and turns compiler diagnostics into
//! actionable suggestions.
//!
//! # External binaries
//!
//! - **compiler** (`simc`): SimplicityHL source to base64 program
//! - **inspector** (`hal-simplicity`): program info, addresses, decoding
//! - **signer** (`hal-simplicity-pset`): the PSET-capable build used for the
//!   create → update-input → finalize → extract sequence
//!
//! Gateway and workflow operations never return `Err`; every outcome is a
//! result value with an explicit success flag.

pub mod catalog;
pub mod config;
pub mod error;
pub mod examples;
pub mod faucet;
pub mod gateway;
pub mod mock;
pub mod output;
pub mod process;
pub mod suggest;
pub mod types;
pub mod validator;
pub mod workflow;

pub use catalog::{describe_features, FeatureCatalog, JetCatalog, CATALOG_VERSION};
pub use config::ToolchainConfig;
pub use error::{Result, ToolchainError};
pub use examples::{generate_example, generate_example_named, ExamplePattern};
pub use faucet::{fund_with_retry, Faucet, FundingReceipt, HttpFaucet};
pub use gateway::ProcessGateway;
pub use mock::{ScriptedFaucet, ScriptedReply, ScriptedRunner};
pub use process::{Binary, CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use suggest::suggest_fix;
pub use types::{
    CompileResult, DecodeResult, DeploymentResult, FundingOutcome, InstallOutcome, ProgramInfo,
    PsetResult, SpendPlan, ToolAvailability,
};
pub use validator::{validate, ValidationResult};
pub use workflow::{DeployStep, Workflow};
