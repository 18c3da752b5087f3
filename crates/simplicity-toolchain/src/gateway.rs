//! Process gateway for the external Simplicity binaries
//!
//! Every public operation is pre-bound to one binary: compilation goes to the
//! compiler, program inspection to the inspector, and the PSET steps to the
//! signer build. Availability is checked before each call so a missing binary
//! is reported with install guidance instead of a spawn error.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ToolchainConfig;
use crate::error::{Result, ToolchainError};
use crate::output;
use crate::process::{Binary, CommandOutput, CommandRunner, Invocation, SystemRunner};
use crate::suggest::suggest_fix;
use crate::types::{
    CompileResult, DecodeResult, InstallOutcome, ProgramInfo, PsetResult, ToolAvailability,
};

/// Crate the compiler is published as
const COMPILER_CRATE: &str = "simplicityhl";

/// Repository the inspector is built from
const INSPECTOR_REPO: &str = "https://github.com/BlockstreamResearch/hal-simplicity";

/// Gateway to the compiler, inspector and signer binaries
pub struct ProcessGateway {
    config: ToolchainConfig,
    runner: Arc<dyn CommandRunner>,
}

impl ProcessGateway {
    /// Gateway that spawns real processes
    pub fn new(config: ToolchainConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner::new()))
    }

    /// Gateway over a custom runner
    pub fn with_runner(config: ToolchainConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    // ========================================================================
    // Availability
    // ========================================================================

    /// Whether a binary is resolvable right now
    pub fn is_available(&self, binary: Binary) -> bool {
        self.runner.is_available(self.config.program(binary))
    }

    /// Check all three binaries; never cached
    pub fn availability(&self) -> ToolAvailability {
        ToolAvailability {
            compiler_available: self.is_available(Binary::Compiler),
            general_binary_available: self.is_available(Binary::Inspector),
            signing_binary_available: self.is_available(Binary::Signer),
        }
    }

    /// Install guidance for whatever is missing
    pub fn install_instructions(&self, availability: &ToolAvailability) -> Vec<String> {
        availability
            .missing()
            .into_iter()
            .map(|binary| {
                format!(
                    "{} ({}): {}",
                    binary,
                    self.config.program(binary),
                    binary.install_hint()
                )
            })
            .collect()
    }

    /// Install missing binaries where an automatic route exists
    pub async fn install_tools(&self) -> Vec<InstallOutcome> {
        let mut outcomes = Vec::with_capacity(Binary::ALL.len());

        for binary in Binary::ALL {
            if self.is_available(binary) {
                outcomes.push(InstallOutcome {
                    binary,
                    success: true,
                    already_installed: true,
                    error: None,
                    instructions: None,
                });
                continue;
            }

            let args: Vec<String> = match binary {
                Binary::Compiler => vec!["install".into(), "--locked".into(), COMPILER_CRATE.into()],
                Binary::Inspector => vec![
                    "install".into(),
                    "--locked".into(),
                    "--git".into(),
                    INSPECTOR_REPO.into(),
                    "hal-simplicity".into(),
                ],
                // The PSET build lives on a branch and has to be renamed by hand
                Binary::Signer => {
                    outcomes.push(InstallOutcome {
                        binary,
                        success: false,
                        already_installed: false,
                        error: Some("No automatic installation route".to_string()),
                        instructions: Some(binary.install_hint().to_string()),
                    });
                    continue;
                }
            };

            if !self.runner.is_available("cargo") {
                outcomes.push(InstallOutcome {
                    binary,
                    success: false,
                    already_installed: false,
                    error: Some("cargo is not installed; install Rust from https://rustup.rs".to_string()),
                    instructions: Some(binary.install_hint().to_string()),
                });
                continue;
            }

            info!(binary = %binary, "Installing via cargo");
            let invocation = Invocation::new("cargo", args, self.config.install_timeout());
            let outcome = match self.run_checked(invocation).await {
                Ok(_) => InstallOutcome {
                    binary,
                    success: true,
                    already_installed: false,
                    error: None,
                    instructions: None,
                },
                Err(e) => {
                    warn!(binary = %binary, error = %e, "Installation failed");
                    InstallOutcome {
                        binary,
                        success: false,
                        already_installed: false,
                        error: Some(e.to_string()),
                        instructions: Some(binary.install_hint().to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    // ========================================================================
    // Compiler
    // ========================================================================

    /// Compile a source file, optionally with a witness file
    pub async fn compile_file(&self, path: &Path, witness_file: Option<&Path>) -> CompileResult {
        if !path.is_file() {
            return CompileResult::failed(
                format!("Source file not found: {}", path.display()),
                Vec::new(),
            );
        }
        if let Some(witness) = witness_file {
            if !witness.is_file() {
                return CompileResult::failed(
                    format!("Witness file not found: {}", witness.display()),
                    Vec::new(),
                );
            }
        }

        let mut args = vec![path.display().to_string()];
        if let Some(witness) = witness_file {
            args.push("--wit".to_string());
            args.push(witness.display().to_string());
        }

        match self.invoke(Binary::Compiler, args).await {
            Ok(out) => {
                let parsed = output::parse_compiler_output(&out.stdout);
                match parsed.program {
                    Some(program) => {
                        info!(path = %path.display(), bytes = program.len(), "Compiled program");
                        CompileResult::compiled(program, parsed.witness, parsed.warnings)
                    }
                    None => {
                        let error = format!(
                            "Compiler exited successfully but printed no program: {}",
                            out.stdout.trim()
                        );
                        CompileResult::failed(error, suggest_fix(&out.stdout))
                    }
                }
            }
            Err(ToolchainError::NotInstalled { binary, program }) => {
                CompileResult::not_installed(binary, &program)
            }
            Err(e) => {
                let error = e.to_string();
                let suggestions = suggest_fix(&error);
                CompileResult::failed(error, suggestions)
            }
        }
    }

    /// Compile source text through a temporary file
    ///
    /// The file is uniquely named and removed when this returns, whatever the
    /// outcome.
    pub async fn compile_source(&self, source: &str) -> CompileResult {
        if source.trim().is_empty() {
            return CompileResult::failed("Source is empty", Vec::new());
        }
        if !self.is_available(Binary::Compiler) {
            return CompileResult::not_installed(Binary::Compiler, &self.config.compiler);
        }

        let temp = match self.write_temp_source(source) {
            Ok(temp) => temp,
            Err(e) => {
                return CompileResult::failed(
                    format!("Failed to write temporary source file: {}", e),
                    Vec::new(),
                )
            }
        };
        debug!(path = %temp.path().display(), "Wrote temporary source");

        // `temp` is dropped (and deleted) at the end of this scope
        self.compile_file(temp.path(), None).await
    }

    fn write_temp_source(&self, source: &str) -> Result<tempfile::NamedTempFile> {
        let mut temp = tempfile::Builder::new()
            .prefix("simplicity-")
            .suffix(".simf")
            .tempfile_in(self.config.temp_dir())?;
        temp.write_all(source.as_bytes())?;
        temp.flush()?;
        Ok(temp)
    }

    // ========================================================================
    // Inspector
    // ========================================================================

    /// Derive address and hash for a compiled program
    pub async fn get_program_info(&self, program: &str) -> ProgramInfo {
        let program = program.trim();
        if program.is_empty() {
            return ProgramInfo::failed("Program must not be empty");
        }

        let args = vec!["simplicity".into(), "info".into(), program.to_string()];
        match self.invoke(Binary::Inspector, args).await {
            Ok(out) => output::parse_program_info(&out.stdout),
            Err(ToolchainError::NotInstalled { binary, program }) => {
                ProgramInfo::not_installed(binary, &program)
            }
            Err(e) => ProgramInfo::failed(e.to_string()),
        }
    }

    /// Decode a compiled program into its structure
    pub async fn decode_program(&self, program: &str) -> DecodeResult {
        let program = program.trim();
        if program.is_empty() {
            return DecodeResult::failed("Program must not be empty");
        }

        let args = vec!["simplicity".into(), "info".into(), program.to_string()];
        match self.invoke(Binary::Inspector, args).await {
            Ok(out) => DecodeResult {
                success: true,
                decoded: Some(output::parse_decoded(&out.stdout)),
                error: None,
                install_hint: None,
            },
            Err(ToolchainError::NotInstalled { binary, program }) => {
                DecodeResult::not_installed(binary, &program)
            }
            Err(e) => DecodeResult::failed(e.to_string()),
        }
    }

    // ========================================================================
    // Signer (PSET workflow)
    // ========================================================================

    /// Create an empty-signature PSET from input and output descriptions (JSON)
    pub async fn create_pset(&self, inputs: &str, outputs: &str) -> PsetResult {
        if inputs.trim().is_empty() || outputs.trim().is_empty() {
            return PsetResult::failed("PSET inputs and outputs must not be empty");
        }
        let args = vec![
            "pset".into(),
            "create".into(),
            inputs.trim().to_string(),
            outputs.trim().to_string(),
        ];
        self.pset_step(args, output::parse_pset, PsetResult::with_pset)
            .await
    }

    /// Attach UTXO data to one PSET input
    pub async fn update_pset_input(
        &self,
        pset: &str,
        input_index: u32,
        utxo_ref: &str,
        amount: &str,
        asset: Option<&str>,
        script: Option<&str>,
    ) -> PsetResult {
        if pset.trim().is_empty() {
            return PsetResult::failed("PSET must not be empty");
        }
        if utxo_ref.trim().is_empty() || amount.trim().is_empty() {
            return PsetResult::failed("UTXO reference and amount are required");
        }

        let mut args = vec![
            "pset".into(),
            "update-input".into(),
            pset.trim().to_string(),
            input_index.to_string(),
            "--utxo".into(),
            utxo_ref.trim().to_string(),
            "--amount".into(),
            amount.trim().to_string(),
        ];
        if let Some(asset) = asset {
            args.push("--asset".into());
            args.push(asset.trim().to_string());
        }
        if let Some(script) = script {
            args.push("--script".into());
            args.push(script.trim().to_string());
        }

        self.pset_step(args, output::parse_pset, PsetResult::with_pset)
            .await
    }

    /// Attach program and witness to one PSET input
    pub async fn finalize_pset(
        &self,
        pset: &str,
        input_index: u32,
        program: &str,
        witness: &str,
    ) -> PsetResult {
        if pset.trim().is_empty() || program.trim().is_empty() {
            return PsetResult::failed("PSET and program must not be empty");
        }
        let args = vec![
            "pset".into(),
            "finalize".into(),
            pset.trim().to_string(),
            input_index.to_string(),
            program.trim().to_string(),
            witness.trim().to_string(),
        ];
        self.pset_step(args, output::parse_pset, PsetResult::with_pset)
            .await
    }

    /// Extract the broadcastable transaction from a finalized PSET
    pub async fn extract_transaction(&self, pset: &str) -> PsetResult {
        if pset.trim().is_empty() {
            return PsetResult::failed("PSET must not be empty");
        }
        let args = vec!["pset".into(), "extract".into(), pset.trim().to_string()];
        self.pset_step(args, output::parse_transaction, PsetResult::with_transaction)
            .await
    }

    async fn pset_step(
        &self,
        args: Vec<String>,
        parse: fn(&str) -> Option<String>,
        wrap: fn(String) -> PsetResult,
    ) -> PsetResult {
        let command = args.get(1).cloned().unwrap_or_default();
        match self.invoke(Binary::Signer, args).await {
            Ok(out) => match parse(&out.stdout) {
                Some(value) => wrap(value),
                None => PsetResult::failed(format!(
                    "Signer output for pset {} contained no PSET or transaction field: {}",
                    command,
                    out.stdout.trim()
                )),
            },
            Err(ToolchainError::NotInstalled { binary, program }) => {
                PsetResult::not_installed(binary, &program)
            }
            Err(e) => PsetResult::failed(e.to_string()),
        }
    }

    // ========================================================================
    // Process plumbing
    // ========================================================================

    /// Run a binary after the availability pre-flight
    async fn invoke(&self, binary: Binary, args: Vec<String>) -> Result<CommandOutput> {
        let program = self.config.program(binary).to_string();
        if !self.runner.is_available(&program) {
            warn!(binary = %binary, program = %program, "Binary not available");
            return Err(ToolchainError::NotInstalled { binary, program });
        }

        debug!(binary = %binary, args = ?args, "Invoking");
        let invocation = Invocation::new(program, args, self.config.process_timeout());
        self.run_checked(invocation).await
    }

    async fn run_checked(&self, invocation: Invocation) -> Result<CommandOutput> {
        let out = self.runner.run(invocation).await?;
        if out.success {
            Ok(out)
        } else {
            Err(ToolchainError::Failed(out.diagnostic()))
        }
    }
}
