//! Scripted stand-ins for the process runner and the faucet
//!
//! Used by the test suites and by the server's `--mock` mode, which answers
//! every tool call with canned output instead of spawning binaries.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, ToolchainError};
use crate::faucet::{Faucet, FundingReceipt};
use crate::process::{Binary, CommandOutput, CommandRunner, Invocation};

/// Canned response for one invocation
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Output(CommandOutput),
    Timeout,
    SpawnFailure(String),
}

impl ScriptedReply {
    pub fn stdout(stdout: impl Into<String>) -> Self {
        ScriptedReply::Output(CommandOutput::ok(stdout))
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        ScriptedReply::Output(CommandOutput::failed(stderr))
    }

    fn into_result(self, invocation: &Invocation) -> Result<CommandOutput> {
        match self {
            ScriptedReply::Output(out) => Ok(out),
            ScriptedReply::Timeout => Err(ToolchainError::Timeout {
                program: invocation.program.clone(),
                secs: invocation.timeout.as_secs(),
            }),
            ScriptedReply::SpawnFailure(message) => Err(ToolchainError::Spawn {
                program: invocation.program.clone(),
                message,
            }),
        }
    }
}

#[derive(Default)]
struct RunnerState {
    installed: HashSet<String>,
    queued: HashMap<String, VecDeque<ScriptedReply>>,
    fallback: HashMap<String, ScriptedReply>,
    calls: Vec<Invocation>,
    observed_files: Vec<PathBuf>,
}

/// Runner that answers from a script and records every invocation
///
/// Queued replies for a program are used first, then its fallback. A program
/// with neither exits non-zero with an "unscripted" diagnostic.
#[derive(Default)]
pub struct ScriptedRunner {
    state: Mutex<RunnerState>,
}

impl ScriptedRunner {
    /// Runner with nothing installed
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner with the three default binary names installed
    pub fn all_installed() -> Self {
        let names: Vec<&str> = Binary::ALL.iter().map(|b| b.default_program()).collect();
        Self::new().installed(&names)
    }

    /// Canned outputs for every binary, used by `--mock`
    pub fn demo() -> Self {
        Self::all_installed()
            .fallback(
                Binary::Compiler.default_program(),
                ScriptedReply::stdout(format!("Program:\n{}\n", DEMO_PROGRAM)),
            )
            .fallback(
                Binary::Inspector.default_program(),
                ScriptedReply::stdout(DEMO_INFO),
            )
            .fallback(
                Binary::Signer.default_program(),
                ScriptedReply::stdout(DEMO_PSET),
            )
    }

    pub fn installed(self, programs: &[&str]) -> Self {
        for program in programs {
            self.install(program);
        }
        self
    }

    /// Queue a one-shot reply for a program
    pub fn reply(self, program: &str, reply: ScriptedReply) -> Self {
        self.lock()
            .queued
            .entry(program.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Reply used once the queue for a program is empty
    pub fn fallback(self, program: &str, reply: ScriptedReply) -> Self {
        self.lock().fallback.insert(program.to_string(), reply);
        self
    }

    /// Mark a program as installed after construction
    pub fn install(&self, program: &str) {
        self.lock().installed.insert(program.to_string());
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, program: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.program == program)
            .count()
    }

    /// Arguments that named an existing file at the time of the call
    pub fn observed_files(&self) -> Vec<PathBuf> {
        self.lock().observed_files.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RunnerState> {
        // A panicking test thread must not hide the recorded calls
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    fn is_available(&self, program: &str) -> bool {
        self.lock().installed.contains(program)
    }

    async fn run(&self, invocation: Invocation) -> Result<CommandOutput> {
        let mut state = self.lock();

        for arg in &invocation.args {
            let path = Path::new(arg);
            if path.is_file() {
                state.observed_files.push(path.to_path_buf());
            }
        }
        state.calls.push(invocation.clone());

        let queued = state
            .queued
            .get_mut(&invocation.program)
            .and_then(VecDeque::pop_front);
        let reply = queued.or_else(|| state.fallback.get(&invocation.program).cloned());

        match reply {
            Some(reply) => reply.into_result(&invocation),
            None => Ok(CommandOutput::failed(format!(
                "unscripted invocation of {}",
                invocation.program
            ))),
        }
    }
}

const DEMO_PROGRAM: &str = "zSQIS29W33fvVt9371bfd+9W33fvVt93hgGA";

const DEMO_INFO: &str = r#"{
  "jets": "core",
  "commit_base64": "zSQIS29W33fvVt9371bfd+9W33fvVt93hgGA",
  "cmr": "9c1b2ec2c1c0fd2cb4b7e9a2c9b5d8c4c2b4e6a1f6d3c2b1a09f8e7d6c5b4a39",
  "liquid_address_unconf": "ex1pmqk3s9yxt6c8x6h5k4d5tq2w0k0l5d8c9f5wg8n4gk3q2j0h6vqsx4t7v2",
  "liquid_testnet_address_unconf": "tex1pmqk3s9yxt6c8x6h5k4d5tq2w0k0l5d8c9f5wg8n4gk3q2j0h6vqsz9m3k8"
}"#;

const DEMO_TXID: &str = "0f3a5c7e9b1d3f5a7c9e1b3d5f7a9c1e3b5d7f9a1c3e5b7d9f1a3c5e7b9d1f3a";

const DEMO_PSET: &str = r#"{"pset": "cHNldP8BAgQCAAAAAQQBAQEFAQEB+wQCAAAAAA==", "hex": "020000000101000000000000000000"}"#;

/// Faucet that answers from a script and records every address
#[derive(Default)]
pub struct ScriptedFaucet {
    queued: Mutex<VecDeque<std::result::Result<Option<String>, String>>>,
    fallback_txid: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFaucet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faucet whose first request pays out `txid`
    pub fn paying(txid: &str) -> Self {
        Self::new().then_pay(txid)
    }

    /// Faucet that pays out `txid` on every request
    pub fn always_paying(txid: &str) -> Self {
        Self {
            fallback_txid: Some(txid.to_string()),
            ..Self::default()
        }
    }

    /// Faucet used by `--mock`
    pub fn demo() -> Self {
        Self::always_paying(DEMO_TXID)
    }

    pub fn then_pay(self, txid: &str) -> Self {
        self.push(Ok(Some(txid.to_string())));
        self
    }

    pub fn then_fail(self, message: &str) -> Self {
        self.push(Err(message.to_string()));
        self
    }

    /// Addresses requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn push(&self, reply: std::result::Result<Option<String>, String>) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(reply);
        }
    }
}

#[async_trait]
impl Faucet for ScriptedFaucet {
    async fn request_funds(&self, address: &str) -> Result<FundingReceipt> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(address.to_string());
        }

        let reply = self
            .queued
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| match &self.fallback_txid {
                Some(txid) => Ok(Some(txid.clone())),
                None => Err("faucet script exhausted".to_string()),
            });

        match reply {
            Ok(txid) => Ok(FundingReceipt { txid }),
            Err(message) => Err(ToolchainError::Faucet(message)),
        }
    }
}
