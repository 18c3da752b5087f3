//! Simplicity MCP Server
//!
//! A Model Context Protocol server that lets AI agents write, compile and
//! deploy SimplicityHL contracts through the Simplicity toolchain.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use simplicity_mcp::{McpServer, ToolContext};
use simplicity_toolchain::{ScriptedFaucet, ScriptedRunner, ToolchainConfig};

/// Simplicity MCP Server - SimplicityHL tooling for AI agents
#[derive(Parser, Debug)]
#[command(name = "simplicity-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON)
    #[arg(short, long, env = "SIMPLICITY_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Compiler binary name or path
    #[arg(long)]
    simc: Option<String>,

    /// Inspector binary name or path
    #[arg(long)]
    hal: Option<String>,

    /// PSET-capable signer binary name or path
    #[arg(long)]
    hal_pset: Option<String>,

    /// Timeout for a single external process (seconds)
    #[arg(long)]
    timeout: Option<u64>,

    /// Testnet faucet endpoint
    #[arg(long)]
    faucet_url: Option<String>,

    /// Answer every toolchain call with canned output (no binaries, no network)
    #[arg(long)]
    mock: bool,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Shorthand for --log-level debug
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl Args {
    fn level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            self.log_level.into()
        }
    }

    /// Defaults, then the config file, then environment, then flags
    fn toolchain_config(&self) -> anyhow::Result<ToolchainConfig> {
        let path = self
            .config
            .clone()
            .or_else(|| ToolchainConfig::default_path().filter(|p| p.exists()));

        let config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                ToolchainConfig::load(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?
            }
            None => ToolchainConfig::default(),
        };

        let mut config = config.with_env_overrides();
        if let Some(simc) = &self.simc {
            config.compiler = simc.clone();
        }
        if let Some(hal) = &self.hal {
            config.inspector = hal.clone();
        }
        if let Some(hal_pset) = &self.hal_pset {
            config.signer = hal_pset.clone();
        }
        if let Some(timeout) = self.timeout {
            config.process_timeout_secs = timeout;
        }
        if let Some(url) = &self.faucet_url {
            config.faucet_url = url.clone();
        }

        config.check().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout is reserved for MCP protocol
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.level().as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("Simplicity MCP Server v{} starting", env!("CARGO_PKG_VERSION"));

    let config = args.toolchain_config()?;

    let ctx = if args.mock {
        warn!("Using scripted toolchain; no binaries will be run");
        ToolContext::with_parts(
            config,
            Arc::new(ScriptedRunner::demo()),
            Arc::new(ScriptedFaucet::demo()),
        )
    } else {
        info!(
            compiler = %config.compiler,
            inspector = %config.inspector,
            signer = %config.signer,
            "Using system toolchain"
        );
        ToolContext::new(config).context("failed to set up the toolchain")?
    };

    let availability = ctx.gateway.availability();
    if !availability.all_available() {
        warn!(
            missing = ?availability.missing(),
            "Some toolchain binaries are missing; their tools will return install guidance"
        );
    }

    McpServer::new(ctx).run_stdio().await?;

    Ok(())
}
