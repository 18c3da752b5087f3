//! Toolchain configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ToolchainError;
use crate::process::Binary;

/// Environment variable overriding the compiler binary
pub const ENV_COMPILER: &str = "SIMC_PATH";

/// Environment variable overriding the inspector binary
pub const ENV_INSPECTOR: &str = "HAL_SIMPLICITY_PATH";

/// Environment variable overriding the signer binary
pub const ENV_SIGNER: &str = "HAL_SIMPLICITY_PSET_PATH";

/// Environment variable overriding the faucet endpoint
pub const ENV_FAUCET_URL: &str = "SIMPLICITY_FAUCET_URL";

/// Default Liquid testnet faucet endpoint
pub const DEFAULT_FAUCET_URL: &str = "https://liquidtestnet.com/faucet";

/// Toolchain configuration
///
/// Read-only once the server has started; every component receives it
/// explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Compiler binary name or path
    pub compiler: String,

    /// Inspector binary name or path (general program/address operations)
    pub inspector: String,

    /// Signer binary name or path (PSET workflow operations)
    pub signer: String,

    /// Timeout for a single external process (seconds)
    pub process_timeout_secs: u64,

    /// Timeout for tool installation (seconds)
    pub install_timeout_secs: u64,

    /// Directory for temporary source files (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,

    /// Faucet endpoint
    pub faucet_url: String,

    /// Faucet attempts before giving up
    pub faucet_max_attempts: u32,

    /// Delay between faucet attempts (milliseconds)
    pub faucet_retry_delay_ms: u64,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: Binary::Compiler.default_program().to_string(),
            inspector: Binary::Inspector.default_program().to_string(),
            signer: Binary::Signer.default_program().to_string(),
            process_timeout_secs: 60,
            install_timeout_secs: 900,
            temp_dir: None,
            faucet_url: DEFAULT_FAUCET_URL.to_string(),
            faucet_max_attempts: 3,
            faucet_retry_delay_ms: 2_000,
        }
    }
}

impl ToolchainConfig {
    /// Program name or path configured for a binary
    pub fn program(&self, binary: Binary) -> &str {
        match binary {
            Binary::Compiler => &self.compiler,
            Binary::Inspector => &self.inspector,
            Binary::Signer => &self.signer,
        }
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    pub fn faucet_retry_delay(&self) -> Duration {
        Duration::from_millis(self.faucet_retry_delay_ms)
    }

    /// Directory used for temporary source files
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("simplicity-mcp").join("config.json"))
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides on top of the current values
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_COMPILER) {
            self.compiler = v;
        }
        if let Some(v) = non_empty(ENV_INSPECTOR) {
            self.inspector = v;
        }
        if let Some(v) = non_empty(ENV_SIGNER) {
            self.signer = v;
        }
        if let Some(v) = non_empty(ENV_FAUCET_URL) {
            self.faucet_url = v;
        }
    }

    /// Reject values that would make every call fail
    pub fn check(&self) -> crate::Result<()> {
        for binary in Binary::ALL {
            if self.program(binary).trim().is_empty() {
                return Err(ToolchainError::Config(format!(
                    "{} binary name must not be empty",
                    binary
                )));
            }
        }
        if self.process_timeout_secs == 0 || self.install_timeout_secs == 0 {
            return Err(ToolchainError::Config(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.faucet_max_attempts == 0 {
            return Err(ToolchainError::Config(
                "faucet_max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_use_unqualified_names() {
        let config = ToolchainConfig::default();
        assert_eq!(config.program(Binary::Compiler), "simc");
        assert_eq!(config.program(Binary::Inspector), "hal-simplicity");
        assert_eq!(config.program(Binary::Signer), "hal-simplicity-pset");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_overrides_replace_only_set_values() {
        let env: HashMap<&str, &str> = [(ENV_COMPILER, "/opt/simc"), (ENV_SIGNER, "  ")]
            .into_iter()
            .collect();

        let mut config = ToolchainConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.compiler, "/opt/simc");
        assert_eq!(config.signer, "hal-simplicity-pset");
        assert_eq!(config.inspector, "hal-simplicity");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = ToolchainConfig::default();
        config.compiler = "simc-0.3".to_string();
        config.faucet_max_attempts = 5;
        config.save(&path).unwrap();

        let loaded = ToolchainConfig::load(&path).unwrap();
        assert_eq!(loaded.compiler, "simc-0.3");
        assert_eq!(loaded.faucet_max_attempts, 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"inspector": "hal"}"#).unwrap();

        let loaded = ToolchainConfig::load(&path).unwrap();
        assert_eq!(loaded.inspector, "hal");
        assert_eq!(loaded.compiler, "simc");
        assert_eq!(loaded.process_timeout_secs, 60);
    }

    #[test]
    fn test_check_rejects_zero_timeout() {
        let config = ToolchainConfig {
            process_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.check(), Err(ToolchainError::Config(_))));
    }
}
