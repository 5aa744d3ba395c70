//! Configuration management for the dry-run deployer
//!
//! Loads configuration from a TOML file with environment variable substitution.
//! Secrets are never read from the file itself: the wallet section only names
//! where the key lives.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref ENV_VAR: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub node: NodeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    pub contract: ContractConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub rpc_url: String,
    /// Expected chain ID; the run aborts if the node reports another one
    pub chain_id: Option<u64>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
    pub keystore_path: Option<PathBuf>,
    pub keystore_password_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    pub artifact_path: PathBuf,
    #[serde(default)]
    pub constructor_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_gas_limit_buffer_percent")]
    pub gas_limit_buffer_percent: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_private_key_env() -> String {
    "DEPLOYER_PRIVATE_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_gas_limit_buffer_percent() -> u64 {
    20
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: default_private_key_env(),
            keystore_path: None,
            keystore_password_env: None,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            gas_limit_buffer_percent: default_gas_limit_buffer_percent(),
        }
    }
}

impl Settings {
    /// Load settings from the file named by `DEPLOYER_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var("DEPLOYER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.node.rpc_url.trim().is_empty() {
            anyhow::bail!("node.rpc_url is empty");
        }
        if self.node.request_timeout_secs == 0 {
            anyhow::bail!("node.request_timeout_secs must be greater than zero");
        }
        if self.run.timeout_secs == 0 {
            anyhow::bail!("run.timeout_secs must be greater than zero");
        }
        if self.contract.artifact_path.as_os_str().is_empty() {
            anyhow::bail!("contract.artifact_path is empty");
        }
        if self.wallet.keystore_path.is_some() && self.wallet.keystore_password_env.is_none() {
            anyhow::bail!("wallet.keystore_path requires wallet.keystore_password_env");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
