//! Startup configuration
//!
//! Values come from an optional TOML file overlaid by `HONEST_*`
//! environment variables. Nested keys use a double underscore, e.g.
//! `HONEST_BOOTSTRAP__ATTEMPTS`.

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use ethers::types::Address;
use serde::Deserialize;

use crate::bootstrap::RetryPolicy;
use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "HONEST";
pub const DEFAULT_RPC_URL: &str = "https://rpc.sepolia.org";
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// WalletConnect project identifier.
    pub wc_project_id: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub contract_address: Address,
    pub bootstrap: RetryPolicy,
    pub notice_duration: Duration,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    wc_project_id: Option<String>,
    #[serde(default = "default_rpc_url")]
    rpc_url: String,
    #[serde(default = "default_chain_id")]
    chain_id: u64,
    contract_address: Option<Address>,
    #[serde(default)]
    bootstrap: RetryPolicy,
    #[serde(default = "default_notice_duration_ms")]
    notice_duration_ms: u64,
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_chain_id() -> u64 {
    SEPOLIA_CHAIN_ID
}

fn default_notice_duration_ms() -> u64 {
    5_000
}

impl AppConfig {
    /// Read the config file (if given and present) and the environment.
    /// A missing project id or contract address is fatal.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        Self::build(builder.add_source(environment()))
    }

    /// Parse a TOML document, without looking at the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let raw: RawConfig = builder
            .build()
            .map_err(ConfigError::Read)?
            .try_deserialize()
            .map_err(ConfigError::Deserialize)?;
        let wc_project_id = raw
            .wc_project_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::MissingProjectId)?;
        let contract_address = raw
            .contract_address
            .ok_or(ConfigError::MissingContractAddress)?;
        Ok(Self {
            wc_project_id,
            rpc_url: raw.rpc_url,
            chain_id: raw.chain_id,
            contract_address,
            bootstrap: raw.bootstrap,
            notice_duration: Duration::from_millis(raw.notice_duration_ms),
        })
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CONTRACT: &str = "0x00000000000000000000000000000000000000c0";

    #[test]
    fn defaults_fill_optional_fields() {
        let config = AppConfig::from_toml_str(&format!(
            "wc_project_id = \"abc123\"\ncontract_address = \"{CONTRACT}\"\n"
        ))
        .unwrap();
        assert_eq!(
            config,
            AppConfig {
                wc_project_id: "abc123".into(),
                rpc_url: DEFAULT_RPC_URL.into(),
                chain_id: SEPOLIA_CHAIN_ID,
                contract_address: CONTRACT.parse().unwrap(),
                bootstrap: RetryPolicy::default(),
                notice_duration: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_toml_str(&format!(
            r#"
            wc_project_id = "abc123"
            contract_address = "{CONTRACT}"
            rpc_url = "http://localhost:8545"
            chain_id = 31337
            notice_duration_ms = 1500

            [bootstrap]
            attempts = 3
            interval_ms = 250
            "#
        ))
        .unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.bootstrap.total(), Duration::from_millis(750));
        assert_eq!(config.notice_duration, Duration::from_millis(1500));
    }

    #[test]
    fn missing_project_id_is_fatal() {
        let err =
            AppConfig::from_toml_str(&format!("contract_address = \"{CONTRACT}\"\n")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectId));

        let err = AppConfig::from_toml_str(&format!(
            "wc_project_id = \"  \"\ncontract_address = \"{CONTRACT}\"\n"
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectId));
    }

    #[test]
    fn missing_contract_is_fatal() {
        let err = AppConfig::from_toml_str("wc_project_id = \"abc123\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingContractAddress));
    }
}
