// src/config.rs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use ethers::types::{Address, U256};
use ethers_core::utils::parse_ether;
use secrecy::{ExposeSecret, SecretString};

use crate::blockchain::{evm_client::ClientSettings, models::ChainEndpoint};
use crate::mint::engine::EngineSettings;

// Loaded once at startup from the environment / .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Chain
    pub endpoint: ChainEndpoint,
    pub chain_id: Option<u64>,

    // Wallets, never logged
    pub private_keys: Vec<SecretString>,

    // Target
    pub contract_address: Address,
    pub quantity: u64,
    pub value: Option<U256>,
    pub mint_functions: Vec<String>,

    // Interface sources
    pub abi_path: Option<PathBuf>,
    pub etherscan_api_key: Option<String>,

    // Execution
    pub dry_run: bool,
    pub stagger_ms: u64,
    pub default_gas_limit: u64,
    pub rpc_probe_timeout_ms: u64,
    pub confirmation_timeout_secs: u64,
    pub receipt_poll_ms: u64,
    pub report_json: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rpc_urls = get("RPC_URLS").context("RPC_URLS must be set to a comma-separated list of RPC URLs")?;
        let endpoint = ChainEndpoint::parse_list(&rpc_urls).context("Invalid URL in RPC_URLS")?;
        if endpoint.is_empty() {
            bail!("RPC_URLS must contain at least one URL");
        }

        let chain_id = get("CHAIN_ID")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("CHAIN_ID must be a valid number")?;

        let private_keys: Vec<SecretString> = get("PRIVATE_KEYS")
            .context("PRIVATE_KEYS must be set")?
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.to_string()))
            .collect();
        if private_keys.is_empty() {
            bail!("PRIVATE_KEYS must contain at least one key");
        }

        let contract_address = get("CONTRACT_ADDRESS")
            .context("CONTRACT_ADDRESS must be set")?
            .parse::<Address>()
            .map_err(|e| anyhow!("CONTRACT_ADDRESS is not a valid address: {}", e))?;

        let value = match (get("VALUE_WEI"), get("VALUE_ETH")) {
            (Some(wei), _) => Some(
                U256::from_dec_str(&wei).map_err(|e| anyhow!("VALUE_WEI must be an integer amount of wei: {}", e))?,
            ),
            (None, Some(eth)) => Some(parse_ether(&eth).context("VALUE_ETH must be a decimal ether amount")?),
            (None, None) => None,
        };

        let mint_functions = get("MINT_FUNCTIONS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let number = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(v) => v.parse().with_context(|| format!("{} must be a valid number", key)),
                None => Ok(default),
            }
        };

        Ok(Config {
            endpoint,
            chain_id,
            private_keys,
            contract_address,
            quantity: number("QUANTITY", 1)?.max(1),
            value,
            mint_functions,
            abi_path: get("ABI_PATH").map(PathBuf::from),
            etherscan_api_key: get("ETHERSCAN_API_KEY"),
            dry_run: parse_flag(get("DRY_RUN").as_deref()),
            stagger_ms: number("STAGGER_MS", 150)?,
            default_gas_limit: number("DEFAULT_GAS_LIMIT", 300_000)?,
            rpc_probe_timeout_ms: number("RPC_PROBE_TIMEOUT_MS", 3000)?,
            confirmation_timeout_secs: number("CONFIRMATION_TIMEOUT_SECS", 180)?,
            receipt_poll_ms: number("RECEIPT_POLL_MS", 2000)?,
            report_json: parse_flag(get("REPORT_JSON").as_deref()),
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            probe_timeout: Duration::from_millis(self.rpc_probe_timeout_ms),
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            receipt_poll_interval: Duration::from_millis(self.receipt_poll_ms),
            default_gas_limit: U256::from(self.default_gas_limit),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            dry_run: self.dry_run,
            stagger: Duration::from_millis(self.stagger_ms),
        }
    }

    /// Raw key material, only for building signers.
    pub fn private_key_strings(&self) -> impl Iterator<Item = &str> {
        self.private_keys.iter().map(|k| k.expose_secret().as_str())
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let mut vars: HashMap<String, String> = HashMap::from([
            ("RPC_URLS".to_string(), "https://rpc.one.example, https://rpc.two.example".to_string()),
            ("PRIVATE_KEYS".to_string(), KEY.to_string()),
            (
                "CONTRACT_ADDRESS".to_string(),
                "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            ),
        ]);
        for (k, v) in pairs {
            vars.insert(k.to_string(), v.to_string());
        }
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let c = config(&[]).unwrap();
        assert_eq!(c.endpoint.urls().len(), 2);
        assert_eq!(c.quantity, 1);
        assert_eq!(c.value, None);
        assert!(!c.dry_run);
        assert_eq!(c.stagger_ms, 150);
        assert_eq!(c.client_settings().default_gas_limit, U256::from(300_000u64));
        assert_eq!(c.engine_settings().stagger, Duration::from_millis(150));
    }

    #[test]
    fn wei_wins_over_ether() {
        let c = config(&[("VALUE_WEI", "42"), ("VALUE_ETH", "1")]).unwrap();
        assert_eq!(c.value, Some(U256::from(42)));

        let c = config(&[("VALUE_ETH", "0.002")]).unwrap();
        assert_eq!(c.value, Some(U256::from(2_000_000_000_000_000u64)));
    }

    #[test]
    fn lists_and_flags_are_parsed() {
        let c = config(&[
            ("MINT_FUNCTIONS", "publicMint, ,claim"),
            ("PRIVATE_KEYS", format!("{},{}", KEY, KEY).as_str()),
            ("DRY_RUN", "TRUE"),
            ("QUANTITY", "0"),
        ])
        .unwrap();
        assert_eq!(c.mint_functions, vec!["publicMint", "claim"]);
        assert_eq!(c.private_key_strings().count(), 2);
        assert!(c.dry_run);
        assert_eq!(c.quantity, 1);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config(&[("CONTRACT_ADDRESS", "0x1234")]).is_err());
        assert!(config(&[("RPC_URLS", "not a url")]).is_err());
        assert!(config(&[("STAGGER_MS", "soon")]).is_err());
        assert!(config(&[("VALUE_WEI", "1.5")]).is_err());
    }
}
