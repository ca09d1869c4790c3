//! Interface descriptors: where a contract's function list comes from.
//!
//! A descriptor can be loaded from an ABI file override or fetched from a
//! block explorer. Both are optional; the mint engine works without one.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ethers::abi::{Abi, Function};
use ethers::types::{Address, Chain};
use ethers_etherscan::Client as EtherscanClient;
use serde_json::Value;
use tracing::{info, warn};

use crate::mint::models::Mutability;

/// Read-only list of a contract's functions, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDescriptor {
    functions: Vec<Function>,
}

impl InterfaceDescriptor {
    /// Parses a standard JSON ABI array.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<Value> = serde_json::from_str(json).context("ABI must be a JSON array")?;
        let abi: Abi = serde_json::from_value(Value::Array(raw.clone())).context("Invalid ABI JSON")?;

        // `Abi` groups overloads by name in a sorted map; walk the raw entries
        // to recover declaration order.
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut functions = Vec::new();
        for entry in &raw {
            if entry.get("type").and_then(Value::as_str) != Some("function") {
                continue;
            }
            let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
            let idx = seen.entry(name).or_insert(0);
            if let Some(f) = abi.functions.get(name).and_then(|fs| fs.get(*idx)) {
                functions.push(f.clone());
            }
            *idx += 1;
        }

        Ok(Self { functions })
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// First function declared with exactly `name`.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Every overload declared with `name`, in declaration order.
    pub fn overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Function> + 'a {
        self.functions.iter().filter(move |f| f.name == name)
    }

    /// Names of state-changing functions that look like mint entry points.
    ///
    /// A function qualifies when its name contains `mint` or `claim`, or when
    /// it is payable. If nothing qualifies every state-changing function is
    /// returned.
    pub fn mint_candidate_names(&self) -> Vec<String> {
        let writes: Vec<&Function> = self
            .functions
            .iter()
            .filter(|f| !Mutability::from(f.state_mutability).is_read_only())
            .collect();

        let mint_like: Vec<&Function> = writes
            .iter()
            .copied()
            .filter(|f| {
                let lower = f.name.to_lowercase();
                lower.contains("mint")
                    || lower.contains("claim")
                    || Mutability::from(f.state_mutability) == Mutability::Payable
            })
            .collect();

        let pool = if mint_like.is_empty() { writes } else { mint_like };
        crate::mint::signatures::dedup_names(pool.iter().map(|f| f.name.as_str()))
    }
}

/// Loads an ABI override file.
pub fn load_descriptor(path: &Path) -> Result<InterfaceDescriptor> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ABI file {}", path.display()))?;
    InterfaceDescriptor::from_json(&contents)
        .with_context(|| format!("Failed to parse ABI file {}", path.display()))
}

/// Looks the contract's verified ABI up on the chain's block explorer.
///
/// Any failure (unsupported chain, unverified contract, HTTP error) returns
/// `None` so the caller falls back to signature probing.
pub async fn fetch_from_explorer(
    chain_id: u64,
    address: Address,
    api_key: &str,
) -> Option<InterfaceDescriptor> {
    match explorer_abi(chain_id, address, api_key).await {
        Ok(descriptor) => {
            info!(
                "Fetched ABI for {:?} from explorer ({} functions)",
                address,
                descriptor.functions().len()
            );
            Some(descriptor)
        }
        Err(e) => {
            warn!("Explorer ABI lookup for {:?} failed: {}", address, e);
            None
        }
    }
}

// The raw ABI string is parsed here rather than through `contract_abi`, which
// returns an `Abi` whose name-keyed map has lost declaration order.
async fn explorer_abi(chain_id: u64, address: Address, api_key: &str) -> Result<InterfaceDescriptor> {
    let chain = Chain::try_from(chain_id).map_err(|_| anyhow!("unsupported chain id {}", chain_id))?;
    let client = EtherscanClient::new(chain, api_key)?;
    let metadata = client.contract_source_code(address).await?;
    let item = metadata
        .items
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("explorer returned no source entry for {:?}", address))?;
    InterfaceDescriptor::from_json(&item.abi)
}
