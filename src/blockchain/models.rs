// src/blockchain/models.rs
use ethers::types::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

// --- Error types for chain operations ---

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Bytes>,
    },
    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),
    #[error("failed to sign transaction: {0}")]
    Signing(String),
    #[error("no reachable endpoint among {0} configured URL(s)")]
    NoReachableEndpoint(usize),
    #[error("transaction {0:?} not confirmed within {1}s")]
    ConfirmationTimeout(TxHash, u64),
}

/// Structured failure of a read-only call or a gas estimate.
///
/// `data` carries the raw revert payload when the node returned one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CallFailure {
    pub message: String,
    pub data: Option<Bytes>,
}

impl CallFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            message: message.into(),
            data: Some(data.into()),
        }
    }
}

impl From<RpcError> for CallFailure {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Rpc { message, data, .. } => CallFailure { message, data },
            other => CallFailure::new(other.to_string()),
        }
    }
}

// --- Endpoint Models ---

/// Ordered list of RPC URLs for one logical network.
///
/// The first reachable entry is preferred, so the order given at construction
/// is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    urls: Vec<Url>,
}

impl ChainEndpoint {
    pub fn new(urls: Vec<Url>) -> Self {
        Self { urls }
    }

    /// Parses a comma-separated list, skipping blanks.
    pub fn parse_list(raw: &str) -> Result<Self, url::ParseError> {
        let urls = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Url::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { urls })
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

// --- Call & Transaction Models ---

/// Parameters of a read-only call, gas estimate or the body of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

/// Network fee data as reported by the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeData {
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeePricing {
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
    /// A missing price is filled in by the client at broadcast time.
    Legacy { gas_price: Option<U256> },
}

/// Per-attempt transaction overrides. Built fresh for every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionOverrides {
    pub value: U256,
    pub gas_limit: Option<U256>,
    pub pricing: FeePricing,
}

/// A fully prepared state-changing call ready to be signed and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintTransaction {
    pub call: CallRequest,
    pub overrides: TransactionOverrides,
}

/// Inclusion receipt reduced to what the mint flow reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub status: u64,
    pub block_number: u64,
}

impl MintReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}
