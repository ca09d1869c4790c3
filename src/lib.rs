// src/lib.rs

// Re-export commonly used types
pub use ethers::types::{Address, U256};

pub mod blockchain;
pub mod config;
pub mod mint;

pub use blockchain::{ChainRpc, JsonRpcChain};
pub use config::Config;
pub use mint::{MintEngine, MintError, MintOutcome, MintRequest, WalletContext};
