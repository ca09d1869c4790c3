// src/blockchain/mod.rs

pub mod client;
pub use client::{ChainRpc, JsonRpcChain};

pub mod evm_client;
pub mod interface;
pub mod models;
pub mod nonce_manager;

pub use ethers::types::{Address, Bytes, TxHash, U256};
