//! Chain access seam for the mint engine.
//!
//! The engine never talks to a node directly; it goes through [`ChainRpc`],
//! which covers the read-only call primitive, fee and gas queries, and
//! broadcast plus confirmation. [`super::evm_client::JsonRpcChain`] is the
//! JSON-RPC implementation used by the binary.

use async_trait::async_trait;
use ethers::{
    signers::LocalWallet,
    types::{Bytes, TxHash, U256},
};

use crate::blockchain::models::{
    CallFailure, CallRequest, FeeData, MintReceipt, MintTransaction, RpcError,
};

pub use super::evm_client::JsonRpcChain;

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Executes `request` against the latest state without mutating it.
    ///
    /// A rejection (revert, invalid opcode, missing function) is reported as a
    /// [`CallFailure`] carrying the raw revert payload when one exists.
    async fn call(&self, request: &CallRequest) -> Result<Bytes, CallFailure>;

    /// Estimates the gas the exact call would consume.
    async fn estimate_gas(&self, request: &CallRequest) -> Result<U256, CallFailure>;

    /// Current network fee data.
    async fn fee_data(&self) -> Result<FeeData, RpcError>;

    /// Signs `tx` with `signer` and submits it. Returns the transaction hash.
    async fn broadcast(&self, signer: &LocalWallet, tx: &MintTransaction)
        -> Result<TxHash, RpcError>;

    /// Waits for one inclusion receipt of `hash`.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<MintReceipt, RpcError>;
}
