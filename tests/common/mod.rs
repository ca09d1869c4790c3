//! Scripted in-memory chain used by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::abi::{self, Token};
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, TxHash, U256};

use evm_mint_engine::blockchain::{
    client::ChainRpc,
    interface::InterfaceDescriptor,
    models::{CallFailure, CallRequest, FeeData, MintReceipt, MintTransaction, RpcError},
};
use evm_mint_engine::mint::{
    calldata,
    errors::ERROR_STRING_SELECTOR,
    models::{MintRequest, WalletContext},
};

pub const KEY_A: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const KEY_B: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub fn contract() -> Address {
    "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap()
}

pub fn wallet(key: &str) -> WalletContext {
    WalletContext::new(key.parse::<LocalWallet>().unwrap())
}

pub fn request(key: &str, quantity: u64) -> MintRequest {
    MintRequest::new(wallet(key), contract(), quantity)
}

pub fn descriptor(json: &str) -> Arc<InterfaceDescriptor> {
    Arc::new(InterfaceDescriptor::from_json(json).unwrap())
}

pub fn error_string(reason: &str) -> Bytes {
    let mut data = ERROR_STRING_SELECTOR.to_vec();
    data.extend(abi::encode(&[Token::String(reason.to_string())]));
    Bytes::from(data)
}

#[derive(Default)]
struct Recorded {
    calls: Vec<CallRequest>,
    estimates: Vec<CallRequest>,
    broadcasts: Vec<MintTransaction>,
    fee_queries: usize,
}

/// Accepts calls whose selector was registered, rejects everything else.
pub struct FakeChain {
    accepted: Vec<[u8; 4]>,
    views: HashMap<[u8; 4], U256>,
    blocked: Vec<Address>,
    rejection: CallFailure,
    fee: FeeData,
    fee_error: Option<String>,
    estimate: Option<U256>,
    receipt: MintReceipt,
    broadcast_error: Option<String>,
    recorded: Mutex<Recorded>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            accepted: Vec::new(),
            views: HashMap::new(),
            blocked: Vec::new(),
            rejection: CallFailure::new("execution reverted"),
            fee: FeeData {
                gas_price: Some(U256::from(1_000_000_000u64)),
                max_fee_per_gas: None,
                max_priority_fee_per_gas: None,
            },
            fee_error: None,
            estimate: Some(U256::from(100_000u64)),
            receipt: MintReceipt {
                status: 1,
                block_number: 100,
            },
            broadcast_error: None,
            recorded: Mutex::new(Recorded::default()),
        }
    }
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepting(mut self, signature: &str) -> Self {
        self.accepted.push(calldata::selector(signature));
        self
    }

    pub fn with_view(mut self, signature: &str, value: U256) -> Self {
        self.views.insert(calldata::selector(signature), value);
        self
    }

    pub fn blocking(mut self, sender: Address) -> Self {
        self.blocked.push(sender);
        self
    }

    pub fn rejecting_with(mut self, failure: CallFailure) -> Self {
        self.rejection = failure;
        self
    }

    pub fn with_fee(mut self, fee: FeeData) -> Self {
        self.fee = fee;
        self
    }

    pub fn failing_fee_data(mut self, message: &str) -> Self {
        self.fee_error = Some(message.to_string());
        self
    }

    pub fn with_estimate(mut self, estimate: Option<U256>) -> Self {
        self.estimate = estimate;
        self
    }

    pub fn with_receipt(mut self, status: u64, block_number: u64) -> Self {
        self.receipt = MintReceipt {
            status,
            block_number,
        };
        self
    }

    pub fn failing_broadcast(mut self, message: &str) -> Self {
        self.broadcast_error = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CallRequest> {
        self.recorded.lock().unwrap().calls.clone()
    }

    pub fn estimates(&self) -> Vec<CallRequest> {
        self.recorded.lock().unwrap().estimates.clone()
    }

    pub fn broadcasts(&self) -> Vec<MintTransaction> {
        self.recorded.lock().unwrap().broadcasts.clone()
    }

    pub fn fee_queries(&self) -> usize {
        self.recorded.lock().unwrap().fee_queries
    }

    /// Calls carrying exactly `signature`'s selector.
    pub fn calls_to(&self, signature: &str) -> Vec<CallRequest> {
        let sel = calldata::selector(signature);
        self.calls()
            .into_iter()
            .filter(|c| c.data.len() >= 4 && c.data[..4] == sel)
            .collect()
    }

    fn answer(&self, request: &CallRequest) -> Result<Bytes, CallFailure> {
        if request.from.map_or(false, |f| self.blocked.contains(&f)) {
            return Err(self.rejection.clone());
        }
        if request.data.len() < 4 {
            return Err(self.rejection.clone());
        }
        let mut sel = [0u8; 4];
        sel.copy_from_slice(&request.data[..4]);

        if let Some(v) = self.views.get(&sel) {
            return Ok(Bytes::from(abi::encode(&[Token::Uint(*v)])));
        }
        if self.accepted.contains(&sel) {
            return Ok(Bytes::new());
        }
        Err(self.rejection.clone())
    }
}

#[async_trait]
impl ChainRpc for FakeChain {
    async fn call(&self, request: &CallRequest) -> Result<Bytes, CallFailure> {
        self.recorded.lock().unwrap().calls.push(request.clone());
        self.answer(request)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<U256, CallFailure> {
        self.recorded.lock().unwrap().estimates.push(request.clone());
        self.answer(request)?;
        self.estimate
            .ok_or_else(|| CallFailure::new("gas required exceeds allowance"))
    }

    async fn fee_data(&self) -> Result<FeeData, RpcError> {
        self.recorded.lock().unwrap().fee_queries += 1;
        match &self.fee_error {
            Some(message) => Err(RpcError::Rpc {
                code: -32000,
                message: message.clone(),
                data: None,
            }),
            None => Ok(self.fee.clone()),
        }
    }

    async fn broadcast(&self, _signer: &LocalWallet, tx: &MintTransaction) -> Result<TxHash, RpcError> {
        if let Some(message) = &self.broadcast_error {
            return Err(RpcError::Rpc {
                code: -32000,
                message: message.clone(),
                data: None,
            });
        }
        let mut recorded = self.recorded.lock().unwrap();
        recorded.broadcasts.push(tx.clone());
        Ok(TxHash::from_low_u64_be(recorded.broadcasts.len() as u64))
    }

    async fn wait_for_receipt(&self, _hash: TxHash) -> Result<MintReceipt, RpcError> {
        Ok(self.receipt)
    }
}
