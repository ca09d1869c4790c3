// src/blockchain/evm_client.rs

use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, Eip1559TransactionRequest,
        TransactionRequest, TxHash, U256,
    },
};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::blockchain::{
    client::ChainRpc,
    models::{
        CallFailure, CallRequest, ChainEndpoint, FeeData, FeePricing, MintReceipt,
        MintTransaction, RpcError,
    },
    nonce_manager::NonceManager,
};

/// Priority fee used when the node does not support `eth_maxPriorityFeePerGas`.
const FALLBACK_PRIORITY_FEE_WEI: u64 = 1_000_000_000;

/// Tunables for [`JsonRpcChain`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub probe_timeout: Duration,
    pub confirmation_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub default_gas_limit: U256,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(3000),
            confirmation_timeout: Duration::from_secs(180),
            receipt_poll_interval: Duration::from_millis(2000),
            default_gas_limit: U256::from(300_000u64),
        }
    }
}

/// JSON-RPC client for one EVM network, bound to a single endpoint URL.
#[derive(Clone)]
pub struct JsonRpcChain {
    client: Client,
    rpc_url: String,
    chain_id: u64,
    settings: ClientSettings,
    nonce_manager: NonceManager,
}

impl JsonRpcChain {
    /// Connects to the first reachable URL of `endpoint`, in order.
    pub async fn connect(endpoint: &ChainEndpoint, settings: ClientSettings) -> Result<Self, RpcError> {
        let client = Client::new();

        for url in endpoint.urls() {
            let probe = tokio::time::timeout(
                settings.probe_timeout,
                rpc_request(&client, url.as_str(), "eth_chainId", json!([])),
            )
            .await;

            match probe {
                Ok(Ok(result)) => match parse_quantity(&result) {
                    Ok(id) => {
                        let chain_id = id.low_u64();
                        info!("Using RPC endpoint {} (chain {})", url, chain_id);
                        return Ok(Self::with_chain_id(client, url.as_str(), chain_id, settings));
                    }
                    Err(e) => warn!("RPC endpoint {} returned an unusable chain id: {}", url, e),
                },
                Ok(Err(e)) => warn!("RPC endpoint {} rejected probe: {}", url, e),
                Err(_) => warn!(
                    "RPC endpoint {} did not answer within {}ms",
                    url,
                    settings.probe_timeout.as_millis()
                ),
            }
        }

        Err(RpcError::NoReachableEndpoint(endpoint.urls().len()))
    }

    /// Builds a client for a known URL and chain id without probing.
    pub fn with_chain_id(client: Client, rpc_url: &str, chain_id: u64, settings: ClientSettings) -> Self {
        Self {
            client,
            rpc_url: rpc_url.to_string(),
            chain_id,
            settings,
            nonce_manager: NonceManager::new(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        rpc_request(&self.client, &self.rpc_url, method, params).await
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        let result = self.request("eth_gasPrice", json!([])).await?;
        parse_quantity(&result)
    }

    async fn transaction_count(&self, address: Address) -> Result<U256, RpcError> {
        let result = self
            .request(
                "eth_getTransactionCount",
                json!([format!("{:?}", address), "pending"]),
            )
            .await?;
        parse_quantity(&result)
    }

    async fn build_transaction(&self, from: Address, nonce: U256, tx: &MintTransaction) -> Result<TypedTransaction, RpcError> {
        let gas = tx.overrides.gas_limit.unwrap_or(self.settings.default_gas_limit);

        let typed: TypedTransaction = match &tx.overrides.pricing {
            FeePricing::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => Eip1559TransactionRequest::new()
                .from(from)
                .to(tx.call.to)
                .data(tx.call.data.clone())
                .value(tx.overrides.value)
                .gas(gas)
                .nonce(nonce)
                .chain_id(self.chain_id)
                .max_fee_per_gas(*max_fee_per_gas)
                .max_priority_fee_per_gas(*max_priority_fee_per_gas)
                .into(),
            FeePricing::Legacy { gas_price } => {
                let gas_price = match gas_price {
                    Some(price) => *price,
                    None => self.gas_price().await?,
                };
                TransactionRequest::new()
                    .from(from)
                    .to(tx.call.to)
                    .data(tx.call.data.clone())
                    .value(tx.overrides.value)
                    .gas(gas)
                    .nonce(nonce)
                    .chain_id(self.chain_id)
                    .gas_price(gas_price)
                    .into()
            }
        };

        Ok(typed)
    }

    async fn sign_and_send(&self, signer: &LocalWallet, typed: &TypedTransaction) -> Result<TxHash, RpcError> {
        let signature = signer
            .sign_transaction(typed)
            .await
            .map_err(|e| RpcError::Signing(e.to_string()))?;
        let raw_tx = typed.rlp_signed(&signature);

        let result = self
            .request(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(&raw_tx))]),
            )
            .await?;

        let hash = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse(format!("expected tx hash, got {}", result)))?;
        hash.parse::<TxHash>()
            .map_err(|e| RpcError::InvalidResponse(format!("bad tx hash {}: {}", hash, e)))
    }
}

#[async_trait]
impl ChainRpc for JsonRpcChain {
    async fn call(&self, request: &CallRequest) -> Result<Bytes, CallFailure> {
        let result = self
            .request("eth_call", json!([call_object(request), "latest"]))
            .await?;
        hex_bytes(&result).map_err(CallFailure::from)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<U256, CallFailure> {
        let result = self
            .request("eth_estimateGas", json!([call_object(request)]))
            .await?;
        parse_quantity(&result).map_err(CallFailure::from)
    }

    async fn fee_data(&self) -> Result<FeeData, RpcError> {
        let gas_price = self.gas_price().await.ok();

        let block = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let base_fee = match block.get("baseFeePerGas") {
            Some(v) if !v.is_null() => Some(parse_quantity(v)?),
            _ => None,
        };

        let (max_fee_per_gas, max_priority_fee_per_gas) = match base_fee {
            Some(base_fee) => {
                let priority = match self.request("eth_maxPriorityFeePerGas", json!([])).await {
                    Ok(v) => parse_quantity(&v)?,
                    Err(e) => {
                        debug!("eth_maxPriorityFeePerGas unavailable ({}), using 1 gwei", e);
                        U256::from(FALLBACK_PRIORITY_FEE_WEI)
                    }
                };
                (
                    Some(base_fee.saturating_mul(U256::from(2u64)).saturating_add(priority)),
                    Some(priority),
                )
            }
            None => (None, None),
        };

        Ok(FeeData {
            gas_price,
            max_fee_per_gas,
            max_priority_fee_per_gas,
        })
    }

    async fn broadcast(&self, signer: &LocalWallet, tx: &MintTransaction) -> Result<TxHash, RpcError> {
        let from = signer.address();
        let nonce = self
            .nonce_manager
            .next_nonce(from, || self.transaction_count(from))
            .await?;

        let signer = signer.clone().with_chain_id(self.chain_id);
        let sent = match self.build_transaction(from, nonce, tx).await {
            Ok(typed) => self.sign_and_send(&signer, &typed).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(hash) => {
                info!("Submitted transaction {:?} (nonce {})", hash, nonce);
                Ok(hash)
            }
            Err(e) => {
                self.nonce_manager.release(from).await;
                Err(e)
            }
        }
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<MintReceipt, RpcError> {
        let timeout = self.settings.confirmation_timeout;
        let start = tokio::time::Instant::now();

        loop {
            let receipt = self
                .request("eth_getTransactionReceipt", json!([format!("{:?}", hash)]))
                .await?;

            if !receipt.is_null() {
                let status = parse_quantity(&receipt["status"])?.low_u64();
                let block_number = parse_quantity(&receipt["blockNumber"])?.low_u64();
                return Ok(MintReceipt {
                    status,
                    block_number,
                });
            }

            if start.elapsed() >= timeout {
                return Err(RpcError::ConfirmationTimeout(hash, timeout.as_secs()));
            }
            tokio::time::sleep(self.settings.receipt_poll_interval).await;
        }
    }
}

/// Posts one JSON-RPC request and returns its `result`, turning an `error`
/// object into [`RpcError::Rpc`] with the revert payload attached.
async fn rpc_request(client: &Client, rpc_url: &str, method: &str, params: Value) -> Result<Value, RpcError> {
    let payload = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });

    let response: Value = client
        .post(rpc_url)
        .json(&payload)
        .send()
        .await?
        .json()
        .await?;

    if let Some(error) = response.get("error") {
        return Err(RpcError::Rpc {
            code: error["code"].as_i64().unwrap_or_default(),
            message: error["message"].as_str().unwrap_or("unknown RPC error").to_string(),
            data: revert_data(&error["data"]),
        });
    }

    response
        .get("result")
        .cloned()
        .ok_or_else(|| RpcError::InvalidResponse(format!("{} response missing 'result': {}", method, response)))
}

fn call_object(request: &CallRequest) -> Value {
    let mut obj = json!({
        "to": format!("{:?}", request.to),
        "data": format!("0x{}", hex::encode(&request.data)),
        "value": format!("0x{:x}", request.value),
    });
    if let Some(from) = request.from {
        obj["from"] = json!(format!("{:?}", from));
    }
    obj
}

// Nodes disagree on where revert bytes live: geth puts a hex string in
// `error.data`, some proxies nest it as `error.data.data`.
fn revert_data(data: &Value) -> Option<Bytes> {
    match data {
        Value::String(s) => decode_hex(s).map(Bytes::from),
        Value::Object(obj) => obj.get("data").and_then(revert_data),
        _ => None,
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).ok()
}

fn hex_bytes(v: &Value) -> Result<Bytes, RpcError> {
    v.as_str()
        .and_then(decode_hex)
        .map(Bytes::from)
        .ok_or_else(|| RpcError::InvalidResponse(format!("expected hex data, got {}", v)))
}

fn parse_quantity(v: &Value) -> Result<U256, RpcError> {
    let s = v
        .as_str()
        .ok_or_else(|| RpcError::InvalidResponse(format!("expected hex quantity, got {}", v)))?;
    U256::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::InvalidResponse(format!("bad quantity {}: {}", s, e)))
}
