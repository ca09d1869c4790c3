// src/mint/fees.rs

use ethers::types::U256;
use tracing::{info, warn};

use crate::blockchain::{
    client::ChainRpc,
    models::{CallRequest, FeeData, FeePricing, RpcError, TransactionOverrides},
};

/// Safety margin applied to gas estimates, in percent.
pub const GAS_MARGIN_PERCENT: u64 = 120;

/// `estimate * 120 / 100`, truncating.
pub fn pad_gas_limit(estimate: U256) -> U256 {
    estimate.saturating_mul(U256::from(GAS_MARGIN_PERCENT)) / U256::from(100u64)
}

/// EIP-1559 pricing when the node reports both caps, legacy otherwise.
pub fn pricing_from(fee: &FeeData) -> FeePricing {
    match (fee.max_fee_per_gas, fee.max_priority_fee_per_gas) {
        (Some(max_fee_per_gas), Some(max_priority_fee_per_gas)) => FeePricing::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        },
        _ => FeePricing::Legacy {
            gas_price: fee.gas_price,
        },
    }
}

/// Padded gas limit for the exact call, or `None` when the node refuses to
/// estimate. Some backends reject estimation for calls that would execute
/// fine, so the caller proceeds without a limit.
pub async fn estimate_gas_limit(rpc: &dyn ChainRpc, call: &CallRequest) -> Option<U256> {
    match rpc.estimate_gas(call).await {
        Ok(estimate) => {
            let limit = pad_gas_limit(estimate);
            info!("Gas estimate {} -> limit {}", estimate, limit);
            Some(limit)
        }
        Err(e) => {
            warn!("Gas estimation failed ({}); leaving gas limit to the client default", e);
            None
        }
    }
}

/// Fresh overrides for one submission of `call`.
pub async fn plan_overrides(rpc: &dyn ChainRpc, call: &CallRequest) -> Result<TransactionOverrides, RpcError> {
    let fee = rpc.fee_data().await?;
    let pricing = pricing_from(&fee);
    let gas_limit = estimate_gas_limit(rpc, call).await;

    Ok(TransactionOverrides {
        value: call.value,
        gas_limit,
        pricing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_limit_is_padded_by_twenty_percent_truncating() {
        assert_eq!(pad_gas_limit(U256::from(100_000u64)), U256::from(120_000u64));
        assert_eq!(pad_gas_limit(U256::from(21_001u64)), U256::from(25_201u64));
        assert_eq!(pad_gas_limit(U256::from(9u64)), U256::from(10u64));
    }

    #[test]
    fn eip1559_needs_both_caps() {
        let full = FeeData {
            gas_price: Some(U256::from(5)),
            max_fee_per_gas: Some(U256::from(30)),
            max_priority_fee_per_gas: Some(U256::from(2)),
        };
        assert_eq!(
            pricing_from(&full),
            FeePricing::Eip1559 {
                max_fee_per_gas: U256::from(30),
                max_priority_fee_per_gas: U256::from(2)
            }
        );

        let partial = FeeData {
            max_priority_fee_per_gas: None,
            ..full
        };
        assert_eq!(
            pricing_from(&partial),
            FeePricing::Legacy {
                gas_price: Some(U256::from(5))
            }
        );
    }
}
