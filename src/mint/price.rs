//! Best-effort mint price discovery.
//!
//! Contracts rarely agree on what their price getter is called, so a short
//! fixed list of zero-argument numeric accessors is probed in order.

use ethers::abi::{Function, ParamType, StateMutability};
use ethers::types::{Address, U256};
use tracing::{debug, info};

use crate::blockchain::{client::ChainRpc, interface::InterfaceDescriptor, models::CallRequest};
use crate::mint::{
    calldata,
    models::{MintRequest, Mutability},
};

pub const PRICE_ACCESSORS: [&str; 3] = ["price", "mintPrice", "cost"];

/// A zero-argument view function expected to return a `uint`.
#[derive(Debug, Clone)]
pub struct PriceAccessor {
    function: Function,
}

impl PriceAccessor {
    /// Accessors worth querying. With a descriptor, only names it declares
    /// as zero-argument read-only functions with a numeric first output;
    /// without one, every name is assumed queryable and a rejection rules it
    /// out.
    pub fn candidates(descriptor: Option<&InterfaceDescriptor>) -> Vec<PriceAccessor> {
        PRICE_ACCESSORS
            .iter()
            .filter_map(|name| match descriptor {
                Some(d) => d
                    .overloads(name)
                    .find(|f| Self::is_numeric_getter(f))
                    .map(|f| PriceAccessor { function: f.clone() }),
                None => Some(PriceAccessor {
                    function: calldata::function(
                        name,
                        vec![],
                        vec![ParamType::Uint(256)],
                        StateMutability::View,
                    ),
                }),
            })
            .collect()
    }

    fn is_numeric_getter(f: &Function) -> bool {
        f.inputs.is_empty()
            && Mutability::from(f.state_mutability).is_read_only()
            && matches!(f.outputs.first().map(|p| &p.kind), Some(ParamType::Uint(_)))
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Reads the accessor; `None` when it reverts, returns garbage or zero.
    pub async fn read(&self, rpc: &dyn ChainRpc, contract: Address, from: Address) -> Option<U256> {
        let data = calldata::encode_call(&self.function, &[]).ok()?;
        let request = CallRequest {
            from: Some(from),
            to: contract,
            data,
            value: U256::zero(),
        };

        match rpc.call(&request).await {
            Ok(raw) => calldata::decode_uint(&raw).filter(|p| !p.is_zero()),
            Err(e) => {
                debug!("{}() not readable: {}", self.name(), e);
                None
            }
        }
    }
}

/// First strictly positive per-unit price among the known accessors.
pub async fn discover_unit_price(
    rpc: &dyn ChainRpc,
    contract: Address,
    from: Address,
    descriptor: Option<&InterfaceDescriptor>,
) -> Option<U256> {
    for accessor in PriceAccessor::candidates(descriptor) {
        if let Some(price) = accessor.read(rpc, contract, from).await {
            info!("Discovered unit price {} wei via {}()", price, accessor.name());
            return Some(price);
        }
    }
    None
}

pub fn total_payment(unit_price: U256, quantity: u64) -> U256 {
    unit_price.saturating_mul(U256::from(quantity.max(1)))
}

/// Payment value for a request: the explicit value when given, otherwise the
/// discovered price times quantity, otherwise zero.
pub async fn resolve_payment(rpc: &dyn ChainRpc, request: &MintRequest) -> U256 {
    if let Some(value) = request.explicit_value {
        return value;
    }

    match discover_unit_price(rpc, request.contract, request.wallet.address(), request.interface()).await {
        Some(unit) => total_payment(unit, request.quantity()),
        None => {
            debug!("No price accessor answered; paying 0");
            U256::zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_scales_with_quantity_and_floors_at_one() {
        let unit = U256::from(2_000_000_000_000_000u64);
        assert_eq!(total_payment(unit, 3), U256::from(6_000_000_000_000_000u64));
        assert_eq!(total_payment(unit, 0), unit);
    }

    #[test]
    fn without_descriptor_all_accessors_are_tried_in_order() {
        let names: Vec<String> = PriceAccessor::candidates(None)
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["price", "mintPrice", "cost"]);
    }

    #[test]
    fn descriptor_filters_out_non_numeric_or_missing_getters() {
        let d = InterfaceDescriptor::from_json(
            r#"[
                {"type":"function","name":"price","inputs":[{"name":"id","type":"uint256"}],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
                {"type":"function","name":"cost","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
                {"type":"function","name":"mintPrice","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"}
            ]"#,
        )
        .unwrap();

        let names: Vec<String> = PriceAccessor::candidates(Some(&d))
            .iter()
            .map(|a| a.name().to_string())
            .collect();
        assert_eq!(names, vec!["cost"]);
    }
}
