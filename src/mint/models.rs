// src/mint/models.rs

use std::fmt;
use std::sync::Arc;

use ethers::{
    abi::{Function, ParamType, StateMutability, Token},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TxHash, U256},
};
use serde::{Deserialize, Serialize};

use crate::blockchain::interface::InterfaceDescriptor;

// --- Argument shapes ---

/// Position of the merkle proof in an allow-list mint signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerkleLayout {
    QuantityProof,
    ProofQuantity,
    ToQuantityProof,
}

/// Ordered tuple-type pattern a mint entry point accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentShape {
    NoArg,
    Quantity,
    ToThenQuantity,
    QuantityThenTo,
    Merkle(MerkleLayout),
    Unknown,
}

impl ArgumentShape {
    /// Every concrete shape, in probing priority order.
    pub const PROBE_ORDER: [ArgumentShape; 7] = [
        ArgumentShape::NoArg,
        ArgumentShape::Quantity,
        ArgumentShape::ToThenQuantity,
        ArgumentShape::QuantityThenTo,
        ArgumentShape::Merkle(MerkleLayout::QuantityProof),
        ArgumentShape::Merkle(MerkleLayout::ProofQuantity),
        ArgumentShape::Merkle(MerkleLayout::ToQuantityProof),
    ];

    /// Parameter types of this shape with a `uint<bits>` quantity.
    pub fn param_types(&self, uint_bits: usize) -> Option<Vec<ParamType>> {
        let qty = ParamType::Uint(uint_bits);
        let proof = ParamType::Array(Box::new(ParamType::FixedBytes(32)));
        let types = match self {
            ArgumentShape::NoArg => vec![],
            ArgumentShape::Quantity => vec![qty],
            ArgumentShape::ToThenQuantity => vec![ParamType::Address, qty],
            ArgumentShape::QuantityThenTo => vec![qty, ParamType::Address],
            ArgumentShape::Merkle(MerkleLayout::QuantityProof) => vec![qty, proof],
            ArgumentShape::Merkle(MerkleLayout::ProofQuantity) => vec![proof, qty],
            ArgumentShape::Merkle(MerkleLayout::ToQuantityProof) => {
                vec![ParamType::Address, qty, proof]
            }
            ArgumentShape::Unknown => return None,
        };
        Some(types)
    }

    /// Argument values for this shape. Merkle shapes get an empty proof,
    /// which is what public-phase allow-list contracts accept.
    pub fn arguments(&self, wallet: Address, quantity: U256) -> Option<Vec<Token>> {
        let qty = Token::Uint(quantity);
        let to = Token::Address(wallet);
        let proof = Token::Array(vec![]);
        let args = match self {
            ArgumentShape::NoArg => vec![],
            ArgumentShape::Quantity => vec![qty],
            ArgumentShape::ToThenQuantity => vec![to, qty],
            ArgumentShape::QuantityThenTo => vec![qty, to],
            ArgumentShape::Merkle(MerkleLayout::QuantityProof) => vec![qty, proof],
            ArgumentShape::Merkle(MerkleLayout::ProofQuantity) => vec![proof, qty],
            ArgumentShape::Merkle(MerkleLayout::ToQuantityProof) => vec![to, qty, proof],
            ArgumentShape::Unknown => return None,
        };
        Some(args)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ArgumentShape::Unknown)
    }
}

impl fmt::Display for ArgumentShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArgumentShape::NoArg => "noarg",
            ArgumentShape::Quantity => "qty",
            ArgumentShape::ToThenQuantity => "to_qty",
            ArgumentShape::QuantityThenTo => "qty_to",
            ArgumentShape::Merkle(MerkleLayout::QuantityProof) => "qty_proof",
            ArgumentShape::Merkle(MerkleLayout::ProofQuantity) => "proof_qty",
            ArgumentShape::Merkle(MerkleLayout::ToQuantityProof) => "to_qty_proof",
            ArgumentShape::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl Mutability {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Mutability::Pure | Mutability::View)
    }
}

impl From<StateMutability> for Mutability {
    fn from(m: StateMutability) -> Self {
        match m {
            StateMutability::Pure => Mutability::Pure,
            StateMutability::View => Mutability::View,
            StateMutability::NonPayable => Mutability::NonPayable,
            StateMutability::Payable => Mutability::Payable,
        }
    }
}

// --- Candidates ---

/// A plausible calling convention for a mint entry point. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCandidate {
    pub function_name: String,
    pub signature: Option<String>,
    pub argument_shape: ArgumentShape,
    pub mutability: Mutability,
}

/// A candidate bound to concrete arguments and encoded call data.
#[derive(Debug, Clone)]
pub struct ResolvedCall {
    pub candidate: CallCandidate,
    pub function: Function,
    pub arguments: Vec<Token>,
    pub calldata: Bytes,
    /// Payment value the call was last simulated with, if it was simulated.
    pub simulated_value: Option<U256>,
    /// Name of the resolution strategy that produced this call.
    pub strategy: &'static str,
}

impl ResolvedCall {
    pub fn verified_with(&self, value: U256) -> bool {
        self.simulated_value == Some(value)
    }
}

// --- Requests ---

/// Signing identity of one wallet taking part in a mint.
#[derive(Debug, Clone)]
pub struct WalletContext {
    signer: LocalWallet,
}

impl WalletContext {
    pub fn new(signer: LocalWallet) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &LocalWallet {
        &self.signer
    }
}

/// One wallet's mint against one contract. Created per invocation.
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub wallet: WalletContext,
    pub contract: Address,
    quantity: u64,
    pub explicit_value: Option<U256>,
    pub candidate_names: Vec<String>,
    pub interface_override: Option<Arc<InterfaceDescriptor>>,
}

impl MintRequest {
    /// A quantity of 0 is normalised to 1, for price computation and call
    /// arguments alike.
    pub fn new(wallet: WalletContext, contract: Address, quantity: u64) -> Self {
        Self {
            wallet,
            contract,
            quantity: normalize_quantity(quantity),
            explicit_value: None,
            candidate_names: Vec::new(),
            interface_override: None,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.explicit_value = Some(value);
        self
    }

    pub fn with_candidate_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidate_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interface(mut self, descriptor: Arc<InterfaceDescriptor>) -> Self {
        self.interface_override = Some(descriptor);
        self
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn quantity_u256(&self) -> U256 {
        U256::from(self.quantity)
    }

    pub fn interface(&self) -> Option<&InterfaceDescriptor> {
        self.interface_override.as_deref()
    }
}

pub fn normalize_quantity(quantity: u64) -> u64 {
    quantity.max(1)
}

// --- Outcomes ---

/// Terminal result of one executed or simulated mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintOutcome {
    pub dry_run: bool,
    pub transaction_hash: Option<TxHash>,
    pub success: bool,
    pub block_number: Option<u64>,
    pub function_used: String,
    pub signature: Option<String>,
    pub argument_shape: ArgumentShape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_is_normalised_to_one() {
        let wallet = WalletContext::new(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse::<LocalWallet>()
                .unwrap(),
        );
        let request = MintRequest::new(wallet, Address::zero(), 0);
        assert_eq!(request.quantity(), 1);
        assert_eq!(request.quantity_u256(), U256::one());
    }

    #[test]
    fn shapes_and_arguments_agree() {
        let wallet = Address::repeat_byte(0x42);
        for shape in ArgumentShape::PROBE_ORDER {
            let types = shape.param_types(256).unwrap();
            let args = shape.arguments(wallet, U256::from(2)).unwrap();
            assert!(Token::types_check(&args, &types), "shape {}", shape);
        }
        assert!(ArgumentShape::Unknown.arguments(wallet, U256::one()).is_none());
    }

    #[test]
    fn shape_labels_are_stable() {
        assert_eq!(ArgumentShape::ToThenQuantity.to_string(), "to_qty");
        assert_eq!(
            ArgumentShape::Merkle(MerkleLayout::ProofQuantity).to_string(),
            "proof_qty"
        );
    }
}
