//! Candidate signature generation.
//!
//! Output order decides which signature wins during probing, so everything
//! here works on ordered `Vec`s with first-seen de-duplication.

use ethers::abi::{Function, StateMutability};

use crate::mint::{calldata, models::ArgumentShape};

/// Names tried when a request supplies none and no interface is known.
pub const DEFAULT_CANDIDATE_NAMES: [&str; 7] = [
    "mint",
    "publicMint",
    "mintPublic",
    "safeMint",
    "claim",
    "mintTo",
    "mintNFT",
];

/// Alternate entry-point names probed after the base name.
pub const COMMON_MINT_NAMES: [&str; 11] = [
    "mint",
    "publicMint",
    "safeMint",
    "mintPublic",
    "mintNFT",
    "purchase",
    "buy",
    "claim",
    "whitelistMint",
    "allowlistMint",
    "mintTo",
];

/// One generated signature: a payable function of `name` with `shape`.
#[derive(Debug, Clone)]
pub struct SignatureCandidate {
    pub name: String,
    pub shape: ArgumentShape,
    pub function: Function,
}

impl SignatureCandidate {
    pub fn new(name: &str, shape: ArgumentShape, uint_bits: usize) -> Option<Self> {
        let inputs = shape.param_types(uint_bits)?;
        Some(Self {
            name: name.to_string(),
            shape,
            function: calldata::function(name, inputs, vec![], StateMutability::Payable),
        })
    }

    pub fn signature(&self) -> String {
        calldata::canonical_signature(&self.function)
    }
}

/// Every shape for `name` with a `uint256` quantity, in probing order.
pub fn signatures_for(name: &str) -> Vec<SignatureCandidate> {
    ArgumentShape::PROBE_ORDER
        .iter()
        .filter_map(|shape| SignatureCandidate::new(name, *shape, 256))
        .collect()
}

/// Base-name variants first, then the alternate catalogue.
pub fn generate_signatures(base_name: &str) -> Vec<SignatureCandidate> {
    let names = dedup_names(
        std::iter::once(base_name).chain(COMMON_MINT_NAMES.iter().copied()),
    );

    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for name in &names {
        for candidate in signatures_for(name) {
            let sig = candidate.signature();
            if !seen.contains(&sig) {
                seen.push(sig);
                out.push(candidate);
            }
        }
    }
    out
}

/// Trims, drops blanks and removes repeats while keeping first-seen order.
pub fn dedup_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}
