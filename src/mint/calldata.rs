// src/mint/calldata.rs

use ethers::abi::{self, Function, Param, ParamType, StateMutability, Token};
use ethers::types::{Bytes, U256};
use ethers::utils::keccak256;

pub fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

/// Canonical `name(type,...)` form used for selectors and reporting.
pub fn canonical_signature(func: &Function) -> String {
    let types: Vec<String> = func
        .inputs
        .iter()
        .map(|p| param_type_to_string(&p.kind))
        .collect();
    format!("{}({})", func.name, types.join(","))
}

fn param_type_to_string(p: &ParamType) -> String {
    match p {
        ParamType::Address => "address".to_string(),
        ParamType::Bytes => "bytes".to_string(),
        ParamType::FixedBytes(n) => format!("bytes{}", n),
        ParamType::Int(n) => format!("int{}", n),
        ParamType::Uint(n) => format!("uint{}", n),
        ParamType::Bool => "bool".to_string(),
        ParamType::String => "string".to_string(),
        ParamType::Array(inner) => format!("{}[]", param_type_to_string(inner)),
        ParamType::FixedArray(inner, n) => format!("{}[{}]", param_type_to_string(inner), n),
        ParamType::Tuple(components) => {
            let inner: Vec<String> = components.iter().map(param_type_to_string).collect();
            format!("({})", inner.join(","))
        }
    }
}

/// Builds a function description from a name and its parameter types.
#[allow(deprecated)]
pub fn function(
    name: &str,
    inputs: Vec<ParamType>,
    outputs: Vec<ParamType>,
    state_mutability: StateMutability,
) -> Function {
    let params = |kinds: Vec<ParamType>| -> Vec<Param> {
        kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Param {
                name: format!("arg{}", i),
                kind,
                internal_type: None,
            })
            .collect()
    };

    Function {
        name: name.to_string(),
        inputs: params(inputs),
        outputs: params(outputs),
        constant: None,
        state_mutability,
    }
}

/// Selector followed by the ABI-encoded arguments. Fails locally when the
/// arguments do not type-check against the function's inputs.
pub fn encode_call(func: &Function, args: &[Token]) -> Result<Bytes, abi::Error> {
    let types: Vec<ParamType> = func.inputs.iter().map(|p| p.kind.clone()).collect();
    if !Token::types_check(args, &types) {
        return Err(abi::Error::InvalidData);
    }
    let mut out = selector(&canonical_signature(func)).to_vec();
    out.extend(abi::encode(args));
    Ok(Bytes::from(out))
}

/// Decodes call data produced for `func`, checking the selector first.
pub fn decode_call(func: &Function, data: &[u8]) -> Result<Vec<Token>, abi::Error> {
    if data.len() < 4 || data[..4] != selector(&canonical_signature(func)) {
        return Err(abi::Error::InvalidData);
    }
    let types: Vec<ParamType> = func.inputs.iter().map(|p| p.kind.clone()).collect();
    abi::decode(&types, &data[4..])
}

/// Reads a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Option<U256> {
    match abi::decode(&[ParamType::Uint(256)], data).ok()?.first() {
        Some(Token::Uint(n)) => Some(*n),
        _ => None,
    }
}
