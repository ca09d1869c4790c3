// src/mint/matcher.rs

use ethers::abi::{Function, ParamType};

use crate::blockchain::interface::InterfaceDescriptor;
use crate::mint::{
    calldata,
    models::{ArgumentShape, CallCandidate, Mutability},
};

/// A descriptor entry mapped onto a calling convention.
#[derive(Debug, Clone)]
pub struct InterfaceMatch {
    pub candidate: CallCandidate,
    pub function: Function,
}

/// Maps the first function declared as `name` to its argument shape.
/// Pure: reasons over the descriptor only, never touches the network.
pub fn match_function(descriptor: &InterfaceDescriptor, name: &str) -> Option<InterfaceMatch> {
    let function = descriptor.function(name)?;
    let kinds: Vec<&ParamType> = function.inputs.iter().map(|p| &p.kind).collect();

    Some(InterfaceMatch {
        candidate: CallCandidate {
            function_name: function.name.clone(),
            signature: Some(calldata::canonical_signature(function)),
            argument_shape: shape_for_params(&kinds),
            mutability: Mutability::from(function.state_mutability),
        },
        function: function.clone(),
    })
}

pub fn shape_for_params(params: &[&ParamType]) -> ArgumentShape {
    match params {
        [] => ArgumentShape::NoArg,
        [ParamType::Uint(_)] => ArgumentShape::Quantity,
        [ParamType::Address, ParamType::Uint(_)] => ArgumentShape::ToThenQuantity,
        [ParamType::Uint(_), ParamType::Address] => ArgumentShape::QuantityThenTo,
        _ => ArgumentShape::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(functions: &str) -> InterfaceDescriptor {
        InterfaceDescriptor::from_json(functions).unwrap()
    }

    fn entry(name: &str, types: &[&str]) -> String {
        let inputs: Vec<String> = types
            .iter()
            .enumerate()
            .map(|(i, t)| format!(r#"{{"name":"a{}","type":"{}"}}"#, i, t))
            .collect();
        format!(
            r#"{{"type":"function","name":"{}","inputs":[{}],"outputs":[],"stateMutability":"payable"}}"#,
            name,
            inputs.join(",")
        )
    }

    fn shape_of(types: &[&str]) -> ArgumentShape {
        let d = descriptor(&format!("[{}]", entry("mint", types)));
        match_function(&d, "mint").unwrap().candidate.argument_shape
    }

    #[test]
    fn documented_shapes_are_recognised() {
        assert_eq!(shape_of(&[]), ArgumentShape::NoArg);
        assert_eq!(shape_of(&["uint256"]), ArgumentShape::Quantity);
        assert_eq!(shape_of(&["uint32"]), ArgumentShape::Quantity);
        assert_eq!(shape_of(&["address", "uint256"]), ArgumentShape::ToThenQuantity);
        assert_eq!(shape_of(&["uint64", "address"]), ArgumentShape::QuantityThenTo);
    }

    #[test]
    fn everything_else_is_unknown() {
        assert_eq!(shape_of(&["address"]), ArgumentShape::Unknown);
        assert_eq!(shape_of(&["int256"]), ArgumentShape::Unknown);
        assert_eq!(shape_of(&["uint256", "uint256"]), ArgumentShape::Unknown);
        assert_eq!(shape_of(&["address", "address"]), ArgumentShape::Unknown);
        assert_eq!(shape_of(&["uint256", "bytes32[]"]), ArgumentShape::Unknown);
        assert_eq!(
            shape_of(&["address", "uint256", "bytes32[]"]),
            ArgumentShape::Unknown
        );
    }

    #[test]
    fn claim_with_address_and_quantity_is_to_then_quantity() {
        let d = descriptor(&format!("[{}]", entry("claim", &["address", "uint256"])));
        let m = match_function(&d, "claim").unwrap();
        assert_eq!(m.candidate.argument_shape, ArgumentShape::ToThenQuantity);
        assert_eq!(m.candidate.signature.as_deref(), Some("claim(address,uint256)"));
        assert_eq!(m.candidate.mutability, Mutability::Payable);
    }

    #[test]
    fn first_overload_wins() {
        let d = descriptor(&format!(
            "[{},{}]",
            entry("mint", &["uint256"]),
            entry("mint", &[])
        ));
        let m = match_function(&d, "mint").unwrap();
        assert_eq!(m.candidate.argument_shape, ArgumentShape::Quantity);
    }

    #[test]
    fn missing_name_yields_none() {
        let d = descriptor(&format!("[{}]", entry("mint", &[])));
        assert!(match_function(&d, "Mint").is_none());
    }
}
