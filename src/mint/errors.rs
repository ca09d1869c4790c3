// src/mint/errors.rs

use ethers::abi::{self, ParamType, Token};
use ethers::types::Address;
use serde::{ser::SerializeStruct, Serialize, Serializer};
use thiserror::Error;

use crate::blockchain::models::{CallFailure, RpcError};

/// `Error(string)`
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// `Panic(uint256)`
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

#[derive(Error, Debug)]
pub enum MintError {
    #[error("no mint entry point accepted by {contract:?} (candidates: {names})")]
    NoCandidateFound { contract: Address, names: String },
    #[error("simulation of {signature} rejected: {reason}")]
    SimulationRejected { signature: String, reason: String },
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("{0}")]
    OnChainRevert(String),
    #[error("{0}")]
    ClassificationFallback(String),
    #[error("RPC failure: {0}")]
    Rpc(#[from] RpcError),
}

impl MintError {
    /// Classifies a rejected call into `OnChainRevert` when the payload
    /// decodes, `ClassificationFallback` otherwise.
    pub fn from_call_failure(failure: &CallFailure) -> Self {
        let message = classify_failure(&failure.message, failure.data.as_deref());
        match decode_revert(failure.data.as_deref()) {
            RevertKind::Undecodable => MintError::ClassificationFallback(message),
            _ => MintError::OnChainRevert(message),
        }
    }

    /// Broadcast or confirmation failure; node errors carrying revert data
    /// still get their reason decoded.
    pub fn submission(err: RpcError) -> Self {
        let message = match &err {
            RpcError::Rpc { message, data, .. } => classify_failure(message, data.as_deref()),
            other => other.to_string(),
        };
        MintError::SubmissionFailed(message)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MintError::NoCandidateFound { .. } => "no_candidate_found",
            MintError::SimulationRejected { .. } => "simulation_rejected",
            MintError::SubmissionFailed(_) => "submission_failed",
            MintError::OnChainRevert(_) => "on_chain_revert",
            MintError::ClassificationFallback(_) => "classification_fallback",
            MintError::Rpc(_) => "rpc",
        }
    }
}

impl Serialize for MintError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("MintError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

/// What a revert payload turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertKind {
    Reason(String),
    Panic,
    Custom([u8; 4]),
    Undecodable,
}

pub fn decode_revert(data: Option<&[u8]>) -> RevertKind {
    let data = match data {
        Some(d) if d.len() >= 4 => d,
        _ => return RevertKind::Undecodable,
    };

    let mut selector = [0u8; 4];
    selector.copy_from_slice(&data[..4]);

    if selector == ERROR_STRING_SELECTOR {
        return match abi::decode(&[ParamType::String], &data[4..]) {
            Ok(tokens) => match tokens.into_iter().next() {
                Some(Token::String(reason)) => RevertKind::Reason(reason),
                _ => RevertKind::Undecodable,
            },
            Err(_) => RevertKind::Undecodable,
        };
    }
    if selector == PANIC_SELECTOR {
        return RevertKind::Panic;
    }
    RevertKind::Custom(selector)
}

/// Turns a failed call into an operator-readable line. Never fails.
pub fn classify_failure(message: &str, data: Option<&[u8]>) -> String {
    match decode_revert(data) {
        RevertKind::Reason(reason) => format!("reverted: {}", reason),
        RevertKind::Panic => format!("reverted: panic ({})", message),
        RevertKind::Custom(selector) => {
            format!("{} (custom error 0x{})", message, hex::encode(selector))
        }
        RevertKind::Undecodable => message.to_string(),
    }
}
