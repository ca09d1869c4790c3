// src/mint/mod.rs

pub mod calldata;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod fees;
pub mod matcher;
pub mod models;
pub mod price;
pub mod prober;
pub mod signatures;
pub mod strategy;

pub use engine::{BatchReport, EngineSettings, MintEngine, WalletReport};
pub use errors::MintError;
pub use models::{ArgumentShape, CallCandidate, MintOutcome, MintRequest, WalletContext};
