// src/mint/executor.rs

use std::fmt;

use ethers::types::{Address, TxHash, U256};
use tracing::{debug, error, info, warn};

use crate::blockchain::{
    client::ChainRpc,
    models::{CallRequest, MintTransaction},
};
use crate::mint::{
    calldata,
    errors::{classify_failure, MintError},
    fees,
    models::{MintOutcome, ResolvedCall, WalletContext},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    CandidateSelected,
    DryRunDone,
    Submitted,
    Confirmed,
    Failed,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::DryRunDone | ExecutionState::Confirmed | ExecutionState::Failed
        )
    }

    pub fn can_transition(&self, next: ExecutionState) -> bool {
        use ExecutionState::*;
        match (self, next) {
            (CandidateSelected, DryRunDone) | (CandidateSelected, Submitted) => true,
            (Submitted, Confirmed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionState::CandidateSelected => "CANDIDATE_SELECTED",
            ExecutionState::DryRunDone => "DRY_RUN_DONE",
            ExecutionState::Submitted => "SUBMITTED",
            ExecutionState::Confirmed => "CONFIRMED",
            ExecutionState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Tracks one execution through its states.
struct Execution {
    state: ExecutionState,
}

impl Execution {
    fn start() -> Self {
        Self {
            state: ExecutionState::CandidateSelected,
        }
    }

    fn advance(&mut self, next: ExecutionState) {
        if self.state.can_transition(next) {
            debug!("{} -> {}", self.state, next);
        } else {
            warn!("Unexpected transition {} -> {}", self.state, next);
        }
        self.state = next;
    }

    fn fail(&mut self, err: MintError) -> MintError {
        self.advance(ExecutionState::Failed);
        error!("Mint failed: {}", err);
        err
    }
}

/// Performs the single execution attempt for a resolved call.
pub struct Executor<'a> {
    rpc: &'a dyn ChainRpc,
    dry_run: bool,
}

impl<'a> Executor<'a> {
    pub fn new(rpc: &'a dyn ChainRpc, dry_run: bool) -> Self {
        Self { rpc, dry_run }
    }

    pub async fn execute(
        &self,
        wallet: &WalletContext,
        contract: Address,
        call: &ResolvedCall,
        value: U256,
    ) -> Result<MintOutcome, MintError> {
        let mut execution = Execution::start();
        let signature = call
            .candidate
            .signature
            .clone()
            .unwrap_or_else(|| call.candidate.function_name.clone());

        let data = calldata::encode_call(&call.function, &call.arguments).map_err(|e| {
            execution.fail(MintError::ClassificationFallback(format!(
                "could not encode {}: {}",
                signature, e
            )))
        })?;
        let request = CallRequest {
            from: Some(wallet.address()),
            to: contract,
            data,
            value,
        };

        if self.dry_run {
            return match self.rpc.call(&request).await {
                Ok(_) => {
                    execution.advance(ExecutionState::DryRunDone);
                    info!("Dry run of {} with value {} succeeded", signature, value);
                    Ok(self.outcome(call, true, None, true, None))
                }
                Err(failure) => Err(execution.fail(MintError::from_call_failure(&failure))),
            };
        }

        if !call.verified_with(value) {
            debug!("Preflight simulation of {} with value {}", signature, value);
            if let Err(failure) = self.rpc.call(&request).await {
                return Err(execution.fail(MintError::SimulationRejected {
                    signature,
                    reason: classify_failure(&failure.message, failure.data.as_deref()),
                }));
            }
        }

        let overrides = fees::plan_overrides(self.rpc, &request)
            .await
            .map_err(|e| execution.fail(MintError::Rpc(e)))?;
        let tx = MintTransaction {
            call: request,
            overrides,
        };

        let hash = self
            .rpc
            .broadcast(wallet.signer(), &tx)
            .await
            .map_err(|e| execution.fail(MintError::submission(e)))?;
        execution.advance(ExecutionState::Submitted);
        info!("Submitted {} as {:?}", signature, hash);

        let receipt = self
            .rpc
            .wait_for_receipt(hash)
            .await
            .map_err(|e| execution.fail(MintError::submission(e)))?;
        execution.advance(ExecutionState::Confirmed);

        if receipt.succeeded() {
            info!("Confirmed {:?} in block {}", hash, receipt.block_number);
        } else {
            warn!("{:?} reverted on-chain in block {}", hash, receipt.block_number);
        }

        Ok(self.outcome(
            call,
            false,
            Some(hash),
            receipt.succeeded(),
            Some(receipt.block_number),
        ))
    }

    fn outcome(
        &self,
        call: &ResolvedCall,
        dry_run: bool,
        transaction_hash: Option<TxHash>,
        success: bool,
        block_number: Option<u64>,
    ) -> MintOutcome {
        MintOutcome {
            dry_run,
            transaction_hash,
            success,
            block_number,
            function_used: call.candidate.function_name.clone(),
            signature: call.candidate.signature.clone(),
            argument_shape: call.candidate.argument_shape,
        }
    }
}
