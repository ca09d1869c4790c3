// src/blockchain/nonce_manager.rs

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use ethers::types::{Address, U256};
use tokio::sync::Mutex;

use crate::blockchain::models::RpcError;

// Hands out sequential nonces per sender so two submissions from the same
// wallet never race for the same slot.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // Each address gets its own state, protected by a Mutex.
    nonces: Arc<DashMap<Address, Arc<Mutex<NonceState>>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<U256>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next nonce for `address`, calling `fetch` for the on-chain
    /// transaction count only when nothing is cached yet.
    pub async fn next_nonce<F, Fut>(&self, address: Address, fetch: F) -> Result<U256, RpcError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<U256, RpcError>>,
    {
        let address_lock = self
            .nonces
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone();

        let mut state = address_lock.lock().await;

        let nonce_to_use = match state.next_nonce {
            Some(nonce) => nonce,
            None => fetch().await?,
        };

        state.next_nonce = Some(nonce_to_use + U256::one());
        Ok(nonce_to_use)
    }

    /// Forgets the cached nonce so the next submission re-reads it from chain.
    /// Called after a broadcast failure, when the reserved slot was not used.
    pub async fn release(&self, address: Address) {
        let lock = self.nonces.get(&address).map(|entry| entry.value().clone());
        if let Some(lock) = lock {
            lock.lock().await.next_nonce = None;
        }
    }
}
