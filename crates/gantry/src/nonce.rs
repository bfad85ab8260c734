//! Per-credential nonce serialization.

use alloy_primitives::Address;
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes nonce assignment per (deployer, network) pair.
///
/// Two deployments sharing both a credential and a network must not observe
/// the same transaction count; the guard is held from the nonce fetch through
/// the broadcast. Deployments for different credentials or networks proceed
/// fully in parallel.
#[derive(Debug, Default)]
pub struct NonceLocks {
    locks: Mutex<HashMap<(Address, String), Arc<AsyncMutex<()>>>>,
}

impl NonceLocks {
    /// Acquires the lock for `deployer` on `network`, creating it on first
    /// use.
    pub async fn acquire(&self, deployer: Address, network: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(
            self.locks.lock().entry((deployer, network.to_string())).or_default(),
        );
        lock.lock_owned().await
    }
}
