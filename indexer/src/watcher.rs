use async_trait::async_trait;
use metrics::gauge;
use std::collections::HashSet;
use swapledger_core::Result;
use tokio::sync::RwLock;
use tracing::debug;

/// Registers pools for future swap event delivery. Called exactly once per
/// newly created pool.
#[async_trait]
pub trait PoolWatcherRegistry: Send + Sync {
    async fn start_watching(&self, pool_address: &str) -> Result<()>;
}

/// In-process registry of watched pool addresses.
#[derive(Default)]
pub struct WatchedPools {
    pools: RwLock<HashSet<String>>,
}

impl WatchedPools {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn is_watched(&self, pool_address: &str) -> bool {
        self.pools.read().await.contains(pool_address)
    }
}

#[async_trait]
impl PoolWatcherRegistry for WatchedPools {
    async fn start_watching(&self, pool_address: &str) -> Result<()> {
        let mut pools = self.pools.write().await;
        if pools.insert(pool_address.to_string()) {
            gauge!("swapledger_watched_pools").set(pools.len() as f64);
            debug!(pool = pool_address, "Watching new pool");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn watching_registers_pool() {
        let watcher = WatchedPools::new();
        assert!(!watcher.is_watched("0xpool").await);

        watcher.start_watching("0xpool").await.unwrap();
        assert!(watcher.is_watched("0xpool").await);
    }

    #[tokio::test]
    async fn watching_twice_keeps_single_entry() {
        let watcher = WatchedPools::new();
        watcher.start_watching("0xpool").await.unwrap();
        watcher.start_watching("0xpool").await.unwrap();

        assert_eq!(watcher.pools.read().await.len(), 1);
    }
}
