use super::EntityStore;
use crate::model::{Checkpoint, Pool, Swap, Token, Wallet, WalletTokenDayData, WalletTokenProfit};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use swapledger_core::Result;

/// In-memory store backing the handler and pipeline tests. Same conflict
/// semantics as the Postgres store: wallets and swaps keep the first write,
/// everything else overwrites.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    pools: HashMap<String, Pool>,
    tokens: HashMap<String, Token>,
    wallets: HashMap<String, Wallet>,
    swaps: HashMap<String, Swap>,
    profits: HashMap<(String, String), WalletTokenProfit>,
    day_data: HashMap<(String, String, i64), WalletTokenDayData>,
    checkpoints: HashMap<String, Checkpoint>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityCounts {
    pub pools: usize,
    pub tokens: usize,
    pub wallets: usize,
    pub swaps: usize,
    pub profits: usize,
    pub day_data: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> EntityCounts {
        let inner = self.inner.lock().unwrap();
        EntityCounts {
            pools: inner.pools.len(),
            tokens: inner.tokens.len(),
            wallets: inner.wallets.len(),
            swaps: inner.swaps.len(),
            profits: inner.profits.len(),
            day_data: inner.day_data.len(),
        }
    }

    pub fn swap(&self, id: &str) -> Option<Swap> {
        self.inner.lock().unwrap().swaps.get(id).cloned()
    }

    pub fn profit(&self, wallet: &str, token: &str) -> Option<WalletTokenProfit> {
        self.inner
            .lock()
            .unwrap()
            .profits
            .get(&(wallet.to_string(), token.to_string()))
            .cloned()
    }

    pub fn day_data(&self, wallet: &str, token: &str, date: i64) -> Option<WalletTokenDayData> {
        self.inner
            .lock()
            .unwrap()
            .day_data
            .get(&(wallet.to_string(), token.to_string(), date))
            .cloned()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load_pool(&self, id: &str) -> Result<Option<Pool>> {
        Ok(self.inner.lock().unwrap().pools.get(id).cloned())
    }

    async fn save_pool(&self, pool: &Pool) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .pools
            .insert(pool.id.clone(), pool.clone());
        Ok(())
    }

    async fn load_token(&self, id: &str) -> Result<Option<Token>> {
        Ok(self.inner.lock().unwrap().tokens.get(id).cloned())
    }

    async fn save_token(&self, token: &Token) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .tokens
            .insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn load_wallet(&self, id: &str) -> Result<Option<Wallet>> {
        Ok(self.inner.lock().unwrap().wallets.get(id).cloned())
    }

    async fn save_wallet(&self, wallet: &Wallet) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .wallets
            .entry(wallet.id.clone())
            .or_insert_with(|| wallet.clone());
        Ok(())
    }

    async fn save_swap(&self, swap: &Swap) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .swaps
            .entry(swap.id.clone())
            .or_insert_with(|| swap.clone());
        Ok(())
    }

    async fn load_profit(&self, wallet: &str, token: &str) -> Result<Option<WalletTokenProfit>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .profits
            .get(&(wallet.to_string(), token.to_string()))
            .cloned())
    }

    async fn save_profit(&self, profit: &WalletTokenProfit) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .profits
            .insert((profit.wallet.clone(), profit.token.clone()), profit.clone());
        Ok(())
    }

    async fn load_day_data(
        &self,
        wallet: &str,
        token: &str,
        date: i64,
    ) -> Result<Option<WalletTokenDayData>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .day_data
            .get(&(wallet.to_string(), token.to_string(), date))
            .cloned())
    }

    async fn save_day_data(&self, day_data: &WalletTokenDayData) -> Result<()> {
        self.inner.lock().unwrap().day_data.insert(
            (
                day_data.wallet.clone(),
                day_data.token.clone(),
                day_data.date,
            ),
            day_data.clone(),
        );
        Ok(())
    }

    async fn get_checkpoint(&self, source: &str) -> Result<Option<Checkpoint>> {
        Ok(self.inner.lock().unwrap().checkpoints.get(source).cloned())
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .checkpoints
            .insert(checkpoint.source.clone(), checkpoint.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn load_token_is_idempotent() {
        let store = MemoryStore::new();
        let token = Token {
            id: "0xabc".to_string(),
            symbol: "ABC".to_string(),
            name: "Alphabet Coin".to_string(),
            decimals: 8,
        };
        store.save_token(&token).await.unwrap();

        let first = store.load_token("0xabc").await.unwrap().unwrap();
        let second = store.load_token("0xabc").await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, token);
    }

    #[tokio::test]
    async fn wallet_save_keeps_first_write() {
        let store = MemoryStore::new();
        let wallet = Wallet {
            id: "0xaaa".to_string(),
        };
        store.save_wallet(&wallet).await.unwrap();
        store.save_wallet(&wallet).await.unwrap();

        assert_eq!(store.counts().wallets, 1);
    }

    #[tokio::test]
    async fn missing_entities_load_as_none() {
        let store = MemoryStore::new();
        assert!(store.load_pool("0xnope").await.unwrap().is_none());
        assert!(store.load_token("0xnope").await.unwrap().is_none());
        assert!(store.load_profit("0xa", "0xt").await.unwrap().is_none());
        assert!(store.load_day_data("0xa", "0xt", 0).await.unwrap().is_none());
        assert!(store.get_checkpoint("archive").await.unwrap().is_none());
    }
}
