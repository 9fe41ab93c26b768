pub mod postgres;

#[cfg(test)]
pub mod memory;

use crate::model::{Checkpoint, Pool, Swap, Token, Wallet, WalletTokenDayData, WalletTokenProfit};
use async_trait::async_trait;
use std::future::Future;
use swapledger_core::Result;

/// Entity persistence consumed by the event handlers. Loads return `None`
/// for absent records; saves are upserts with entity-specific conflict rules.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn load_pool(&self, id: &str) -> Result<Option<Pool>>;
    async fn save_pool(&self, pool: &Pool) -> Result<()>;

    async fn load_token(&self, id: &str) -> Result<Option<Token>>;
    async fn save_token(&self, token: &Token) -> Result<()>;

    async fn load_wallet(&self, id: &str) -> Result<Option<Wallet>>;
    async fn save_wallet(&self, wallet: &Wallet) -> Result<()>;

    async fn save_swap(&self, swap: &Swap) -> Result<()>;

    async fn load_profit(&self, wallet: &str, token: &str) -> Result<Option<WalletTokenProfit>>;
    async fn save_profit(&self, profit: &WalletTokenProfit) -> Result<()>;

    async fn load_day_data(
        &self,
        wallet: &str,
        token: &str,
        date: i64,
    ) -> Result<Option<WalletTokenDayData>>;
    async fn save_day_data(&self, day_data: &WalletTokenDayData) -> Result<()>;

    async fn get_checkpoint(&self, source: &str) -> Result<Option<Checkpoint>>;
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}

/// Load an entity or build it when absent. Every lazily created entity in
/// the handlers goes through this one helper; `init` decides whether the
/// fresh entity is persisted immediately or left for a later save.
pub async fn get_or_create<T, L, LF, I, IF>(load: L, init: I) -> Result<T>
where
    L: FnOnce() -> LF,
    LF: Future<Output = Result<Option<T>>>,
    I: FnOnce() -> IF,
    IF: Future<Output = Result<T>>,
{
    match load().await? {
        Some(existing) => Ok(existing),
        None => init().await,
    }
}

pub use postgres::PgStore;
