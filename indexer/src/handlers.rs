use crate::decimal::ZERO_BD;
use crate::metadata::{fetch_token_metadata, TokenMetadataSource};
use crate::model::{
    day_bucket, Pool, PoolCreatedEvent, Swap, SwapEvent, Token, Wallet, WalletTokenDayData,
    WalletTokenProfit,
};
use crate::profit::attribute;
use crate::store::{get_or_create, EntityStore};
use crate::watcher::PoolWatcherRegistry;
use bigdecimal::BigDecimal;
use metrics::counter;
use std::sync::Arc;
use swapledger_core::Result;
use tracing::{info, instrument, warn};

/// Outcome of processing one swap event. Missing references skip the event
/// without writing anything; storage failures propagate as errors instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwapOutcome {
    Applied,
    MissingPool,
    MissingToken,
}

/// Event handlers for the profit ledger. One event is processed to
/// completion at a time; every ledger update is a read-modify-write fold,
/// so replaying an event double-counts. Delivery-once is the caller's job.
pub struct Handlers {
    store: Arc<dyn EntityStore>,
    metadata: Arc<dyn TokenMetadataSource>,
    watcher: Arc<dyn PoolWatcherRegistry>,
}

impl Handlers {
    pub fn new(
        store: Arc<dyn EntityStore>,
        metadata: Arc<dyn TokenMetadataSource>,
        watcher: Arc<dyn PoolWatcherRegistry>,
    ) -> Self {
        Self {
            store,
            metadata,
            watcher,
        }
    }

    /// Create the pool record, register it for swap delivery and lazily
    /// create its tokens. The host guarantees each pool address arrives at
    /// most once; a replay would overwrite the pool record.
    #[instrument(skip(self, event), fields(pool = %event.pool))]
    pub async fn on_pool_created(&self, event: &PoolCreatedEvent) -> Result<()> {
        let pool = Pool {
            id: event.pool.clone(),
            token0: event.token0.clone(),
            token1: event.token1.clone(),
            fee: event.fee,
            created_timestamp: event.timestamp,
        };
        self.store.save_pool(&pool).await?;

        self.watcher.start_watching(&event.pool).await?;

        self.get_or_create_token(&event.token0).await?;
        self.get_or_create_token(&event.token1).await?;

        counter!("swapledger_pools_created").increment(1);
        info!(pool = %event.pool, "Pool created");
        Ok(())
    }

    /// Record the swap and fold its profit deltas into the cumulative and
    /// daily ledgers for sender and recipient. If the pool or either token
    /// is unknown the whole event is skipped with no writes at all.
    #[instrument(skip(self, event), fields(pool = %event.pool, tx = %event.transaction_hash))]
    pub async fn on_swap(&self, event: &SwapEvent) -> Result<SwapOutcome> {
        let Some(pool) = self.store.load_pool(&event.pool).await? else {
            warn!(pool = %event.pool, "Pool not found, skipping swap event");
            counter!("swapledger_swaps_skipped", "reason" => "missing_pool").increment(1);
            return Ok(SwapOutcome::MissingPool);
        };

        let token0 = self.store.load_token(&pool.token0).await?;
        let token1 = self.store.load_token(&pool.token1).await?;
        let (Some(token0), Some(token1)) = (token0, token1) else {
            warn!(pool = %event.pool, "Token data missing for pool, skipping swap event");
            counter!("swapledger_swaps_skipped", "reason" => "missing_token").increment(1);
            return Ok(SwapOutcome::MissingToken);
        };

        let swap = Swap {
            id: event.swap_id(),
            pool: pool.id.clone(),
            token0: token0.id.clone(),
            token1: token1.id.clone(),
            sender: event.sender.clone(),
            recipient: event.recipient.clone(),
            amount0: event.amount0.clone(),
            amount1: event.amount1.clone(),
            sqrt_price_x96: event.sqrt_price_x96.clone(),
            liquidity: event.liquidity.clone(),
            tick: event.tick,
            timestamp: event.timestamp,
            transaction_hash: event.transaction_hash.clone(),
        };
        self.store.save_swap(&swap).await?;

        self.get_or_create_wallet(&event.sender).await?;
        if event.recipient != event.sender {
            self.get_or_create_wallet(&event.recipient).await?;
        }

        // A self-swap gets both roles summed by the attributor and is
        // folded once, never twice.
        self.apply_wallet_deltas(&event.sender, event, &token0, &token1)
            .await?;
        if event.recipient != event.sender {
            self.apply_wallet_deltas(&event.recipient, event, &token0, &token1)
                .await?;
        }

        counter!("swapledger_swaps_processed").increment(1);
        Ok(SwapOutcome::Applied)
    }

    /// Look up a token, fetching metadata and creating the record on first
    /// sighting. Tokens are immutable once created.
    pub async fn get_or_create_token(&self, address: &str) -> Result<Token> {
        get_or_create(
            || self.store.load_token(address),
            || async move {
                let meta = fetch_token_metadata(self.metadata.as_ref(), address).await;
                let token = Token {
                    id: address.to_string(),
                    symbol: meta.symbol,
                    name: meta.name,
                    decimals: meta.decimals,
                };
                self.store.save_token(&token).await?;
                counter!("swapledger_tokens_created").increment(1);
                Ok(token)
            },
        )
        .await
    }

    async fn get_or_create_wallet(&self, address: &str) -> Result<Wallet> {
        get_or_create(
            || self.store.load_wallet(address),
            || async move {
                let wallet = Wallet {
                    id: address.to_string(),
                };
                self.store.save_wallet(&wallet).await?;
                counter!("swapledger_wallets_created").increment(1);
                Ok(wallet)
            },
        )
        .await
    }

    async fn apply_wallet_deltas(
        &self,
        wallet_id: &str,
        event: &SwapEvent,
        token0: &Token,
        token1: &Token,
    ) -> Result<()> {
        let deltas = attribute(event, wallet_id, token0, token1);

        if deltas.token0 != *ZERO_BD {
            self.update_wallet_token_profit(wallet_id, &token0.id, &deltas.token0)
                .await?;
            self.update_wallet_token_day_data(wallet_id, &token0.id, &deltas.token0, event.timestamp)
                .await?;
            counter!("swapledger_profit_deltas_applied").increment(1);
        }

        if deltas.token1 != *ZERO_BD {
            self.update_wallet_token_profit(wallet_id, &token1.id, &deltas.token1)
                .await?;
            self.update_wallet_token_day_data(wallet_id, &token1.id, &deltas.token1, event.timestamp)
                .await?;
            counter!("swapledger_profit_deltas_applied").increment(1);
        }

        Ok(())
    }

    async fn update_wallet_token_profit(
        &self,
        wallet_id: &str,
        token_id: &str,
        delta: &BigDecimal,
    ) -> Result<()> {
        let mut profit = get_or_create(
            || self.store.load_profit(wallet_id, token_id),
            || async move {
                Ok(WalletTokenProfit {
                    wallet: wallet_id.to_string(),
                    token: token_id.to_string(),
                    cumulative_profit: ZERO_BD.clone(),
                })
            },
        )
        .await?;

        profit.cumulative_profit += delta.clone();
        self.store.save_profit(&profit).await
    }

    async fn update_wallet_token_day_data(
        &self,
        wallet_id: &str,
        token_id: &str,
        delta: &BigDecimal,
        timestamp: i64,
    ) -> Result<()> {
        let date = day_bucket(timestamp);
        let mut day_data = get_or_create(
            || self.store.load_day_data(wallet_id, token_id, date),
            || async move {
                Ok(WalletTokenDayData {
                    wallet: wallet_id.to_string(),
                    token: token_id.to_string(),
                    date,
                    amount_bought: ZERO_BD.clone(),
                    daily_profit: ZERO_BD.clone(),
                    cumulative_profit: ZERO_BD.clone(),
                })
            },
        )
        .await?;

        // A positive delta counts as tokens acquired that day: a rough buy
        // volume signal, not a purchase detector.
        if *delta > *ZERO_BD {
            day_data.amount_bought += delta.clone();
        }

        day_data.daily_profit += delta.clone();
        // Each day row only accumulates deltas timestamped into its own
        // day; totals from prior days are not carried forward.
        day_data.cumulative_profit += delta.clone();

        self.store.save_day_data(&day_data).await
    }
}
