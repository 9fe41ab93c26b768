use super::EntityStore;
use crate::model::{Checkpoint, Pool, Swap, Token, Wallet, WalletTokenDayData, WalletTokenProfit};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use metrics::counter;
use sqlx::PgPool;
use swapledger_core::Result;
use tracing::{debug, instrument};

/// Postgres-backed entity store. Raw swap amounts travel as NUMERIC, so
/// arbitrarily large token-native integers survive the round trip.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn load_pool(&self, id: &str) -> Result<Option<Pool>> {
        let row = sqlx::query_as::<_, Pool>(
            "SELECT id, token0, token1, fee, created_timestamp FROM pools WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save_pool(&self, pool: &Pool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pools (id, token0, token1, fee, created_timestamp)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                token0 = EXCLUDED.token0,
                token1 = EXCLUDED.token1,
                fee = EXCLUDED.fee,
                created_timestamp = EXCLUDED.created_timestamp
            "#,
        )
        .bind(&pool.id)
        .bind(&pool.token0)
        .bind(&pool.token1)
        .bind(pool.fee)
        .bind(pool.created_timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_token(&self, id: &str) -> Result<Option<Token>> {
        let row = sqlx::query_as::<_, Token>(
            "SELECT id, symbol, name, decimals FROM tokens WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save_token(&self, token: &Token) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (id, symbol, name, decimals)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                symbol = EXCLUDED.symbol,
                name = EXCLUDED.name,
                decimals = EXCLUDED.decimals
            "#,
        )
        .bind(&token.id)
        .bind(&token.symbol)
        .bind(&token.name)
        .bind(token.decimals)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_wallet(&self, id: &str) -> Result<Option<Wallet>> {
        let row = sqlx::query_as::<_, Wallet>("SELECT id FROM wallets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn save_wallet(&self, wallet: &Wallet) -> Result<()> {
        sqlx::query("INSERT INTO wallets (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(&wallet.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn save_swap(&self, swap: &Swap) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO swaps (
                id, pool, token0, token1, sender, recipient,
                amount0, amount1, sqrt_price_x96, liquidity, tick,
                timestamp, transaction_hash
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&swap.id)
        .bind(&swap.pool)
        .bind(&swap.token0)
        .bind(&swap.token1)
        .bind(&swap.sender)
        .bind(&swap.recipient)
        .bind(BigDecimal::from(swap.amount0.clone()))
        .bind(BigDecimal::from(swap.amount1.clone()))
        .bind(BigDecimal::from(swap.sqrt_price_x96.clone()))
        .bind(BigDecimal::from(swap.liquidity.clone()))
        .bind(swap.tick)
        .bind(swap.timestamp)
        .bind(&swap.transaction_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_profit(&self, wallet: &str, token: &str) -> Result<Option<WalletTokenProfit>> {
        let row = sqlx::query_as::<_, WalletTokenProfit>(
            r#"
            SELECT wallet, token, cumulative_profit
            FROM wallet_token_profits
            WHERE wallet = $1 AND token = $2
            "#,
        )
        .bind(wallet)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save_profit(&self, profit: &WalletTokenProfit) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallet_token_profits (wallet, token, cumulative_profit)
            VALUES ($1, $2, $3)
            ON CONFLICT (wallet, token) DO UPDATE SET
                cumulative_profit = EXCLUDED.cumulative_profit
            "#,
        )
        .bind(&profit.wallet)
        .bind(&profit.token)
        .bind(&profit.cumulative_profit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_day_data(
        &self,
        wallet: &str,
        token: &str,
        date: i64,
    ) -> Result<Option<WalletTokenDayData>> {
        let row = sqlx::query_as::<_, WalletTokenDayData>(
            r#"
            SELECT wallet, token, date, amount_bought, daily_profit, cumulative_profit
            FROM wallet_token_day_data
            WHERE wallet = $1 AND token = $2 AND date = $3
            "#,
        )
        .bind(wallet)
        .bind(token)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn save_day_data(&self, day_data: &WalletTokenDayData) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallet_token_day_data (
                wallet, token, date, amount_bought, daily_profit, cumulative_profit
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (wallet, token, date) DO UPDATE SET
                amount_bought = EXCLUDED.amount_bought,
                daily_profit = EXCLUDED.daily_profit,
                cumulative_profit = EXCLUDED.cumulative_profit
            "#,
        )
        .bind(&day_data.wallet)
        .bind(&day_data.token)
        .bind(day_data.date)
        .bind(&day_data.amount_bought)
        .bind(&day_data.daily_profit)
        .bind(&day_data.cumulative_profit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_checkpoint(&self, source: &str) -> Result<Option<Checkpoint>> {
        let checkpoint = sqlx::query_as::<_, Checkpoint>(
            r#"
            SELECT source, cursor, last_event_ts, events_processed, updated_at
            FROM checkpoints
            WHERE source = $1
            "#,
        )
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;

        Ok(checkpoint)
    }

    #[instrument(skip(self, checkpoint))]
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO checkpoints (
                source, cursor, last_event_ts, events_processed, updated_at
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (source) DO UPDATE SET
                cursor = EXCLUDED.cursor,
                last_event_ts = EXCLUDED.last_event_ts,
                events_processed = EXCLUDED.events_processed,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&checkpoint.source)
        .bind(&checkpoint.cursor)
        .bind(checkpoint.last_event_ts)
        .bind(checkpoint.events_processed)
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await?;

        counter!("swapledger_checkpoints_saved").increment(1);

        debug!(
            source = %checkpoint.source,
            events = checkpoint.events_processed,
            "Saved checkpoint"
        );

        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(())
    }
}
