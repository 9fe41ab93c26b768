use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const SECONDS_PER_DAY: i64 = 86400;

/// Truncate a unix timestamp to the start of its UTC day.
pub fn day_bucket(timestamp: i64) -> i64 {
    (timestamp / SECONDS_PER_DAY) * SECONDS_PER_DAY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Pool {
    pub id: String,
    pub token0: String,
    pub token1: String,
    pub fee: i32,
    pub created_timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: String,
}

/// Write-once record of a raw swap. Amounts are kept in token-native integer
/// units; scaling to decimal happens only in profit attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Swap {
    pub id: String,
    pub pool: String,
    pub token0: String,
    pub token1: String,
    pub sender: String,
    pub recipient: String,
    pub amount0: BigInt,
    pub amount1: BigInt,
    pub sqrt_price_x96: BigInt,
    pub liquidity: BigInt,
    pub tick: i32,
    pub timestamp: i64,
    pub transaction_hash: String,
}

/// Cumulative signed profit for one (wallet, token) pair, in decimal token
/// units. Additive only: never reset, never deleted.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct WalletTokenProfit {
    pub wallet: String,
    pub token: String,
    pub cumulative_profit: BigDecimal,
}

/// Per-day aggregate for one (wallet, token) pair. `date` is the day bucket
/// start timestamp. `cumulative_profit` only accumulates deltas that land in
/// this row's day; it does not carry forward totals from prior days.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct WalletTokenDayData {
    pub wallet: String,
    pub token: String,
    pub date: i64,
    pub amount_bought: BigDecimal,
    pub daily_profit: BigDecimal,
    pub cumulative_profit: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolCreatedEvent {
    pub pool: String,
    pub token0: String,
    pub token1: String,
    pub fee: i32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapEvent {
    pub pool: String,
    pub sender: String,
    pub recipient: String,
    pub amount0: BigInt,
    pub amount1: BigInt,
    pub sqrt_price_x96: BigInt,
    pub liquidity: BigInt,
    pub tick: i32,
    pub timestamp: i64,
    pub transaction_hash: String,
    pub log_index: u64,
}

impl SwapEvent {
    /// Unique per event, even for multiple swaps in one transaction.
    pub fn swap_id(&self) -> String {
        format!("{}-{}", self.transaction_hash, self.log_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    PoolCreated(PoolCreatedEvent),
    Swap(SwapEvent),
}

impl ChainEvent {
    pub fn timestamp(&self) -> i64 {
        match self {
            ChainEvent::PoolCreated(e) => e.timestamp,
            ChainEvent::Swap(e) => e.timestamp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBatch {
    pub events: Vec<ChainEvent>,
    pub cursor: Option<String>,
    pub has_more: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct Checkpoint {
    pub source: String,
    pub cursor: Option<String>,
    pub last_event_ts: Option<i64>,
    pub events_processed: i64,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(source: String) -> Self {
        Self {
            source,
            cursor: None,
            last_event_ts: None,
            events_processed: 0,
            updated_at: Utc::now(),
        }
    }
}
