use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use tracing::warn;

pub const DEFAULT_DECIMALS: i32 = 18;
pub const MAX_DECIMALS: i32 = 255;

pub static ZERO_BD: Lazy<BigDecimal> = Lazy::new(|| BigDecimal::from(0));

static POW10_CACHE: Lazy<[BigDecimal; 25]> =
    Lazy::new(|| std::array::from_fn(|i| BigDecimal::from(BigInt::from(10u32).pow(i as u32))));

fn big_pow10(exp: u32) -> BigDecimal {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigDecimal::from(BigInt::from(10u32).pow(exp))
    }
}

/// 10^decimals as an arbitrary-precision decimal. Exponents above 255 are
/// capped at 255 with a warning to keep the power computation bounded.
pub fn exponent_to_big_decimal(decimals: i32) -> BigDecimal {
    let exp = if decimals > MAX_DECIMALS {
        warn!(decimals, "Decimals value too high, limiting to 255");
        MAX_DECIMALS
    } else {
        decimals
    };
    big_pow10(exp.max(0) as u32)
}

/// Scale a raw integer token amount down by the token's decimal count.
///
/// Uses arbitrary-precision decimal division rather than floating point, so
/// repeated application across many swaps accumulates no rounding drift.
pub fn convert_token_to_decimal(amount: &BigInt, decimals: i32) -> BigDecimal {
    let value = BigDecimal::from(amount.clone());
    if decimals == 0 {
        return value;
    }
    value / exponent_to_big_decimal(decimals)
}
