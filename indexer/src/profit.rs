use crate::decimal::convert_token_to_decimal;
use crate::model::{SwapEvent, Token};
use bigdecimal::BigDecimal;

/// Signed profit contribution of one swap to one wallet, split by pool token.
/// Cardinality is fixed at two, so a map keyed by token id is unnecessary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfitDeltas {
    pub token0: BigDecimal,
    pub token1: BigDecimal,
}

/// Compute the signed profit deltas one swap contributes to `wallet_id`.
///
/// Sender pays out token0 and receives token1; recipient is the mirror. A
/// wallet that is both sender and recipient gets both roles summed into a
/// single delta per token, so the caller folds each swap into the ledgers at
/// most once per wallet per token. A wallet in neither role gets zero deltas.
///
/// Pure function: reads only the event and token records passed in.
pub fn attribute(event: &SwapEvent, wallet_id: &str, token0: &Token, token1: &Token) -> ProfitDeltas {
    let is_sender = event.sender == wallet_id;
    let is_recipient = event.recipient == wallet_id;

    let mut deltas = ProfitDeltas::default();
    if !is_sender && !is_recipient {
        return deltas;
    }

    let amount0 = convert_token_to_decimal(&event.amount0, token0.decimals);
    let amount1 = convert_token_to_decimal(&event.amount1, token1.decimals);

    if is_sender {
        deltas.token0 -= amount0.clone();
        deltas.token1 += amount1.clone();
    }

    if is_recipient {
        deltas.token0 += amount0;
        deltas.token1 -= amount1;
    }

    deltas
}
