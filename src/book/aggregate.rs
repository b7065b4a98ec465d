//! Reduction of one side of a depth snapshot into liquidity totals.
//!
//! The verifier compares the service's reported fill against these totals with
//! exact equality, so everything here stays in `rust_decimal`. Binary floating
//! point would drift on inputs like `0.1`.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::trace;

use crate::book::types::{AggregateLiquidity, DepthLevel};
use crate::error::LevelError;

fn parse_positive(index: usize, field: &'static str, raw: &str) -> Result<Decimal, LevelError> {
    let text = raw.trim();
    let value = Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| LevelError::Malformed { index, field, value: raw.to_string() })?;
    if value <= Decimal::ZERO {
        return Err(LevelError::NonPositive { index, field, value: raw.to_string() });
    }
    Ok(value)
}

/// `base_total = Σ size`, `quote_total = Σ price × size`. Input order does not matter and an
/// empty side sums to zero.
pub fn aggregate(levels: &[DepthLevel]) -> Result<AggregateLiquidity, LevelError> {
    let totals = levels.iter().enumerate().try_fold(
        AggregateLiquidity::default(),
        |acc, (index, level)| -> Result<AggregateLiquidity, LevelError> {
            let price = parse_positive(index, "price", &level.price)?;
            let size = parse_positive(index, "size", &level.size)?;
            let overflow = || LevelError::Overflow { index };

            let notional = price.checked_mul(size).ok_or_else(overflow)?;
            Ok(AggregateLiquidity {
                quote_total: acc.quote_total.checked_add(notional).ok_or_else(overflow)?,
                base_total: acc.base_total.checked_add(size).ok_or_else(overflow)?,
            })
        },
    )?;

    trace!(levels = levels.len(), quote = %totals.quote_total, base = %totals.base_total, "Aggregated depth");
    Ok(totals)
}
