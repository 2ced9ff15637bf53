pub mod config;
pub mod indicators;
pub mod registry;
pub mod strategies;

pub use config::{StrategyFileConfig, StrategyKind};
pub use registry::{Choice, StrategyEngine};

use common::{Candle, Direction};
use thiserror::Error;

/// Internal fault raised by a single strategy evaluation.
/// The engine logs it and moves on to the next strategy.
#[derive(Debug, Error, PartialEq)]
pub enum StrategyError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("non-finite price in candle history")]
    NonFinitePrice,
}

/// All strategy implementations must satisfy this trait.
pub trait Strategy: Send + Sync {
    /// Name reported with the signal, e.g. `"RSI"`.
    fn name(&self) -> &str;

    /// Evaluate a closed-candle history (oldest first).
    ///
    /// `Ok(None)` means no signal, including when the history is too short.
    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Direction>, StrategyError>;
}

/// Close prices of `candles`, rejecting NaN and infinities.
pub(crate) fn finite_closes(candles: &[Candle]) -> Result<Vec<f64>, StrategyError> {
    candles
        .iter()
        .map(|c| {
            if c.close.is_finite() {
                Ok(c.close)
            } else {
                Err(StrategyError::NonFinitePrice)
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, FixedOffset, TimeZone};
    use common::Candle;

    /// One candle per minute from `(open, close)` pairs; wicks hug the body.
    pub fn bodies(pairs: &[(f64, f64)]) -> Vec<Candle> {
        let offset = FixedOffset::east_opt(6 * 3600).unwrap();
        let start = offset.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(open, close))| {
                Candle::new(
                    start + Duration::minutes(i as i64),
                    open,
                    open.max(close),
                    open.min(close),
                    close,
                )
            })
            .collect()
    }

    /// Candles whose closes follow `closes`, each opening at the prior close.
    pub fn from_closes(closes: &[f64]) -> Vec<Candle> {
        let pairs: Vec<(f64, f64)> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| (if i == 0 { c } else { closes[i - 1] }, c))
            .collect();
        bodies(&pairs)
    }
}
