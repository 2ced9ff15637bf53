use common::{Candle, Direction};

use crate::config::ZigZagParams;
use crate::{Strategy, StrategyError};

/// Reversal at the second-to-last candle against the window extremes.
///
/// `backstep` only widens the minimum history; it takes no part in the
/// reversal test.
pub struct ZigZagStrategy {
    depth: usize,
    deviation: f64,
    backstep: usize,
}

impl ZigZagStrategy {
    pub fn new(params: &ZigZagParams) -> Self {
        Self {
            depth: params.depth,
            deviation: params.deviation,
            backstep: params.backstep,
        }
    }
}

impl Strategy for ZigZagStrategy {
    fn name(&self) -> &str {
        "ZIGZAG"
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Direction>, StrategyError> {
        if self.depth < 2 {
            return Err(StrategyError::InvalidParameter(format!(
                "zigzag depth must be >= 2, got {}",
                self.depth
            )));
        }
        if !self.deviation.is_finite() {
            return Err(StrategyError::InvalidParameter("zigzag deviation must be finite".into()));
        }
        if candles.len() < self.depth + self.backstep {
            return Ok(None);
        }

        let window = &candles[candles.len() - self.depth..];
        let pivot = &candles[candles.len() - 2];
        let last = &candles[candles.len() - 1];

        let max_high = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let min_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        if !max_high.is_finite() || !min_low.is_finite() {
            return Err(StrategyError::NonFinitePrice);
        }

        if pivot.high >= max_high - self.deviation && last.close < pivot.close {
            return Ok(Some(Direction::Put));
        }
        if pivot.low <= min_low + self.deviation && last.close > pivot.close {
            return Ok(Some(Direction::Call));
        }
        Ok(None)
    }
}
