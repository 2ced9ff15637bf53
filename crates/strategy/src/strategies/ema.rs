use common::{Candle, Direction};

use crate::config::EmaParams;
use crate::indicators::{EmaIndicator, EmaTrend};
use crate::{finite_closes, Strategy, StrategyError};

/// Follows the latest candle body when the EMA slope agrees.
pub struct EmaTrendStrategy {
    indicator: EmaIndicator,
    trend_filter: bool,
}

impl EmaTrendStrategy {
    pub fn new(params: &EmaParams) -> Self {
        Self {
            indicator: EmaIndicator::new(params.period),
            trend_filter: params.trend_filter,
        }
    }
}

impl Strategy for EmaTrendStrategy {
    fn name(&self) -> &str {
        "EMA"
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Direction>, StrategyError> {
        if self.indicator.period == 0 {
            return Err(StrategyError::InvalidParameter("ema period must be > 0".into()));
        }
        let closes = finite_closes(candles)?;
        let trend = match self.indicator.trend(&closes) {
            None | Some(EmaTrend::Neutral) => return Ok(None),
            Some(trend) => trend,
        };
        let Some(direction) = candles.last().and_then(Candle::direction) else {
            return Ok(None);
        };
        if self.trend_filter {
            match (direction, trend) {
                (Direction::Call, EmaTrend::Bearish) | (Direction::Put, EmaTrend::Bullish) => {
                    return Ok(None)
                }
                _ => {}
            }
        }
        Ok(Some(direction))
    }
}
