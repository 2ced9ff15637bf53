use common::{Candle, Direction};

use crate::config::RsiParams;
use crate::indicators::RsiIndicator;
use crate::{finite_closes, Strategy, StrategyError};

/// Mean-reversion on a short RSI.
///
/// RSI is evaluated on the full series and then on up to `max_lookback - 1`
/// progressively shorter prefixes, newest first. The first oversold reading
/// gives CALL, the first overbought reading gives PUT.
pub struct RsiStrategy {
    indicator: RsiIndicator,
    max_lookback: usize,
}

impl RsiStrategy {
    pub fn new(params: &RsiParams) -> Self {
        Self {
            indicator: RsiIndicator::new(params.period, params.overbought, params.oversold),
            max_lookback: params.max_lookback,
        }
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "RSI"
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Direction>, StrategyError> {
        if self.indicator.period == 0 {
            return Err(StrategyError::InvalidParameter("rsi period must be > 0".into()));
        }
        let closes = finite_closes(candles)?;
        if closes.len() < self.indicator.period + self.max_lookback {
            return Ok(None);
        }

        for back in 0..self.max_lookback {
            let Some(rsi) = self.indicator.compute(&closes[..closes.len() - back]) else {
                continue;
            };
            if rsi < self.indicator.oversold {
                return Ok(Some(Direction::Call));
            }
            if rsi > self.indicator.overbought {
                return Ok(Some(Direction::Put));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::from_closes;

    fn strategy() -> RsiStrategy {
        RsiStrategy::new(&RsiParams::default())
    }

    #[test]
    fn declining_closes_give_call() {
        let candles = from_closes(&[10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0]);
        assert_eq!(strategy().evaluate(&candles), Ok(Some(Direction::Call)));
    }

    #[test]
    fn rising_closes_give_put() {
        let candles = from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(strategy().evaluate(&candles), Ok(Some(Direction::Put)));
    }

    #[test]
    fn zero_average_loss_reads_as_pure_uptrend() {
        // Last three changes are all non-negative with at least one gain.
        let closes = [5.0, 4.0, 3.0, 3.0, 3.5, 3.5, 4.0];
        let indicator = RsiIndicator::new(3, 70.0, 30.0);
        assert_eq!(indicator.compute(&closes), Some(100.0));
        assert_eq!(strategy().evaluate(&from_closes(&closes)), Ok(Some(Direction::Put)));
    }

    #[test]
    fn flat_closes_give_no_signal() {
        let candles = from_closes(&[5.0; 10]);
        assert_eq!(strategy().evaluate(&candles), Ok(None));
    }

    #[test]
    fn short_history_gives_no_signal() {
        let candles = from_closes(&[10.0, 9.0, 8.0, 7.0, 6.0]);
        assert_eq!(strategy().evaluate(&candles), Ok(None));
    }

    #[test]
    fn earlier_extreme_is_found_within_lookback() {
        // Latest bar is balanced, one bar earlier the last three changes were all losses.
        let closes = [10.0, 10.0, 9.0, 8.0, 7.0, 8.0];
        let candles = from_closes(&closes);
        let indicator = RsiIndicator::new(3, 70.0, 30.0);
        let latest = indicator.compute(&closes).unwrap();
        assert!((30.0..=70.0).contains(&latest), "latest RSI {latest}");
        assert_eq!(strategy().evaluate(&candles), Ok(Some(Direction::Call)));
    }

    #[test]
    fn nan_close_is_a_fault() {
        let mut candles = from_closes(&[10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0]);
        candles[3].close = f64::NAN;
        assert_eq!(strategy().evaluate(&candles), Err(StrategyError::NonFinitePrice));
    }
}
