use common::{Candle, CandleColor, Direction};

use crate::{Strategy, StrategyError};

/// Majority vote of the last three candle bodies; dojis abstain.
pub struct MajorityStrategy;

impl Strategy for MajorityStrategy {
    fn name(&self) -> &str {
        "THREE_CANDLE"
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Direction>, StrategyError> {
        if candles.len() < 3 {
            return Ok(None);
        }
        let (up, down) = candles[candles.len() - 3..]
            .iter()
            .fold((0u8, 0u8), |(up, down), c| match c.color() {
                CandleColor::Green => (up + 1, down),
                CandleColor::Red => (up, down + 1),
                CandleColor::Doji => (up, down),
            });
        Ok(match up.cmp(&down) {
            std::cmp::Ordering::Greater => Some(Direction::Call),
            std::cmp::Ordering::Less => Some(Direction::Put),
            std::cmp::Ordering::Equal => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bodies;

    #[test]
    fn more_up_than_down_gives_call() {
        let candles = bodies(&[(1.0, 1.1), (1.1, 1.0), (1.0, 1.2)]);
        assert_eq!(MajorityStrategy.evaluate(&candles), Ok(Some(Direction::Call)));
    }

    #[test]
    fn more_down_than_up_gives_put() {
        let candles = bodies(&[(1.0, 1.0), (1.1, 1.0), (1.0, 1.0)]);
        assert_eq!(MajorityStrategy.evaluate(&candles), Ok(Some(Direction::Put)));
    }

    #[test]
    fn tie_gives_nothing() {
        let candles = bodies(&[(1.0, 1.1), (1.1, 1.0), (1.0, 1.0)]);
        assert_eq!(MajorityStrategy.evaluate(&candles), Ok(None));
    }

    #[test]
    fn older_candles_are_ignored() {
        let candles = bodies(&[(1.0, 0.5), (1.0, 0.5), (1.0, 1.1), (1.0, 1.1), (1.1, 1.0)]);
        assert_eq!(MajorityStrategy.evaluate(&candles), Ok(Some(Direction::Call)));
    }
}
