use common::CandleColor::{Green, Red};
use common::{Candle, Direction};

use crate::{Strategy, StrategyError};

/// Strict alternation over the last four candles predicts the next colour.
///
/// `RED GREEN RED GREEN` gives PUT, `GREEN RED GREEN RED` gives CALL.
pub struct ColorPatternStrategy;

impl Strategy for ColorPatternStrategy {
    fn name(&self) -> &str {
        "COLOR_PATTERN"
    }

    fn evaluate(&self, candles: &[Candle]) -> Result<Option<Direction>, StrategyError> {
        let [.., a, b, c, d] = candles else {
            return Ok(None);
        };
        Ok(match [a.color(), b.color(), c.color(), d.color()] {
            [Red, Green, Red, Green] => Some(Direction::Put),
            [Green, Red, Green, Red] => Some(Direction::Call),
            _ => None,
        })
    }
}
