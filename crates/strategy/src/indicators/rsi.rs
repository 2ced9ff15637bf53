/// RSI (Relative Strength Index) over the most recent `period` changes.
///
/// Single-step simple averages of gain and loss, no Wilder smoothing: the
/// value only depends on the last `period + 1` closes.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl RsiIndicator {
    pub fn new(period: usize, overbought: f64, oversold: f64) -> Self {
        Self {
            period,
            overbought,
            oversold,
        }
    }

    /// Compute RSI from a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `period + 1` values.
    ///
    /// No losses gives 100; no movement at all gives 50.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if self.period == 0 || closes.len() < self.period + 1 {
            return None;
        }

        let tail = &closes[closes.len() - self.period - 1..];
        let (gain, loss) = tail.windows(2).fold((0.0, 0.0), |(g, l), w| {
            let change = w[1] - w[0];
            if change > 0.0 {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });
        let avg_gain = gain / self.period as f64;
        let avg_loss = loss / self.period as f64;

        if avg_loss == 0.0 {
            return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_returns_none_when_insufficient_data() {
        let rsi = RsiIndicator::new(3, 70.0, 30.0);
        assert!(rsi.compute(&[1.0, 2.0, 3.0]).is_none());
        assert!(rsi.compute(&[1.0, 2.0, 3.0, 4.0]).is_some());
    }

    #[test]
    fn rsi_all_gains_returns_100() {
        let rsi = RsiIndicator::new(3, 70.0, 30.0);
        let value = rsi.compute(&[10.0, 11.0, 12.0, 13.0, 14.0]).unwrap();
        assert_eq!(value, 100.0);
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = RsiIndicator::new(3, 70.0, 30.0);
        let value = rsi.compute(&[14.0, 13.0, 12.0, 11.0, 10.0]).unwrap();
        assert!(value.abs() < 1e-9, "Expected ~0, got {value}");
    }

    #[test]
    fn rsi_flat_is_neutral() {
        let rsi = RsiIndicator::new(3, 70.0, 30.0);
        assert_eq!(rsi.compute(&[5.0; 6]), Some(50.0));
    }

    #[test]
    fn rsi_only_uses_last_period_changes() {
        let rsi = RsiIndicator::new(2, 70.0, 30.0);
        // Older crash must not matter: last two changes are +1 and -1.
        let value = rsi.compute(&[100.0, 10.0, 11.0, 10.0]).unwrap();
        assert!((value - 50.0).abs() < 1e-9, "Expected 50, got {value}");
    }
}
