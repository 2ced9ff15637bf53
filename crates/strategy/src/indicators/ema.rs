/// Exponential moving average and its short-term slope.
///
/// Seeded with the simple average of the first `period` values, then
/// smoothed with `k = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct EmaIndicator {
    pub period: usize,
}

/// Direction of the last EMA step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmaTrend {
    Bullish,
    Bearish,
    Neutral,
}

impl EmaIndicator {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// EMA value after the seed and after every subsequent close.
    /// Returns `None` if there are fewer than `period` values.
    pub fn series(&self, values: &[f64]) -> Option<Vec<f64>> {
        if self.period == 0 || values.len() < self.period {
            return None;
        }
        let k = 2.0 / (self.period as f64 + 1.0);
        let seed = values[..self.period].iter().sum::<f64>() / self.period as f64;

        let mut out = Vec::with_capacity(values.len() - self.period + 1);
        out.push(seed);
        let mut ema = seed;
        for &price in &values[self.period..] {
            ema = (price - ema) * k + ema;
            out.push(ema);
        }
        Some(out)
    }

    /// Trend from the sign of the last EMA delta.
    /// Needs at least `period + 1` values.
    pub fn trend(&self, values: &[f64]) -> Option<EmaTrend> {
        let series = self.series(values)?;
        let [.., prev, last] = series.as_slice() else {
            return None;
        };
        Some(if last > prev {
            EmaTrend::Bullish
        } else if last < prev {
            EmaTrend::Bearish
        } else {
            EmaTrend::Neutral
        })
    }
}
