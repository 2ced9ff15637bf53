use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use common::{Candle, Direction};

use crate::config::{StrategyFileConfig, StrategyKind};
use crate::strategies::{
    ColorPatternStrategy, EmaTrendStrategy, MajorityStrategy, RsiStrategy, ZigZagStrategy,
};
use crate::Strategy;

/// The strategy that fired and what it called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub strategy: String,
    pub direction: Direction,
}

/// Holds the enabled strategies and picks one signal per evaluation.
///
/// Each call to [`StrategyEngine::choose`] shuffles the evaluation order, so
/// the effective priority changes from cycle to cycle. Pin it with
/// [`StrategyEngine::with_seed`].
pub struct StrategyEngine {
    strategies: Vec<Box<dyn Strategy>>,
    min_history: usize,
    rng: StdRng,
}

impl StrategyEngine {
    pub fn new(strategies: Vec<Box<dyn Strategy>>, min_history: usize) -> Self {
        Self {
            strategies,
            min_history,
            rng: StdRng::from_entropy(),
        }
    }

    /// Build the engine from the file config's enabled set.
    pub fn from_config(cfg: &StrategyFileConfig) -> Self {
        let strategies: Vec<Box<dyn Strategy>> = cfg
            .enabled_kinds()
            .into_iter()
            .map(|kind| build_strategy(kind, cfg))
            .collect();

        for s in &strategies {
            info!(name = %s.name(), "Registered strategy");
        }

        Self::new(strategies, cfg.min_history)
    }

    /// Replace the random source with a seeded one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Evaluate the enabled strategies on a closed-candle history (oldest
    /// first) in shuffled order and return the first signal.
    ///
    /// A history shorter than `min_history` gives `None` without consulting
    /// any strategy. A strategy fault is logged and counts as no signal.
    pub fn choose(&mut self, asset: &str, candles: &[Candle]) -> Option<Choice> {
        if candles.len() < self.min_history {
            debug!(
                asset,
                have = candles.len(),
                need = self.min_history,
                "History too short"
            );
            return None;
        }

        let mut order: Vec<usize> = (0..self.strategies.len()).collect();
        order.shuffle(&mut self.rng);

        for idx in order {
            let strategy = &self.strategies[idx];
            match strategy.evaluate(candles) {
                Ok(Some(direction)) => {
                    return Some(Choice {
                        strategy: strategy.name().to_string(),
                        direction,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(asset, strategy = %strategy.name(), error = %e, "Strategy evaluation failed");
                }
            }
        }
        None
    }
}

fn build_strategy(kind: StrategyKind, cfg: &StrategyFileConfig) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::Rsi => Box::new(RsiStrategy::new(&cfg.rsi)),
        StrategyKind::ZigZag => Box::new(ZigZagStrategy::new(&cfg.zigzag)),
        StrategyKind::ColorPattern => Box::new(ColorPatternStrategy),
        StrategyKind::Ema => Box::new(EmaTrendStrategy::new(&cfg.ema)),
        StrategyKind::Majority => Box::new(MajorityStrategy),
    }
}
