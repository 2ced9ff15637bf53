use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::{Outcome, SessionSummary, Tally, TradeResult};

/// Run history and win/loss counters for one process session.
///
/// Append-only: outcomes are only ever pushed, counters only incremented,
/// so `tally.total() == history.len()` always holds.
#[derive(Debug, Default)]
pub struct Session {
    history: Vec<Outcome>,
    tally: Tally,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a terminal outcome and return the updated counters.
    pub fn record(&mut self, outcome: Outcome) -> Tally {
        match outcome.result {
            TradeResult::Win => self.tally.wins += 1,
            TradeResult::Loss => self.tally.losses += 1,
        }
        self.history.push(outcome);
        self.tally
    }

    pub fn history(&self) -> &[Outcome] {
        &self.history
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn summary(&self, generated_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            generated_at,
            outcomes: self.history.clone(),
            tally: self.tally,
        }
    }
}

/// Cloneable shared handle to the session.
///
/// The resolver writes through it; the bot and the shutdown path only read.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle(Arc<RwLock<Session>>);

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, outcome: Outcome) -> Tally {
        self.0.write().await.record(outcome)
    }

    pub async fn tally(&self) -> Tally {
        self.0.read().await.tally()
    }

    pub async fn len(&self) -> usize {
        self.0.read().await.history().len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn summary(&self) -> SessionSummary {
        self.0.read().await.summary(Utc::now())
    }
}
