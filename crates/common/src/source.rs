use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{Candle, PollPolicy, Result};

/// Abstraction over the market-data endpoint.
///
/// `OtcClient` implements this for the live feed; tests script their own.
/// Only the scheduler and the outcome resolver hold a `dyn CandleSource`.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch up to `count` recent candles for `instrument`, oldest first.
    ///
    /// Empty, missing or malformed payloads are reported as errors; callers
    /// treat any error as "no data this cycle".
    async fn fetch(&self, instrument: &str, count: usize) -> Result<Vec<Candle>>;

    /// Poll until the closed candle opening at `target` shows up.
    ///
    /// Returns `None` after `policy.max_attempts` attempts. Fetch errors count
    /// as a failed attempt.
    async fn find_at_minute(
        &self,
        instrument: &str,
        target: DateTime<Utc>,
        policy: &PollPolicy,
    ) -> Option<Candle> {
        for attempt in 1..=policy.max_attempts {
            debug!(instrument, attempt, max = policy.max_attempts, target = %target, "Polling for candle");
            match self.fetch(instrument, policy.fetch_count).await {
                Ok(candles) => {
                    let now = Utc::now();
                    if let Some(candle) = candles
                        .into_iter()
                        .find(|c| c.minute() == target && c.is_closed(now))
                    {
                        debug!(instrument, target = %target, attempt, "Candle found");
                        return Some(candle);
                    }
                }
                Err(e) => {
                    warn!(instrument, attempt, error = %e, "Fetch failed while polling");
                }
            }
            if attempt < policy.max_attempts {
                tokio::time::sleep(policy.interval).await;
            }
        }
        warn!(
            instrument,
            target = %target,
            attempts = policy.max_attempts,
            "Candle not found within polling budget"
        );
        None
    }
}

/// Outbound delivery of rendered report text.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn emit(&self, text: &str) -> Result<()>;
}
