use std::sync::Arc;
use std::time::Duration;

use chrono::{Timelike, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use common::{closed_series, CandleSource, EngineCommand, Outcome, Report, ScanPolicy, Signal};
use strategy::StrategyEngine;

use crate::reporter::Reporter;
use crate::resolver::OutcomeResolver;
use crate::session::SessionHandle;

/// Minimum pause before the next cycle; avoids firing twice on one boundary.
const MIN_ALIGNMENT_SECS: u64 = 5;

/// Seconds to sleep so the next cycle starts on a minute boundary.
///
/// `60 - second`, plus another minute when that is under five seconds.
pub fn alignment_sleep(second: u32) -> Duration {
    let raw = 60 - u64::from(second.min(59));
    if raw < MIN_ALIGNMENT_SECS {
        Duration::from_secs(raw + 60)
    } else {
        Duration::from_secs(raw)
    }
}

/// Static scan settings.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub assets: Vec<String>,
    pub policy: ScanPolicy,
    /// Candles fetched per analysis.
    pub fetch_count: usize,
    /// Stop after this many cycles; `None` runs until stopped.
    pub max_cycles: Option<u64>,
}

/// Why the scan loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanExit {
    Stopped,
    CyclesExhausted,
}

/// Sequential scan loop: one cycle per minute boundary, assets processed one
/// after another, each signal resolved before the next asset is looked at.
pub struct Scheduler {
    settings: ScanSettings,
    source: Arc<dyn CandleSource>,
    strategies: StrategyEngine,
    resolver: OutcomeResolver,
    session: SessionHandle,
    reporter: Reporter,
    command_rx: mpsc::Receiver<EngineCommand>,
    rng: StdRng,
    next_asset: usize,
}

impl Scheduler {
    pub fn new(
        settings: ScanSettings,
        source: Arc<dyn CandleSource>,
        strategies: StrategyEngine,
        resolver: OutcomeResolver,
        session: SessionHandle,
        reporter: Reporter,
        command_rx: mpsc::Receiver<EngineCommand>,
    ) -> Self {
        Self {
            settings,
            source,
            strategies,
            resolver,
            session,
            reporter,
            command_rx,
            rng: StdRng::from_entropy(),
            next_asset: 0,
        }
    }

    /// Seed the asset shuffle used by [`ScanPolicy::ShuffleAll`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Run until a stop command or the cycle cap. Call from `tokio::spawn`.
    ///
    /// Commands are checked at the start of each cycle, so a stop lands
    /// after the current signal has reached its verdict. The summary is
    /// emitted on every exit path.
    pub async fn run(mut self) -> ScanExit {
        info!(
            assets = ?self.settings.assets,
            policy = %self.settings.policy,
            strategies = ?self.strategies.strategy_names(),
            mtg_steps = self.resolver.max_steps(),
            "Scheduler running"
        );

        let mut cycle: u64 = 0;
        let exit = loop {
            match self.pending_command() {
                Some(EngineCommand::Stop) => {
                    info!("Stop command received");
                    break ScanExit::Stopped;
                }
                Some(EngineCommand::Summary) => {
                    info!("Summary requested");
                    self.emit_summary().await;
                }
                None => {}
            }

            cycle += 1;
            debug!(cycle, "Scan cycle start");
            for asset in self.cycle_assets() {
                self.process_asset(&asset).await;
            }

            if self.settings.max_cycles.is_some_and(|max| cycle >= max) {
                info!(cycles = cycle, "Cycle limit reached");
                break ScanExit::CyclesExhausted;
            }

            let pause = alignment_sleep(Utc::now().second());
            debug!(secs = pause.as_secs(), "Sleeping until next minute");
            tokio::time::sleep(pause).await;
        };

        self.emit_summary().await;
        exit
    }

    /// Drain queued commands without blocking. A stop wins over summaries.
    fn pending_command(&mut self) -> Option<EngineCommand> {
        let mut found = None;
        loop {
            match self.command_rx.try_recv() {
                Ok(EngineCommand::Stop) => return Some(EngineCommand::Stop),
                Ok(cmd) => found = Some(cmd),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return found,
            }
        }
    }

    fn cycle_assets(&mut self) -> Vec<String> {
        let assets = &self.settings.assets;
        if assets.is_empty() {
            return Vec::new();
        }
        match self.settings.policy {
            ScanPolicy::RoundRobin => {
                let asset = assets[self.next_asset % assets.len()].clone();
                self.next_asset = (self.next_asset + 1) % assets.len();
                vec![asset]
            }
            ScanPolicy::ShuffleAll => {
                let mut all = assets.clone();
                all.shuffle(&mut self.rng);
                all
            }
        }
    }

    /// Fetch, evaluate and, on a signal, resolve it. Fetch failures and
    /// unusable data count as no signal.
    async fn process_asset(&mut self, asset: &str) -> Option<Outcome> {
        let candles = match self.source.fetch(asset, self.settings.fetch_count).await {
            Ok(c) => c,
            Err(e) => {
                warn!(asset, error = %e, "Candle fetch failed, skipping");
                return None;
            }
        };

        let closed = closed_series(candles, Utc::now());
        let Some(choice) = self.strategies.choose(asset, &closed) else {
            info!(asset, candles = closed.len(), "No signal");
            return None;
        };

        let signal = Signal::new(asset, Utc::now(), choice.direction, choice.strategy);
        info!(
            asset,
            signal_id = %signal.id,
            strategy = %signal.strategy,
            direction = %signal.direction,
            "Signal generated"
        );
        Some(self.resolver.run(signal).await)
    }

    async fn emit_summary(&self) {
        let summary = self.session.summary().await;
        self.reporter.send(Report::Summary(summary));
    }
}
