use std::sync::Arc;

use tracing::{info, warn};

use common::{
    CandleSource, Direction, Outcome, PollPolicy, Report, Signal, TradeResult, MAX_RETRY_STEPS,
};

use crate::reporter::Reporter;
use crate::session::SessionHandle;

/// Where an announced signal is on its way to a verdict.
///
/// `Awaiting{0} -> .. -> Awaiting{max} -> Finished`. Step `n` waits on the
/// candle opening `n + 1` minutes after the signal minute. The announcement
/// itself is emitted before the machine starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Awaiting { step: u8 },
    Finished { result: TradeResult, step: u8 },
}

/// What polling produced for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// No closed candle for the target minute within the polling budget.
    Missing,
    /// Body direction of the candle; `None` for a flat candle.
    Observed(Option<Direction>),
}

impl ResolverState {
    /// State right after the signal was announced: waiting on the entry candle.
    pub const START: ResolverState = ResolverState::Awaiting { step: 0 };

    /// Apply one transition. `Finished` is absorbing.
    pub fn next(self, confirmation: Confirmation, expected: Direction, max_steps: u8) -> Self {
        match self {
            ResolverState::Awaiting { step } => match confirmation {
                Confirmation::Missing => ResolverState::Finished {
                    result: TradeResult::Loss,
                    step,
                },
                Confirmation::Observed(Some(d)) if d == expected => ResolverState::Finished {
                    result: TradeResult::Win,
                    step,
                },
                Confirmation::Observed(_) if step < max_steps => {
                    ResolverState::Awaiting { step: step + 1 }
                }
                Confirmation::Observed(_) => ResolverState::Finished {
                    result: TradeResult::Loss,
                    step,
                },
            },
            finished @ ResolverState::Finished { .. } => finished,
        }
    }
}

/// Drives one signal from announcement to a WIN/LOSS verdict.
#[derive(Clone)]
pub struct OutcomeResolver {
    source: Arc<dyn CandleSource>,
    session: SessionHandle,
    reporter: Reporter,
    poll: PollPolicy,
    max_steps: u8,
}

impl OutcomeResolver {
    /// `max_steps` is clamped to [`MAX_RETRY_STEPS`].
    pub fn new(
        source: Arc<dyn CandleSource>,
        session: SessionHandle,
        reporter: Reporter,
        poll: PollPolicy,
        max_steps: u8,
    ) -> Self {
        if max_steps > MAX_RETRY_STEPS {
            warn!(max_steps, cap = MAX_RETRY_STEPS, "MTG steps above cap, clamping");
        }
        Self {
            source,
            session,
            reporter,
            poll,
            max_steps: max_steps.min(MAX_RETRY_STEPS),
        }
    }

    pub fn max_steps(&self) -> u8 {
        self.max_steps
    }

    /// Announce `signal`, poll confirmation candles, record and report the
    /// outcome.
    ///
    /// A confirmation candle that cannot be found in time is a LOSS at the
    /// current step; no later step is attempted.
    pub async fn run(&self, signal: Signal) -> Outcome {
        self.reporter.send(Report::SignalAnnounced(signal.clone()));

        let mut state = ResolverState::START;
        let (result, step) = loop {
            match state {
                ResolverState::Finished { result, step } => break (result, step),
                ResolverState::Awaiting { step } => {
                    let target = signal.confirmation_minute(step);
                    info!(
                        asset = %signal.asset,
                        signal_id = %signal.id,
                        step,
                        target = %target,
                        "Awaiting confirmation candle"
                    );

                    let confirmation = match self
                        .source
                        .find_at_minute(&signal.asset, target, &self.poll)
                        .await
                    {
                        Some(candle) => Confirmation::Observed(candle.direction()),
                        None => Confirmation::Missing,
                    };
                    state = state.next(confirmation, signal.direction, self.max_steps);
                }
            }
        };

        let outcome = Outcome::from_signal(&signal, result, step);
        let tally = self.session.record(outcome.clone()).await;
        info!(
            asset = %outcome.asset,
            signal_id = %signal.id,
            result = %result,
            step,
            wins = tally.wins,
            losses = tally.losses,
            "Signal resolved"
        );
        self.reporter.send(Report::OutcomeResolved {
            outcome: outcome.clone(),
            tally,
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use common::{Candle, Error, Result};

    use super::*;

    /// Answers confirmation polls from a per-minute script.
    /// Minutes missing from the script are "not found".
    struct Scripted {
        script: HashMap<DateTime<Utc>, Option<Direction>>,
        asked: Mutex<Vec<DateTime<Utc>>>,
    }

    impl Scripted {
        fn new(signal: &Signal, steps: &[Option<Option<Direction>>]) -> Self {
            let script = steps
                .iter()
                .enumerate()
                .filter_map(|(i, s)| s.map(|d| (signal.confirmation_minute(i as u8), d)))
                .collect();
            Self {
                script,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CandleSource for Scripted {
        async fn fetch(&self, _: &str, _: usize) -> Result<Vec<Candle>> {
            Err(Error::Source("not used".into()))
        }

        async fn find_at_minute(&self, _: &str, target: DateTime<Utc>, _: &PollPolicy) -> Option<Candle> {
            self.asked.lock().unwrap().push(target);
            let direction = self.script.get(&target).copied()?;
            let (open, close) = match direction {
                Some(Direction::Call) => (1.0, 1.1),
                Some(Direction::Put) => (1.1, 1.0),
                None => (1.0, 1.0),
            };
            Some(Candle::new(target.fixed_offset(), open, 1.2, 0.9, close))
        }
    }

    const CALL: Option<Option<Direction>> = Some(Some(Direction::Call));
    const PUT: Option<Option<Direction>> = Some(Some(Direction::Put));
    const FLAT: Option<Option<Direction>> = Some(None);
    const MISSING: Option<Option<Direction>> = None;

    fn call_signal() -> Signal {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 6, 10, 17).unwrap();
        Signal::new("EURUSD_otc", at, Direction::Call, "RSI")
    }

    type Resolved = (Outcome, Vec<DateTime<Utc>>, Vec<Report>, usize);

    async fn resolve(max_steps: u8, steps: &[Option<Option<Direction>>]) -> Resolved {
        let signal = call_signal();
        let source = Arc::new(Scripted::new(&signal, steps));
        let session = SessionHandle::new();
        let (reporter, mut rx) = Reporter::channel(16);
        let resolver = OutcomeResolver::new(
            source.clone(),
            session.clone(),
            reporter,
            PollPolicy::default(),
            max_steps,
        );

        let outcome = resolver.run(signal).await;
        drop(resolver);

        let mut reports = Vec::new();
        while let Some(r) = rx.recv().await {
            reports.push(r);
        }
        let asked = source.asked.lock().unwrap().clone();
        (outcome, asked, reports, session.len().await)
    }

    #[test]
    fn transitions() {
        let s = ResolverState::Awaiting { step: 0 };
        assert_eq!(
            s.next(Confirmation::Observed(Some(Direction::Put)), Direction::Put, 0),
            ResolverState::Finished { result: TradeResult::Win, step: 0 }
        );
        assert_eq!(
            s.next(Confirmation::Observed(None), Direction::Put, 1),
            ResolverState::Awaiting { step: 1 }
        );
        assert_eq!(
            s.next(Confirmation::Missing, Direction::Put, 2),
            ResolverState::Finished { result: TradeResult::Loss, step: 0 }
        );
        let done = ResolverState::Finished { result: TradeResult::Win, step: 1 };
        assert_eq!(done.next(Confirmation::Missing, Direction::Call, 2), done);
        assert_eq!(ResolverState::START, ResolverState::Awaiting { step: 0 });
    }

    #[tokio::test]
    async fn no_mtg_match_wins_at_step_zero() {
        let (outcome, asked, _, _) = resolve(0, &[CALL]).await;
        assert_eq!(outcome.result, TradeResult::Win);
        assert_eq!(outcome.step, 0);
        assert_eq!(asked.len(), 1);
    }

    #[tokio::test]
    async fn no_mtg_mismatch_loses_at_step_zero() {
        let (outcome, asked, _, _) = resolve(0, &[PUT, CALL]).await;
        assert_eq!(outcome.result, TradeResult::Loss);
        assert_eq!(outcome.step, 0);
        assert_eq!(asked.len(), 1);
    }

    #[tokio::test]
    async fn flat_candle_never_confirms() {
        let (outcome, _, _, _) = resolve(0, &[FLAT]).await;
        assert_eq!(outcome.result, TradeResult::Loss);
    }

    #[tokio::test]
    async fn two_steps_win_on_last() {
        let (outcome, asked, _, _) = resolve(2, &[PUT, FLAT, CALL]).await;
        assert_eq!(outcome.result, TradeResult::Win);
        assert_eq!(outcome.step, 2);
        let signal = call_signal();
        assert_eq!(
            asked,
            vec![
                signal.confirmation_minute(0),
                signal.confirmation_minute(1),
                signal.confirmation_minute(2)
            ]
        );
        // 06:10:17 signal: entry candle opens at 06:11.
        assert_eq!(asked[0], Utc.with_ymd_and_hms(2025, 3, 1, 6, 11, 0).unwrap());
        assert_eq!(asked[2] - asked[0], Duration::minutes(2));
    }

    #[tokio::test]
    async fn two_steps_all_mismatch_loses_at_two() {
        let (outcome, asked, _, _) = resolve(2, &[PUT, PUT, PUT, CALL]).await;
        assert_eq!(outcome.result, TradeResult::Loss);
        assert_eq!(outcome.step, 2);
        assert_eq!(asked.len(), 3);
    }

    #[tokio::test]
    async fn missing_candle_at_step_one_stops_there() {
        let (outcome, asked, _, _) = resolve(2, &[PUT, MISSING, CALL]).await;
        assert_eq!(outcome.result, TradeResult::Loss);
        assert_eq!(outcome.step, 1);
        assert_eq!(asked.len(), 2);
    }

    #[tokio::test]
    async fn steps_above_cap_are_clamped() {
        let (outcome, asked, _, _) = resolve(9, &[PUT, PUT, PUT, CALL]).await;
        assert_eq!(outcome.step, MAX_RETRY_STEPS);
        assert_eq!(asked.len(), 3);
    }

    #[tokio::test]
    async fn announces_then_reports_and_records_once() {
        let (outcome, _, reports, recorded) = resolve(1, &[PUT, CALL]).await;
        assert_eq!(recorded, 1);
        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[0], Report::SignalAnnounced(_)));
        match &reports[1] {
            Report::OutcomeResolved { outcome: reported, tally } => {
                assert_eq!(reported.result, outcome.result);
                assert_eq!(reported.step, 1);
                assert_eq!(tally.wins, 1);
                assert_eq!(tally.losses, 0);
            }
            other => panic!("unexpected report {other:?}"),
        }
    }
}
