use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, DurationRound, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on martingale escalations after the entry candle.
pub const MAX_RETRY_STEPS: u8 = 2;

/// One-minute OHLC candle as delivered by the candle source.
///
/// Closure is not stored: a candle is closed once its minute has fully
/// elapsed, see [`Candle::is_closed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Opening minute of the candle, in the market's zone.
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(timestamp: DateTime<FixedOffset>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// True once `now` is at or past the end of the candle's minute.
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.timestamp.with_timezone(&Utc) + Duration::minutes(1)
    }

    /// The candle's minute in UTC, seconds dropped.
    pub fn minute(&self) -> DateTime<Utc> {
        floor_minute(self.timestamp.with_timezone(&Utc))
    }

    pub fn color(&self) -> CandleColor {
        if self.close > self.open {
            CandleColor::Green
        } else if self.close < self.open {
            CandleColor::Red
        } else {
            CandleColor::Doji
        }
    }

    /// Direction of the candle body. `None` for a flat (doji) candle.
    pub fn direction(&self) -> Option<Direction> {
        match self.color() {
            CandleColor::Green => Some(Direction::Call),
            CandleColor::Red => Some(Direction::Put),
            CandleColor::Doji => None,
        }
    }
}

/// Body colour of a candle: close above, below or equal to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CandleColor {
    Green,
    Red,
    Doji,
}

/// Sort chronologically and keep one candle per minute (the last one seen).
pub fn normalize_series(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.minute());
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        match out.last_mut() {
            Some(last) if last.minute() == candle.minute() => *last = candle,
            _ => out.push(candle),
        }
    }
    out
}

/// Normalised series restricted to candles already closed at `now`.
pub fn closed_series(candles: Vec<Candle>, now: DateTime<Utc>) -> Vec<Candle> {
    normalize_series(candles)
        .into_iter()
        .filter(|c| c.is_closed(now))
        .collect()
}

pub fn floor_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::minutes(1)).unwrap_or(t)
}

/// Predicted price direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Call,
    Put,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Call => write!(f, "CALL"),
            Direction::Put => write!(f, "PUT"),
        }
    }
}

/// A strategy-derived prediction awaiting confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub asset: String,
    pub emitted_at: DateTime<Utc>,
    pub direction: Direction,
    pub strategy: String,
}

impl Signal {
    pub fn new(
        asset: impl Into<String>,
        emitted_at: DateTime<Utc>,
        direction: Direction,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            asset: asset.into(),
            emitted_at,
            direction,
            strategy: strategy.into(),
        }
    }

    /// Minute of the first candle the trade is placed on.
    pub fn entry_minute(&self) -> DateTime<Utc> {
        floor_minute(self.emitted_at) + Duration::minutes(1)
    }

    /// Minute of the candle that confirms the signal at retry `step`.
    pub fn confirmation_minute(&self, step: u8) -> DateTime<Utc> {
        self.entry_minute() + Duration::minutes(i64::from(step))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeResult {
    Win,
    Loss,
}

impl std::fmt::Display for TradeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeResult::Win => write!(f, "WIN"),
            TradeResult::Loss => write!(f, "LOSS"),
        }
    }
}

/// Terminal verdict for one signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub asset: String,
    pub signal_time: DateTime<Utc>,
    pub direction: Direction,
    pub strategy: String,
    pub result: TradeResult,
    /// Retry step at which the verdict was reached (0 = entry candle).
    pub step: u8,
}

impl Outcome {
    pub fn from_signal(signal: &Signal, result: TradeResult, step: u8) -> Self {
        Self {
            asset: signal.asset.clone(),
            signal_time: signal.emitted_at,
            direction: signal.direction,
            strategy: signal.strategy.clone(),
            result,
            step,
        }
    }

    pub fn entry_minute(&self) -> DateTime<Utc> {
        floor_minute(self.signal_time) + Duration::minutes(1)
    }
}

/// Running win/loss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u64,
    pub losses: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.wins + self.losses
    }

    /// Win percentage rounded to one decimal; 0.0 with no trades.
    pub fn win_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.wins as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

/// Bounded polling budget for confirmation candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: StdDuration,
    /// Candles requested per polling attempt.
    pub fetch_count: usize,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            interval: StdDuration::from_secs(2),
            fetch_count: 12,
        }
    }
}

/// How the scheduler walks the asset list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanPolicy {
    /// One asset per cycle, in configured order.
    #[default]
    RoundRobin,
    /// Every asset each cycle, in a freshly shuffled order.
    ShuffleAll,
}

impl std::str::FromStr for ScanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "round-robin" | "roundrobin" | "rr" => Ok(ScanPolicy::RoundRobin),
            "shuffle" | "shuffle-all" | "all" => Ok(ScanPolicy::ShuffleAll),
            other => Err(format!("unknown scan policy '{other}'")),
        }
    }
}

impl std::fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanPolicy::RoundRobin => write!(f, "round-robin"),
            ScanPolicy::ShuffleAll => write!(f, "shuffle"),
        }
    }
}

/// Out-of-band operator commands, checked between scan cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    /// Emit the session summary and halt.
    Stop,
    /// Emit the session summary and keep scanning.
    Summary,
}

impl EngineCommand {
    /// Parse an operator line. Case-insensitive, leading `/` allowed.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().trim_start_matches('/').to_lowercase();
        match word.as_str() {
            "off" | "stop" => Some(EngineCommand::Stop),
            "status" | "summary" => Some(EngineCommand::Summary),
            _ => None,
        }
    }
}
