use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::{Direction, Outcome, Signal, Tally, TradeResult};

/// Facts handed to the reporting side. Rendering never changes a verdict.
#[derive(Debug, Clone)]
pub enum Report {
    SignalAnnounced(Signal),
    OutcomeResolved { outcome: Outcome, tally: Tally },
    Summary(SessionSummary),
}

/// Snapshot of the run history taken at a point in time.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub generated_at: DateTime<Utc>,
    pub outcomes: Vec<Outcome>,
    pub tally: Tally,
}

impl SessionSummary {
    pub fn total(&self) -> u64 {
        self.tally.total()
    }

    pub fn win_rate(&self) -> f64 {
        self.tally.win_rate()
    }
}

/// Renders reports as plain text for the notifier.
#[derive(Debug, Clone)]
pub struct ReportTemplate {
    pub bot_name: String,
    /// Handle or id appended as a feedback tag; empty to omit.
    pub tag: String,
    /// Zone used for displayed times.
    pub offset: FixedOffset,
    pub max_retry_steps: u8,
}

impl ReportTemplate {
    pub fn render(&self, report: &Report) -> String {
        match report {
            Report::SignalAnnounced(signal) => self.render_signal(signal),
            Report::OutcomeResolved { outcome, tally } => self.render_outcome(outcome, tally),
            Report::Summary(summary) => self.render_summary(summary),
        }
    }

    fn hhmm(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.offset).format("%H:%M").to_string()
    }

    fn tag_line(&self, label: &str) -> Option<String> {
        (!self.tag.is_empty()).then(|| format!("{label}: {}", self.tag))
    }

    fn render_signal(&self, signal: &Signal) -> String {
        let entry = signal.entry_minute();
        let mut lines = vec![
            format!("== {} SIGNAL ==", self.bot_name),
            String::new(),
            format!("PAIR: {}", signal.asset),
            format!("ENTRY: {}", self.hhmm(entry)),
            format!("EXPIRY: {}", self.hhmm(entry + Duration::minutes(1))),
            format!("DIRECTION: {}", direction_icon(signal.direction)),
            format!("STRATEGY: {}", signal.strategy),
            format!("MTG STEPS: {}", self.max_retry_steps),
        ];
        if let Some(tag) = self.tag_line("OWNER") {
            lines.push(String::new());
            lines.push(tag);
        }
        lines.join("\n")
    }

    fn render_outcome(&self, outcome: &Outcome, tally: &Tally) -> String {
        let verdict = match (outcome.result, outcome.step) {
            (TradeResult::Win, 0) => "RESULT: WIN (NON MTG)".to_string(),
            (TradeResult::Win, step) => format!("RESULT: WIN (MTG {step})"),
            (TradeResult::Loss, _) => "RESULT: LOSS".to_string(),
        };
        let mut lines = vec![
            format!("== {} RESULT ==", self.bot_name),
            String::new(),
            format!("PAIR: {}", outcome.asset),
            format!("ENTRY: {}", self.hhmm(outcome.entry_minute())),
            format!("DIRECTION: {}", direction_icon(outcome.direction)),
            "------------------------------".to_string(),
            format!("WIN: {} / LOSS: {}", tally.wins, tally.losses),
            String::new(),
            verdict,
        ];
        if let Some(tag) = self.tag_line("FEEDBACK") {
            lines.push(tag);
        }
        lines.join("\n")
    }

    fn render_summary(&self, summary: &SessionSummary) -> String {
        let date = summary
            .generated_at
            .with_timezone(&self.offset)
            .format("%Y.%m.%d");
        let body = if summary.outcomes.is_empty() {
            "(no trades)".to_string()
        } else {
            summary
                .outcomes
                .iter()
                .map(|o| {
                    let mark = match o.result {
                        TradeResult::Win => "WIN",
                        TradeResult::Loss => "LOSS",
                    };
                    format!("{} - {} - {}  {mark}", self.hhmm(o.entry_minute()), o.asset, o.direction)
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "== {} RESULTS ==\nDATE: {date}\n------------------------------\n{body}\n------------------------------\nWIN: {} | LOSS: {} | TOTAL: {} | WINRATE: {:.1}%",
            self.bot_name,
            summary.tally.wins,
            summary.tally.losses,
            summary.total(),
            summary.win_rate(),
        )
    }
}

fn direction_icon(direction: Direction) -> &'static str {
    match direction {
        Direction::Call => "🟢 CALL",
        Direction::Put => "🔴 PUT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn template() -> ReportTemplate {
        ReportTemplate {
            bot_name: "CandleCall".into(),
            tag: "@desk".into(),
            offset: FixedOffset::east_opt(6 * 3600).unwrap(),
            max_retry_steps: 1,
        }
    }

    fn signal() -> Signal {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 6, 10, 42).unwrap();
        Signal::new("EURUSD_otc", at, Direction::Put, "ZIGZAG")
    }

    #[test]
    fn signal_shows_entry_and_expiry_in_market_time() {
        let text = template().render(&Report::SignalAnnounced(signal()));
        assert!(text.contains("PAIR: EURUSD_otc"));
        assert!(text.contains("ENTRY: 12:11"), "{text}");
        assert!(text.contains("EXPIRY: 12:12"), "{text}");
        assert!(text.contains("🔴 PUT"));
        assert!(text.contains("OWNER: @desk"));
    }

    #[test]
    fn outcome_line_names_the_mtg_step() {
        let outcome = Outcome::from_signal(&signal(), TradeResult::Win, 1);
        let tally = Tally { wins: 3, losses: 1 };
        let text = template().render(&Report::OutcomeResolved { outcome, tally });
        assert!(text.contains("RESULT: WIN (MTG 1)"));
        assert!(text.contains("WIN: 3 / LOSS: 1"));
    }

    #[test]
    fn empty_summary_reports_zero_rate() {
        let summary = SessionSummary {
            generated_at: Utc::now(),
            outcomes: Vec::new(),
            tally: Tally::default(),
        };
        let text = template().render(&Report::Summary(summary));
        assert!(text.contains("(no trades)"));
        assert!(text.contains("WINRATE: 0.0%"));
    }

    #[test]
    fn summary_lists_each_outcome() {
        let s = signal();
        let summary = SessionSummary {
            generated_at: s.emitted_at,
            outcomes: vec![
                Outcome::from_signal(&s, TradeResult::Win, 0),
                Outcome::from_signal(&s, TradeResult::Loss, 1),
            ],
            tally: Tally { wins: 1, losses: 1 },
        };
        let text = template().render(&Report::Summary(summary));
        assert!(text.contains("12:11 - EURUSD_otc - PUT  WIN"));
        assert!(text.contains("12:11 - EURUSD_otc - PUT  LOSS"));
        assert!(text.contains("WINRATE: 50.0%"));
        assert!(text.contains("DATE: 2025.03.01"));
    }
}
