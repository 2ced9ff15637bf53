use std::time::Duration;

use chrono::FixedOffset;
use tracing::warn;

use crate::{Error, PollPolicy, Result, ScanPolicy, MAX_RETRY_STEPS};

const DEFAULT_OTC_API_URL: &str = "https://freegiveway.net/otcx.php";

/// All configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: i64,
    pub telegram_allowed_user_ids: Vec<i64>,
    pub tag_user: String,
    pub bot_name: String,

    // Scanning
    pub assets: Vec<String>,
    pub max_retry_steps: u8,
    pub scan_policy: ScanPolicy,
    pub scan_cycles: Option<u64>,
    pub fetch_count: usize,
    pub poll: PollPolicy,
    pub rng_seed: Option<u64>,

    // Candle feed
    pub otc_api_url: String,
    pub market_offset: FixedOffset,

    // Strategies
    pub strategy_config_path: Option<String>,
    /// Raw `STRATEGIES` override, parsed by the strategy crate.
    pub strategies_override: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let telegram_chat_id = parse_i64("TELEGRAM_CHAT_ID", &required_env("TELEGRAM_CHAT_ID")?)?;

        let telegram_allowed_user_ids = match optional_env("TELEGRAM_ALLOWED_USER_IDS") {
            Some(raw) => parse_id_list(&raw)?,
            None => vec![telegram_chat_id],
        };

        let assets = parse_assets(&required_env("ASSETS")?);
        if assets.is_empty() {
            return Err(Error::Config("ASSETS must name at least one instrument".into()));
        }

        let scan_policy = match optional_env("SCAN_POLICY") {
            Some(raw) => raw.parse().map_err(Error::Config)?,
            None => ScanPolicy::default(),
        };

        let offset_minutes: i32 = parse_or("MARKET_UTC_OFFSET_MINUTES", 360)?;
        let market_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            Error::Config(format!("MARKET_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))
        })?;

        let poll = PollPolicy {
            max_attempts: parse_or("POLL_ATTEMPTS", 120)?,
            interval: Duration::from_secs(parse_or("POLL_INTERVAL_SECS", 2)?),
            fetch_count: PollPolicy::default().fetch_count,
        };

        Ok(Config {
            telegram_token: required_env("TELEGRAM_TOKEN")?,
            telegram_chat_id,
            telegram_allowed_user_ids,
            tag_user: optional_env("TAG_USER").unwrap_or_default(),
            bot_name: optional_env("BOT_NAME").unwrap_or_else(|| "CandleCall".to_string()),
            assets,
            max_retry_steps: parse_mtg_steps(optional_env("MTG_STEPS").as_deref()),
            scan_policy,
            scan_cycles: optional_env("SCAN_CYCLES")
                .map(|v| parse_u64("SCAN_CYCLES", &v))
                .transpose()?,
            fetch_count: parse_or("FETCH_COUNT", 60)?,
            poll,
            rng_seed: optional_env("RNG_SEED")
                .map(|v| parse_u64("RNG_SEED", &v))
                .transpose()?,
            otc_api_url: optional_env("OTC_API_URL")
                .unwrap_or_else(|| DEFAULT_OTC_API_URL.to_string()),
            market_offset,
            strategy_config_path: optional_env("STRATEGY_CONFIG_PATH"),
            strategies_override: optional_env("STRATEGIES"),
        })
    }
}

/// Comma separated instrument list; blanks dropped.
pub fn parse_assets(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// MTG step count. Missing means 1; anything outside 0..=2 falls back to 0.
pub fn parse_mtg_steps(raw: Option<&str>) -> u8 {
    let Some(raw) = raw else {
        return 1;
    };
    match raw.trim().parse::<u8>() {
        Ok(v) if v <= MAX_RETRY_STEPS => v,
        _ => {
            warn!(value = raw, "Invalid MTG_STEPS, using 0");
            0
        }
    }
}

fn parse_id_list(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_i64("TELEGRAM_ALLOWED_USER_IDS", s))
        .collect()
}

fn parse_i64(key: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} contains non-numeric value: '{value}'")))
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got '{value}'")))
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match optional_env(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{v}'"))),
        None => Ok(default),
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assets_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            parse_assets(" EURUSD_otc, ,GBPJPY_otc ,"),
            vec!["EURUSD_otc".to_string(), "GBPJPY_otc".to_string()]
        );
        assert!(parse_assets(" , ").is_empty());
    }

    #[test]
    fn mtg_steps_default_and_fallback() {
        assert_eq!(parse_mtg_steps(None), 1);
        assert_eq!(parse_mtg_steps(Some("2")), 2);
        assert_eq!(parse_mtg_steps(Some("0")), 0);
        assert_eq!(parse_mtg_steps(Some("3")), 0);
        assert_eq!(parse_mtg_steps(Some("two")), 0);
    }

    #[test]
    fn id_list_rejects_non_numeric() {
        assert_eq!(parse_id_list("1, 2").unwrap(), vec![1, 2]);
        assert!(matches!(parse_id_list("1,abc"), Err(Error::Config(_))));
    }
}
