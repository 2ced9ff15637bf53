use serde::{Deserialize, Serialize};
use tracing::warn;

use common::{Error, Result};

/// Strategy config file (TOML). Every field is optional.
///
/// Example `config/strategies.toml`:
/// ```toml
/// enabled = ["rsi", "zigzag", "color", "ema"]
/// min_history = 25
///
/// [rsi]
/// period = 3
/// oversold = 30.0
/// overbought = 70.0
/// max_lookback = 3
///
/// [zigzag]
/// depth = 20
/// deviation = 20.0
/// backstep = 20
///
/// [ema]
/// period = 20
/// trend_filter = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyFileConfig {
    /// Strategy names or aliases; unknown entries are dropped.
    pub enabled: Vec<String>,
    /// Closed candles required before any strategy is consulted.
    pub min_history: usize,
    pub rsi: RsiParams,
    pub zigzag: ZigZagParams,
    pub ema: EmaParams,
}

impl Default for StrategyFileConfig {
    fn default() -> Self {
        Self {
            enabled: StrategyKind::DEFAULT_SET
                .iter()
                .map(|k| k.as_str().to_string())
                .collect(),
            min_history: 25,
            rsi: RsiParams::default(),
            zigzag: ZigZagParams::default(),
            ema: EmaParams::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
    /// How many bars back (latest included) an extreme reading may sit.
    pub max_lookback: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 3,
            oversold: 30.0,
            overbought: 70.0,
            max_lookback: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ZigZagParams {
    pub depth: usize,
    /// Absolute price tolerance around the window extremes.
    pub deviation: f64,
    pub backstep: usize,
}

impl Default for ZigZagParams {
    fn default() -> Self {
        Self {
            depth: 20,
            deviation: 20.0,
            backstep: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmaParams {
    pub period: usize,
    pub trend_filter: bool,
}

impl Default for EmaParams {
    fn default() -> Self {
        Self {
            period: 20,
            trend_filter: true,
        }
    }
}

/// Known strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Rsi,
    ZigZag,
    ColorPattern,
    Ema,
    Majority,
}

impl StrategyKind {
    /// Enabled when nothing usable is configured. The three-candle majority
    /// vote is opt-in.
    pub const DEFAULT_SET: [StrategyKind; 4] = [
        StrategyKind::Rsi,
        StrategyKind::ZigZag,
        StrategyKind::ColorPattern,
        StrategyKind::Ema,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Rsi => "rsi",
            StrategyKind::ZigZag => "zigzag",
            StrategyKind::ColorPattern => "color",
            StrategyKind::Ema => "ema",
            StrategyKind::Majority => "majority",
        }
    }

    pub fn from_alias(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rsi" | "r" => Some(StrategyKind::Rsi),
            "zigzag" | "zz" | "z" => Some(StrategyKind::ZigZag),
            "color" | "color_pattern" | "pattern" | "cp" => Some(StrategyKind::ColorPattern),
            "ema" | "e" => Some(StrategyKind::Ema),
            "majority" | "three_candle" | "3c" => Some(StrategyKind::Majority),
            _ => None,
        }
    }

    /// Resolve a list of names, dropping unknowns and duplicates.
    /// `"all"`, an empty list, or a list with nothing recognisable yields
    /// [`StrategyKind::DEFAULT_SET`].
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Vec<StrategyKind> {
        let mut kinds = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if matches!(name.to_lowercase().as_str(), "all" | "a") {
                return StrategyKind::DEFAULT_SET.to_vec();
            }
            match StrategyKind::from_alias(name) {
                Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Some(_) => {}
                None => warn!(name, "Unknown strategy name ignored"),
            }
        }
        if kinds.is_empty() {
            StrategyKind::DEFAULT_SET.to_vec()
        } else {
            kinds
        }
    }
}

impl StrategyFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read strategy config at '{path}': {e}"))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("Failed to parse strategy config at '{path}': {e}")))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Replace `enabled` with a comma separated override (e.g. `"rsi,zz"` or `"all"`).
    pub fn with_override(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            self.enabled = raw.split(',').map(|s| s.trim().to_string()).collect();
        }
        self
    }

    pub fn enabled_kinds(&self) -> Vec<StrategyKind> {
        StrategyKind::resolve(self.enabled.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = StrategyFileConfig::from_toml("").unwrap();
        assert_eq!(cfg.min_history, 25);
        assert_eq!(cfg.rsi.period, 3);
        assert_eq!(cfg.zigzag.depth, 20);
        assert!(cfg.ema.trend_filter);
        assert_eq!(cfg.enabled_kinds(), StrategyKind::DEFAULT_SET.to_vec());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = StrategyFileConfig::from_toml(
            r#"
            enabled = ["zz", "majority"]

            [zigzag]
            depth = 12
            deviation = 0.0005
            "#,
        )
        .unwrap();
        assert_eq!(cfg.zigzag.depth, 12);
        assert_eq!(cfg.zigzag.backstep, 20);
        assert_eq!(
            cfg.enabled_kinds(),
            vec![StrategyKind::ZigZag, StrategyKind::Majority]
        );
    }

    #[test]
    fn aliases_unknowns_and_all() {
        assert_eq!(
            StrategyKind::resolve(&["R", "cp", "bogus", "rsi"]),
            vec![StrategyKind::Rsi, StrategyKind::ColorPattern]
        );
        assert_eq!(StrategyKind::resolve(&["bogus"]), StrategyKind::DEFAULT_SET.to_vec());
        assert_eq!(StrategyKind::resolve(&["all"]), StrategyKind::DEFAULT_SET.to_vec());
    }

    #[test]
    fn override_replaces_enabled_list() {
        let cfg = StrategyFileConfig::default().with_override(Some("ema, e"));
        assert_eq!(cfg.enabled_kinds(), vec![StrategyKind::Ema]);
        let cfg = StrategyFileConfig::default().with_override(None);
        assert_eq!(cfg.enabled_kinds().len(), 4);
    }
}
