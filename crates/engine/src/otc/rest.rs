use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use common::{normalize_series, Candle, CandleSource, Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// REST client for the OTC candle endpoint.
///
/// `GET {base_url}?pair=<instrument>&count=<n>` answers with
/// `{"data": [{"time", "open", "high", "low", "close"}, ...]}`. Prices may be
/// JSON numbers or strings; times carry no zone and are read in `offset`.
pub struct OtcClient {
    base_url: String,
    offset: FixedOffset,
    http: Client,
}

impl OtcClient {
    pub fn new(base_url: impl Into<String>, offset: FixedOffset) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            offset,
            http,
        })
    }

    async fn get(&self, instrument: &str, count: usize) -> Result<String> {
        let count = count.to_string();
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("pair", instrument), ("count", count.as_str())])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Source(format!("HTTP {status}: {}", snippet(&body))));
        }
        Ok(body)
    }
}

#[async_trait]
impl CandleSource for OtcClient {
    async fn fetch(&self, instrument: &str, count: usize) -> Result<Vec<Candle>> {
        debug!(instrument, count, "Fetching OTC candles");
        let body = self.get(instrument, count).await?;
        let candles = parse_candles(&body, self.offset)?;
        debug!(instrument, received = candles.len(), "OTC candles received");
        Ok(normalize_series(candles))
    }
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    data: Option<Vec<RawCandle>>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    time: String,
    open: Price,
    high: Price,
    low: Price,
    close: Price,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    fn value(&self, field: &str) -> Result<f64> {
        match self {
            Price::Number(v) => Ok(*v),
            Price::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::Parse(format!("{field} is not a number: '{s}'"))),
        }
    }
}

/// Decode an OTC response body into candles (not yet normalised).
pub fn parse_candles(body: &str, offset: FixedOffset) -> Result<Vec<Candle>> {
    if body.trim().is_empty() {
        return Err(Error::Source("empty response".into()));
    }
    let resp: CandleResponse = serde_json::from_str(body)
        .map_err(|e| Error::Parse(format!("{e}: {}", snippet(body))))?;
    let rows = resp
        .data
        .ok_or_else(|| Error::Source("response has no 'data' field".into()))?;

    rows.iter()
        .map(|row| {
            Ok(Candle::new(
                parse_time(&row.time, offset)?,
                row.open.value("open")?,
                row.high.value("high")?,
                row.low.value("low")?,
                row.close.value("close")?,
            ))
        })
        .collect()
}

/// Accepts `YYYY-MM-DD HH:MM[:SS]`, a `T` separator and a fractional part.
pub fn parse_time(raw: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let cleaned = raw.trim().replace('T', " ");
    let cleaned = cleaned.split('.').next().unwrap_or_default();
    let naive = NaiveDateTime::parse_from_str(cleaned, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(cleaned, "%Y-%m-%d %H:%M"))
        .map_err(|_| Error::Parse(format!("unrecognised candle time '{raw}'")))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| Error::Parse(format!("ambiguous candle time '{raw}'")))
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(100) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
