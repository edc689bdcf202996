//! Alpha Vantage daily time-series provider.
//!
//! One `TIME_SERIES_DAILY` request per ticker with `outputsize=full`; the
//! date range is applied client-side. The payload is checked for provider
//! signals before any price is read:
//!
//! 1. `Error Message` (bad symbol, bad key)
//! 2. `Note` (rate limit)
//! 3. `Information` (premium-tier restriction)
//!
//! Any of these fails the request. A payload without `Time Series (Daily)`
//! is a format error.

use super::fields::{parse_date, parse_price};
use super::provider::{DataError, QuoteTransport};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const PROVIDER_SIGNALS: [&str; 3] = ["Error Message", "Note", "Information"];
const TIME_SERIES_KEY: &str = "Time Series (Daily)";
const CLOSE_KEY: &str = "4. close";

/// Closing prices extracted from one ticker's payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyCloses {
    pub symbol: String,
    /// In-range quotes, ascending by date.
    pub closes: Vec<(NaiveDate, Decimal)>,
    /// Entries dropped for a bad date key or a missing/unparseable close.
    pub skipped: usize,
}

/// Interpret a `TIME_SERIES_DAILY` response body.
///
/// Keeps entries whose date falls in `[start, end]` (inclusive).
pub fn parse_daily_payload(
    symbol: &str,
    body: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DailyCloses, DataError> {
    let json: Value = serde_json::from_str(body).map_err(|e| DataError::Format {
        symbol: symbol.to_string(),
        reason: format!("invalid JSON: {e}"),
    })?;

    let obj = json.as_object().ok_or_else(|| DataError::Format {
        symbol: symbol.to_string(),
        reason: "response is not a JSON object".into(),
    })?;

    for key in PROVIDER_SIGNALS {
        if let Some(signal) = obj.get(key).filter(|v| !v.is_null()) {
            return Err(DataError::Api {
                symbol: symbol.to_string(),
                message: value_text(signal),
            });
        }
    }

    let series = obj
        .get(TIME_SERIES_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| DataError::Format {
            symbol: symbol.to_string(),
            reason: "time series not found".into(),
        })?;

    let mut closes = Vec::new();
    let mut skipped = 0;

    for (key, entry) in series {
        let Some(date) = parse_date(key) else {
            tracing::debug!(symbol, key = %key, "skipping unparseable date key");
            skipped += 1;
            continue;
        };
        if date < start || date > end {
            continue;
        }
        match entry.get(CLOSE_KEY).and_then(close_value) {
            Some(price) => closes.push((date, price)),
            None => {
                tracing::debug!(symbol, %date, "skipping entry without a usable close");
                skipped += 1;
            }
        }
    }

    closes.sort_by_key(|(date, _)| *date);

    Ok(DailyCloses {
        symbol: symbol.to_string(),
        closes,
        skipped,
    })
}

fn close_value(v: &Value) -> Option<Decimal> {
    match v {
        Value::String(s) => parse_price(s),
        Value::Number(n) => parse_price(&n.to_string()),
        _ => None,
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Blocking HTTP transport for the Alpha Vantage query endpoint.
pub struct AlphaVantageClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, DataError> {
        Self::with_options(
            api_key,
            DEFAULT_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }
}

impl QuoteTransport for AlphaVantageClient {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch_daily(&self, symbol: &str) -> Result<String, DataError> {
        let transport_err = |reason: String| DataError::Transport {
            symbol: symbol.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(self.query_url())
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .map_err(|e| transport_err(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(transport_err(format!("HTTP {status}")));
        }

        resp.text()
            .map_err(|e| transport_err(format!("failed to read body: {}", e.without_url())))
    }
}
