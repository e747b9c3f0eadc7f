//! Binance spot klines provider.
//!
//! Fetches daily candles from `/api/v3/klines` for `{TICKER}{QUOTE}` pairs.
//! The endpoint answers with either an array of fixed-width rows or an error
//! envelope (`{"code": -1121, "msg": "Invalid symbol."}`), usually with HTTP
//! 400. The envelope means the pair is not listed and is reported as
//! `FetchOutcome::Unavailable`, never as an error.
//!
//! One page (at most 1000 candles) is requested per asset by default, so an
//! asset further behind than that catches up over several runs. Setting
//! `max_pages` above 1 continues from the day after each full page.
//! A later page that fails ends paging and keeps the pages already fetched.
//!
//! No retries are attempted, and unlike reqwest's blocking default no request
//! timeout is applied unless one is configured.

use super::provider::{FetchError, FetchOutcome, PriceSource};
use crate::domain::{Asset, Bar};
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// `data_source` tag on every bar from this provider.
pub const BINANCE_SOURCE: &str = "binance";

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Largest page the klines endpoint serves.
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Decoded klines response: rows or an error envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KlineResponse {
    Rows(Vec<RawKline>),
    Error(ErrorEnvelope),
}

/// One kline row: `[open_time, open, high, low, close, volume, close_time, ...]`.
///
/// Only the first six fields are used.
#[derive(Debug, Deserialize)]
pub struct RawKline(pub Vec<Value>);

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// Settings for the Binance provider.
#[derive(Debug, Clone, PartialEq)]
pub struct BinanceConfig {
    pub base_url: String,
    /// Appended to the ticker to form the trading pair.
    pub quote_asset: String,
    /// Candles per request, at most `MAX_PAGE_LIMIT`.
    pub page_limit: usize,
    /// Requests per asset per run.
    pub max_pages: usize,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            quote_asset: "USDT".to_string(),
            page_limit: MAX_PAGE_LIMIT,
            max_pages: 1,
            timeout: None,
        }
    }
}

/// Binance daily price history.
#[derive(Debug)]
pub struct BinanceSource {
    client: reqwest::blocking::Client,
    config: BinanceConfig,
}

impl BinanceSource {
    pub fn new(config: BinanceConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    /// Trading pair for an asset, e.g. `BTC` + `USDT` → `BTCUSDT`.
    pub fn pair_symbol(&self, asset: &Asset) -> String {
        format!("{}{}", asset.ticker, self.config.quote_asset)
    }

    fn klines_url(&self) -> String {
        format!("{}/api/v3/klines", self.config.base_url.trim_end_matches('/'))
    }

    /// Request one page of daily candles starting at `start` (inclusive).
    fn fetch_page(&self, symbol: &str, start: NaiveDate) -> Result<KlineResponse, FetchError> {
        let start_time = start_time_ms(start).to_string();
        let limit = self.config.page_limit.min(MAX_PAGE_LIMIT).to_string();
        debug!(symbol, %start, "requesting klines");

        let resp = self
            .client
            .get(self.klines_url())
            .query(&[
                ("symbol", symbol),
                ("interval", "1d"),
                ("startTime", start_time.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| FetchError::Transport {
                symbol: symbol.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().map_err(|e| FetchError::Transport {
            symbol: symbol.to_string(),
            message: format!("failed to read body: {e}"),
        })?;

        parse_klines(symbol, status, &body)
    }
}

impl PriceSource for BinanceSource {
    fn name(&self) -> &str {
        BINANCE_SOURCE
    }

    fn fetch_since(&self, asset: &Asset, from: NaiveDate) -> Result<FetchOutcome, FetchError> {
        let symbol = self.pair_symbol(asset);
        paginate(
            &asset.asset_id,
            &symbol,
            from,
            self.config.page_limit.min(MAX_PAGE_LIMIT),
            self.config.max_pages,
            |start| self.fetch_page(&symbol, start),
        )
    }
}

/// Walk klines pages from `from`, fetching each through `fetch_page`.
///
/// The first page decides the outcome: an envelope is `Unavailable` and any
/// error is returned. On later pages an envelope or error ends paging with a
/// warning and the bars gathered so far are kept. Paging continues from the
/// day after the last bar while pages come back full, up to `max_pages`.
pub fn paginate<F>(
    asset_id: &str,
    symbol: &str,
    from: NaiveDate,
    page_limit: usize,
    max_pages: usize,
    mut fetch_page: F,
) -> Result<FetchOutcome, FetchError>
where
    F: FnMut(NaiveDate) -> Result<KlineResponse, FetchError>,
{
    let mut bars: Vec<Bar> = Vec::new();
    let mut start = from;

    for page in 0..max_pages.max(1) {
        let rows = match fetch_page(start) {
            Ok(KlineResponse::Rows(rows)) => rows,
            Ok(KlineResponse::Error(envelope)) if page == 0 => {
                return Ok(FetchOutcome::Unavailable {
                    reason: format!("{} ({})", envelope.msg, envelope.code),
                });
            }
            Ok(KlineResponse::Error(envelope)) => {
                warn!(symbol, page, code = envelope.code, msg = %envelope.msg, "continuation page rejected");
                break;
            }
            Err(e) if page == 0 => return Err(e),
            Err(e) => {
                warn!(symbol, page, error = %e, "continuation page failed; keeping earlier pages");
                break;
            }
        };

        let full_page = rows.len() >= page_limit;
        let decoded = match decode_rows(asset_id, symbol, rows) {
            Ok(decoded) => decoded,
            Err(e) if page == 0 => return Err(e),
            Err(e) => {
                warn!(symbol, page, error = %e, "continuation page malformed; keeping earlier pages");
                break;
            }
        };
        let next = decoded.last().and_then(|bar| bar.date.succ_opt());
        bars.extend(decoded);

        match next {
            Some(next) if full_page => start = next,
            _ => break,
        }
    }

    if bars.is_empty() {
        Ok(FetchOutcome::Empty)
    } else {
        Ok(FetchOutcome::Bars(bars))
    }
}

/// Milliseconds since the Unix epoch at 00:00 UTC of `date`.
pub fn start_time_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp_millis())
}

/// Decode a klines body.
///
/// An error envelope is returned as such whatever the HTTP status; a body that
/// is neither rows nor an envelope is a status error when the status was not
/// a success, and a decode error otherwise.
pub fn parse_klines(symbol: &str, status: StatusCode, body: &str) -> Result<KlineResponse, FetchError> {
    match serde_json::from_str::<KlineResponse>(body) {
        Ok(response) => Ok(response),
        Err(_) if !status.is_success() => Err(FetchError::HttpStatus {
            symbol: symbol.to_string(),
            status: status.as_u16(),
        }),
        Err(e) => Err(FetchError::Decode {
            symbol: symbol.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Normalize raw kline rows into bars.
pub fn decode_rows(asset_id: &str, symbol: &str, rows: Vec<RawKline>) -> Result<Vec<Bar>, FetchError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, RawKline(fields))| {
            let malformed = |reason: String| FetchError::MalformedRow {
                symbol: symbol.to_string(),
                index,
                reason,
            };

            if fields.len() < 6 {
                return Err(malformed(format!("expected at least 6 fields, got {}", fields.len())));
            }

            let open_time = fields[0]
                .as_i64()
                .ok_or_else(|| malformed(format!("open time is not an integer: {}", fields[0])))?;
            let date = DateTime::from_timestamp_millis(open_time)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| malformed(format!("open time out of range: {open_time}")))?;

            let field = |i: usize, name: &str| {
                to_decimal(&fields[i]).ok_or_else(|| malformed(format!("invalid {name}: {}", fields[i])))
            };

            Ok(Bar {
                asset_id: asset_id.to_string(),
                data_source: BINANCE_SOURCE.to_string(),
                date,
                open: field(1, "open")?,
                high: field(2, "high")?,
                low: field(3, "low")?,
                close: field(4, "close")?,
                volume: field(5, "volume")?,
            })
        })
        .collect()
}

/// Binance sends prices as strings; plain JSON numbers are accepted too.
fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}
