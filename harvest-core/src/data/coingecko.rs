//! CoinGecko market listing, ranked by market capitalization.
//!
//! `/api/v3/coins/markets` serves at most 250 coins per page; a universe of N
//! assets takes `ceil(N / 250)` requests, issued one after another.

use super::universe::{UniverseError, UniverseSource};
use crate::domain::Asset;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// Largest page the markets endpoint serves.
pub const MAX_PER_PAGE: usize = 250;

#[derive(Debug, Deserialize)]
struct MarketCoin {
    id: String,
    symbol: String,
    name: String,
}

/// Top-N assets by market cap from CoinGecko.
#[derive(Debug)]
pub struct CoinGeckoUniverse {
    client: reqwest::blocking::Client,
    base_url: String,
    vs_currency: String,
    per_page: usize,
}

impl CoinGeckoUniverse {
    pub fn new(base_url: impl Into<String>) -> Result<Self, UniverseError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| UniverseError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            vs_currency: "usd".to_string(),
            per_page: MAX_PER_PAGE,
        })
    }

    fn markets_url(&self) -> String {
        format!("{}/api/v3/coins/markets", self.base_url.trim_end_matches('/'))
    }

    fn fetch_page(&self, page: usize) -> Result<Vec<Asset>, UniverseError> {
        debug!(page, "requesting universe page");
        let resp = self
            .client
            .get(self.markets_url())
            .query(&[
                ("vs_currency", self.vs_currency.clone()),
                ("order", "market_cap_desc".to_string()),
                ("per_page", self.per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .map_err(|e| UniverseError::Transport {
                page,
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UniverseError::HttpStatus {
                page,
                status: status.as_u16(),
            });
        }

        let body = resp.text().map_err(|e| UniverseError::Transport {
            page,
            message: e.to_string(),
        })?;
        parse_markets_page(page, &body)
    }
}

impl UniverseSource for CoinGeckoUniverse {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn load(&self, limit: usize) -> Result<Vec<Asset>, UniverseError> {
        let mut assets = Vec::with_capacity(limit);

        for page in 1..=pages_needed(limit, self.per_page) {
            let batch = self.fetch_page(page)?;
            let short_page = batch.len() < self.per_page;
            assets.extend(batch);
            if short_page {
                break;
            }
        }

        assets.truncate(limit);
        Ok(assets)
    }
}

/// Pages of `per_page` needed to cover `limit` assets.
pub fn pages_needed(limit: usize, per_page: usize) -> usize {
    limit.div_ceil(per_page.max(1))
}

/// Decode one markets page into assets.
pub fn parse_markets_page(page: usize, body: &str) -> Result<Vec<Asset>, UniverseError> {
    let coins: Vec<MarketCoin> =
        serde_json::from_str(body).map_err(|e| UniverseError::Decode {
            page,
            message: e.to_string(),
        })?;

    Ok(coins
        .into_iter()
        .map(|c| Asset::new(c.id, c.symbol, c.name))
        .collect())
}
