use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Coin id of the protocol token on the market-data API.
pub const COIN_ID: &str = "olympus";

/// Circulating supply, market cap and spot price of the protocol token.
/// All zero when the market-data API is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketData {
    pub circulating_supply: f64,
    pub market_cap: f64,
    pub current_price: f64,
}

/// Client for the CoinGecko-compatible market-data API.
pub struct MarketClient {
    base_url: String,
    client: Client,
}

impl MarketClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static("olympus-dashboard/0.1"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { base_url, client })
    }

    /// Return the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn coin_url(&self) -> String {
        format!(
            "{}/coins/{COIN_ID}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false&sparkline=false",
            self.base_url
        )
    }

    fn simple_price_url(&self, ids: &[String]) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            ids.join(",")
        )
    }

    /// Market data for the protocol token, or zeros on any failure.
    pub async fn supply_and_market_cap(&self) -> MarketData {
        match self.try_supply_and_market_cap().await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "market data unavailable, using zeros");
                MarketData::default()
            }
        }
    }

    async fn try_supply_and_market_cap(&self) -> Result<MarketData> {
        let url = self.coin_url();
        debug!(url = %url, "fetching market data");
        let json = self.get(&url).await?;
        parse_market_data(&json).context("market data response is missing fields")
    }

    /// USD price per coin id. Empty on any failure.
    pub async fn exchange_rates(&self, ids: &[String]) -> BTreeMap<String, f64> {
        if ids.is_empty() {
            return BTreeMap::new();
        }
        let url = self.simple_price_url(ids);
        debug!(url = %url, "fetching exchange rates");
        match self.get(&url).await {
            Ok(json) => parse_exchange_rates(&json),
            Err(e) => {
                warn!(error = %e, "exchange rates unavailable");
                BTreeMap::new()
            }
        }
    }

    async fn get(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("market API returned {status}");
        }
        response
            .json::<Value>()
            .await
            .context("failed to decode market API response")
    }
}

/// Pull the three market figures out of a `/coins/{id}` response.
pub fn parse_market_data(json: &Value) -> Option<MarketData> {
    let market = json.get("market_data")?;
    Some(MarketData {
        circulating_supply: market.get("circulating_supply")?.as_f64()?,
        market_cap: market.get("market_cap")?.get("usd")?.as_f64()?,
        current_price: market.get("current_price")?.get("usd")?.as_f64()?,
    })
}

/// Flatten a `/simple/price` response into `id → usd`. Entries without a
/// numeric USD price are dropped.
pub fn parse_exchange_rates(json: &Value) -> BTreeMap<String, f64> {
    json.as_object()
        .map(|coins| {
            coins
                .iter()
                .filter_map(|(id, quote)| Some((id.clone(), quote.get("usd")?.as_f64()?)))
                .collect()
        })
        .unwrap_or_default()
}
