// src/provider.rs
use chrono::Utc;
use log::warn;
use rand::{thread_rng, Rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Quote as served by the external price-data service.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Quote {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub change: f64,
    #[serde(default)]
    pub change_rate: f64,
    #[serde(default)]
    pub volume: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Search hit; the provider does not return prices for search results, so
/// the price stays optional rather than assumed present.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchHit {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Clone)]
pub struct PriceClient {
    client: Client,
    base_url: String,
}

impl PriceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        PriceClient {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_env() -> Self {
        let base_url =
            env::var("STOCK_DATA_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        PriceClient::new(base_url)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, reqwest::Error> {
        let url = format!("{}/api/stock/search?q={}", self.base_url, query);
        self.client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn price_of(&self, symbol: &str) -> Result<Quote, reqwest::Error> {
        let url = format!("{}/api/stock/price/{}", self.base_url, symbol);
        self.client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn popular(&self) -> Result<Vec<Quote>, reqwest::Error> {
        let url = format!("{}/api/stocks/popular", self.base_url);
        self.client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Quote fetch for state refresh; failures degrade to `None` so callers
    /// leave their fields untouched instead of failing the whole pass.
    pub async fn quote_or_none(&self, symbol: &str) -> Option<Quote> {
        match self.price_of(symbol).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("Price fetch failed for {}: {}", symbol, e);
                None
            }
        }
    }
}

/// Locally fabricated quote, served when the provider has nothing.
pub fn mock_latest() -> Quote {
    let mut rng = thread_rng();
    let price: f64 = (rng.gen_range::<f64, _>(900.0..1200.0) * 100.0).round() / 100.0;
    let change: f64 = (rng.gen_range::<f64, _>(-3.0..7.0) * 100.0).round() / 100.0;
    Quote {
        symbol: "MOCK_STK".to_string(),
        name: Some("Stock Game Mock Data".to_string()),
        price,
        change,
        change_rate: (change / price * 10000.0).round() / 100.0,
        volume: None,
        timestamp: Some(Utc::now().to_rfc3339()),
    }
}

/// Hardcoded stock-rank rows shown when the provider is unreachable.
pub fn fallback_popular() -> Vec<Quote> {
    vec![
        Quote {
            symbol: "005930".to_string(),
            name: Some("삼성전자".to_string()),
            price: 152_100.0,
            change: -200.0,
            change_rate: -0.13,
            volume: Some(15_000_000),
            timestamp: None,
        },
        Quote {
            symbol: "000660".to_string(),
            name: Some("SK하이닉스".to_string()),
            price: 767_000.0,
            change: 12_000.0,
            change_rate: 1.59,
            volume: Some(8_000_000),
            timestamp: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_quote_stays_in_band() {
        for _ in 0..50 {
            let quote = mock_latest();
            assert!(quote.price >= 900.0 && quote.price < 1200.0);
            assert!(quote.change >= -3.0 && quote.change < 7.0);
            assert_eq!(quote.symbol, "MOCK_STK");
        }
    }

    #[test]
    fn search_hit_tolerates_missing_price() {
        let hit: SearchHit =
            serde_json::from_str(r#"{"symbol":"005930","name":"삼성전자"}"#).unwrap();
        assert_eq!(hit.price, None);
    }

    #[test]
    fn quote_tolerates_sparse_payload() {
        let quote: Quote =
            serde_json::from_str(r#"{"symbol":"AAPL","price":178.5}"#).unwrap();
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.volume, None);
    }
}
