//! Market quotes and their conversion into oracle updates
use std::time::Duration;

use async_trait::async_trait;
use futures::TryFutureExt;
use serde::Deserialize;
use thiserror::Error;

use crate::bindings::PriceUpdate;
use crate::http_client::create_client;

/// Decimal places of the price sent to the oracle
pub const PRICE_DECIMALS: u32 = 2;

/// Flag bits of [PriceUpdate::flags]
pub mod flags {
    pub const PRE: i128 = 1;
    pub const POST: i128 = 2;
    pub const REGULAR: i128 = 4;
    pub const POSTPOST: i128 = 8;
    pub const INVALID: i128 = 16;
}

/// Errors that can occur while fetching a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Error that occurs during network communication with the quote source.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The source returned no quote for the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),
    /// The source reported an error.
    #[error("Quote unavailable: {0}")]
    Unavailable(String),
    /// A field needed for the market state is missing.
    #[error("Quote for {symbol} is missing {field}")]
    MissingField {
        symbol: String,
        field: &'static str,
    },
}

/// Trading session a quote was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketState {
    Pre,
    Regular,
    Post,
    Postpost,
    #[serde(other)]
    Other,
}

/// A quote, times are seconds since the epoch
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub market_state: MarketState,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_time: Option<i64>,
    #[serde(default)]
    pub regular_market_previous_close: Option<f64>,
    #[serde(default)]
    pub pre_market_price: Option<f64>,
    #[serde(default)]
    pub pre_market_time: Option<i64>,
    #[serde(default)]
    pub post_market_price: Option<f64>,
    #[serde(default)]
    pub post_market_time: Option<i64>,
}

impl Quote {
    /// Oracle update for this quote.
    ///
    /// The market state selects the flag bit and which price and time are
    /// reported. The price is floored to [PRICE_DECIMALS] and the time is
    /// sent in milliseconds. Unknown states are sent as [flags::INVALID]
    /// with a zero price and time.
    pub fn to_update(&self, token: i128) -> Result<PriceUpdate, QuoteError> {
        let (flags, price, time) = match self.market_state {
            MarketState::Pre => (
                flags::PRE,
                self.field(self.pre_market_price, "preMarketPrice")?,
                self.field(self.pre_market_time, "preMarketTime")?,
            ),
            MarketState::Post => (
                flags::POST,
                self.field(self.regular_market_previous_close, "regularMarketPreviousClose")?,
                self.field(self.regular_market_time, "regularMarketTime")?,
            ),
            MarketState::Regular => (
                flags::REGULAR,
                self.field(self.regular_market_price, "regularMarketPrice")?,
                self.field(self.regular_market_time, "regularMarketTime")?,
            ),
            MarketState::Postpost => (
                flags::POSTPOST,
                self.field(self.regular_market_price, "regularMarketPrice")?,
                self.field(self.post_market_time, "postMarketTime")?,
            ),
            MarketState::Other => (flags::INVALID, 0.0, 0),
        };

        let scale = 10f64.powi(PRICE_DECIMALS as i32);
        Ok(PriceUpdate {
            token,
            price: (price * scale).floor() as i128,
            timestamp: i128::from(time) * 1000,
            flags,
            decimals: PRICE_DECIMALS,
        })
    }

    fn field<T>(&self, value: Option<T>, field: &'static str) -> Result<T, QuoteError> {
        value.ok_or_else(|| QuoteError::MissingField {
            symbol: self.symbol.clone(),
            field,
        })
    }
}

/// Source of market quotes
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<Quote>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Quotes from a Yahoo finance style `/v7/finance/quote` endpoint
#[derive(Debug, Clone)]
pub struct HttpQuoteProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuoteProvider {
    pub const DEFAULT_URL: &'static str = "https://query1.finance.yahoo.com";

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuoteError> {
        Ok(Self {
            client: create_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        tracing::debug!(%url, symbol, "fetching quote");
        let envelope: QuoteEnvelope = self
            .client
            .get(url)
            .query(&[("symbols", symbol)])
            .send()
            .and_then(|r| async move { r.error_for_status() })
            .and_then(|r| r.json())
            .await?;

        let response = envelope.quote_response;
        if let Some(error) = response.error.filter(|e| !e.is_null()) {
            return Err(QuoteError::Unavailable(error.to_string()));
        }
        response
            .result
            .into_iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| QuoteError::SymbolNotFound(symbol.to_string()))
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn quote(state: MarketState) -> Quote {
        Quote {
            symbol: "SPY".into(),
            market_state: state,
            regular_market_price: Some(441.237),
            regular_market_time: Some(1_700_086_268),
            regular_market_previous_close: Some(440.5),
            pre_market_price: Some(442.019),
            pre_market_time: Some(1_700_060_000),
            post_market_price: Some(441.8),
            post_market_time: Some(1_700_100_000),
        }
    }

    #[test]
    fn regular_session_uses_regular_price() {
        let update = quote(MarketState::Regular).to_update(1).unwrap();
        assert_eq!(
            update,
            PriceUpdate {
                token: 1,
                price: 44123,
                timestamp: 1_700_086_268_000,
                flags: 4,
                decimals: 2,
            }
        );
    }

    #[test]
    fn each_state_selects_its_fields() {
        let pre = quote(MarketState::Pre).to_update(1).unwrap();
        assert_eq!((pre.flags, pre.price, pre.timestamp), (1, 44201, 1_700_060_000_000));

        let post = quote(MarketState::Post).to_update(1).unwrap();
        assert_eq!((post.flags, post.price, post.timestamp), (2, 44050, 1_700_086_268_000));

        let postpost = quote(MarketState::Postpost).to_update(1).unwrap();
        assert_eq!(
            (postpost.flags, postpost.price, postpost.timestamp),
            (8, 44123, 1_700_100_000_000)
        );

        let closed = quote(MarketState::Other).to_update(1).unwrap();
        assert_eq!((closed.flags, closed.price, closed.timestamp), (16, 0, 0));
    }

    #[test]
    fn missing_field_is_an_error() {
        let mut q = quote(MarketState::Pre);
        q.pre_market_time = None;
        assert!(matches!(
            q.to_update(1),
            Err(QuoteError::MissingField { field: "preMarketTime", .. })
        ));
    }

    #[test]
    fn unknown_market_state_deserializes_as_other() {
        let q: Quote = serde_json::from_value(json!({
            "symbol": "SPY",
            "marketState": "CLOSED"
        }))
        .unwrap();
        assert_eq!(q.market_state, MarketState::Other);

        let q: Quote = serde_json::from_value(json!({
            "symbol": "SPY",
            "marketState": "POSTPOST"
        }))
        .unwrap();
        assert_eq!(q.market_state, MarketState::Postpost);
    }

    #[tokio::test]
    async fn http_provider_reads_quote_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .and(query_param("symbols", "SPY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteResponse": {
                    "result": [{
                        "symbol": "SPY",
                        "marketState": "REGULAR",
                        "regularMarketPrice": 441.23,
                        "regularMarketTime": 1700086268
                    }],
                    "error": null
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = HttpQuoteProvider::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
        let q = provider.fetch_quote("SPY").await.unwrap();
        assert_eq!(q.market_state, MarketState::Regular);
        assert_eq!(q.regular_market_time, Some(1_700_086_268));
    }

    #[tokio::test]
    async fn http_provider_reports_missing_symbol_and_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("symbols", "NOPE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteResponse": {"result": [], "error": null}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("symbols", "DOWN"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let provider = HttpQuoteProvider::new(&mock_server.uri(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            provider.fetch_quote("NOPE").await,
            Err(QuoteError::SymbolNotFound(s)) if s == "NOPE"
        ));
        assert!(matches!(
            provider.fetch_quote("DOWN").await,
            Err(QuoteError::Network(_))
        ));
    }
}
