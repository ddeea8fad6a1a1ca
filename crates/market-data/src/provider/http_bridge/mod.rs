//! HTTP bridge provider.
//!
//! Talks to a small JSON service that fronts the terminal/vendor API:
//!
//! - `POST {base}/reference`  `{ "tickers": [...], "fields": [...] }`
//!   returns `{ "rows": [ { "ticker": ..., "fields": { MNEMONIC: value } } ] }`
//! - `POST {base}/historical` `{ "tickers": [...], "fields": [...], "start": "YYYY-MM-DD", "end": "YYYY-MM-DD" }`
//!   returns `{ "rows": [ { "ticker": ..., "date": ..., "fields": { MNEMONIC: number } } ] }`
//!
//! Unknown tickers are reported in an optional `errors` array and dropped.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{HistoricalField, HistoricalRow, ReferenceField, ReferenceRow};
use crate::provider::MarketDataProvider;

/// Provider ID constant
const PROVIDER_ID: &str = "HTTP_BRIDGE";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ReferenceRequest<'a> {
    tickers: &'a [String],
    fields: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct HistoricalRequest<'a> {
    tickers: &'a [String],
    fields: Vec<&'static str>,
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct BridgeError {
    ticker: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse<T> {
    #[serde(default = "Vec::new")]
    rows: Vec<T>,
    #[serde(default)]
    errors: Vec<BridgeError>,
}

/// Market-data provider backed by the HTTP bridge service.
///
/// # Example
///
/// ```ignore
/// use cuprum_market_data::HttpBridgeProvider;
///
/// let provider = HttpBridgeProvider::new("http://bridge.internal:8194");
/// ```
pub struct HttpBridgeProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBridgeProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<BridgeResponse<T>, MarketDataError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.base_url, path);
        debug!("{} POST {}", PROVIDER_ID, url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                })
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                return Err(MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                    after_ms: 0,
                })
            }
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                });
            }
            _ => {}
        }

        let parsed: BridgeResponse<T> =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::InvalidResponse {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                })?;

        for err in &parsed.errors {
            warn!(
                "{} dropped ticker '{}': {}",
                PROVIDER_ID, err.ticker, err.message
            );
        }

        Ok(parsed)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> MarketDataError {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: PROVIDER_ID.to_string(),
                after_ms: self.timeout.as_millis() as u64,
            }
        } else {
            MarketDataError::Network(e)
        }
    }
}

#[async_trait]
impl MarketDataProvider for HttpBridgeProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_historical(
        &self,
        tickers: &[String],
        fields: &[HistoricalField],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalRow>, MarketDataError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let body = HistoricalRequest {
            tickers,
            fields: fields.iter().map(HistoricalField::mnemonic).collect(),
            start: start.format("%Y-%m-%d").to_string(),
            end: end.format("%Y-%m-%d").to_string(),
        };

        let response: BridgeResponse<HistoricalRow> = self.post("historical", &body).await?;
        if response.rows.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }

        let mut rows = response.rows;
        rows.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
        Ok(rows)
    }

    async fn get_reference(
        &self,
        tickers: &[String],
        fields: &[ReferenceField],
    ) -> Result<Vec<ReferenceRow>, MarketDataError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let body = ReferenceRequest {
            tickers,
            fields: fields.iter().map(ReferenceField::mnemonic).collect(),
        };

        let response: BridgeResponse<ReferenceRow> = self.post("reference", &body).await?;
        Ok(response.rows)
    }
}
