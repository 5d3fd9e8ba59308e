//! Alpha Vantage intraday provider.
//!
//! One blocking GET per fetch, no retries. The provider answers bad symbols,
//! bad keys and throttling with a 2xx body that lacks the series key, so
//! those surface later as schema errors, not here.

use super::payload::RawPayload;
use super::provider::{DataSource, FetchError, SourceKind};
use crate::domain::{ApiKey, Interval, Symbol};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://www.alphavantage.co/query";
pub const INTRADAY_FUNCTION: &str = "TIME_SERIES_INTRADAY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How much history the provider returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Latest 100 points.
    Compact,
    #[default]
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

pub struct AlphaVantageSource {
    client: reqwest::blocking::Client,
    endpoint: String,
    interval: Interval,
    output_size: OutputSize,
}

impl AlphaVantageSource {
    pub fn new(
        endpoint: impl Into<String>,
        interval: Interval,
        output_size: OutputSize,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            interval,
            output_size,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query string for one intraday request.
    pub fn query_params<'a>(
        &self,
        api_key: &'a ApiKey,
        symbol: &'a Symbol,
    ) -> [(&'static str, &'a str); 5] {
        [
            ("function", INTRADAY_FUNCTION),
            ("symbol", symbol.as_str()),
            ("interval", self.interval.as_str()),
            ("apikey", api_key.expose()),
            ("outputsize", self.output_size.as_str()),
        ]
    }
}

impl DataSource for AlphaVantageSource {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::AlphaVantage
    }

    fn fetch(&self, api_key: &ApiKey, symbol: &Symbol) -> Result<RawPayload, FetchError> {
        debug!(
            endpoint = %self.endpoint,
            symbol = %symbol,
            interval = %self.interval,
            output_size = self.output_size.as_str(),
            "requesting intraday series"
        );

        // reqwest errors carry the full URL, api key included; strip it.
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&self.query_params(api_key, symbol))
            .send()
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let body = resp
            .bytes()
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        let payload = RawPayload::from_slice(&body)
            .map_err(|e| FetchError::MalformedJson(e.to_string()))?;

        if let Some(message) = payload.provider_message() {
            warn!(symbol = %symbol, %message, "provider attached a message");
        }
        info!(symbol = %symbol, bytes = body.len(), "fetched intraday payload");

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_has_intraday_params() {
        let source = AlphaVantageSource::new(
            DEFAULT_ENDPOINT,
            Interval::FiveMinutes,
            OutputSize::Full,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
        .unwrap();
        let key = ApiKey::new("demo").unwrap();
        let symbol = Symbol::new("msft").unwrap();

        assert_eq!(
            source.query_params(&key, &symbol),
            [
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", "MSFT"),
                ("interval", "5min"),
                ("apikey", "demo"),
                ("outputsize", "full"),
            ]
        );
        assert_eq!(source.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(source.kind(), SourceKind::AlphaVantage);
    }

    #[test]
    fn unreachable_endpoint_is_network_error_without_key() {
        let source = AlphaVantageSource::new(
            "http://127.0.0.1:9/query",
            Interval::FiveMinutes,
            OutputSize::Compact,
            Duration::from_millis(500),
        )
        .unwrap();
        let key = ApiKey::new("TOPSECRETKEY").unwrap();
        let err = source
            .fetch(&key, &Symbol::new("MSFT").unwrap())
            .unwrap_err();

        // A system proxy may answer instead of refusing the connection.
        assert!(matches!(
            err,
            FetchError::Network(_) | FetchError::HttpStatus { .. }
        ));
        assert!(!err.to_string().contains("TOPSECRETKEY"));
    }
}
