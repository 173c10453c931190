use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::types::{OffResponse, OffProduct, PRODUCT_FIELDS};
use crate::product::Barcode;

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org/api/v2";

const USER_AGENT: &str = concat!("shelf-score/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while fetching a product
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Product {barcode} not found on Open Food Facts")]
    NotFound { barcode: String },

    #[error("Open Food Facts returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("Open Food Facts is unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse Open Food Facts response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Transport failures, rate limiting and 5xx are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Upstream { status } => *status == 429 || *status >= 500,
            FetchError::NotFound { .. } | FetchError::Decode(_) => false,
        }
    }

    /// HTTP status a service wrapping the scanner should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            FetchError::NotFound { .. } => 404,
            FetchError::Upstream { .. } | FetchError::Transport(_) => 502,
            FetchError::Decode(_) => 500,
        }
    }
}

/// Client for the Open Food Facts product API
#[derive(Debug, Clone)]
pub struct OffClient {
    http: reqwest::Client,
    base_url: String,
}

impl OffClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn product_url(&self, barcode: &Barcode) -> String {
        format!(
            "{}/product/{}.json?fields={}",
            self.base_url,
            barcode,
            PRODUCT_FIELDS.join(",")
        )
    }

    /// Fetch a product by barcode, retrying transient failures
    pub async fn fetch_product(&self, barcode: &Barcode) -> Result<OffProduct, FetchError> {
        // Retry strategy: exponential backoff with 3 attempts
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(3);

        let url = self.product_url(barcode);
        RetryIf::spawn(
            retry_strategy,
            || self.fetch_once(&url, barcode),
            |e: &FetchError| {
                let retry = e.is_retryable();
                if retry {
                    tracing::debug!(barcode = %barcode, error = %e, "retrying product fetch");
                }
                retry
            },
        )
        .await
    }

    async fn fetch_once(&self, url: &str, barcode: &Barcode) -> Result<OffProduct, FetchError> {
        tracing::debug!(%url, "fetching product");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                barcode: barcode.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
            });
        }

        let payload: OffResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        payload.into_product().ok_or_else(|| FetchError::NotFound {
            barcode: barcode.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_url() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = OffClient::new("https://example.test/api/v2/", Duration::from_secs(1)).unwrap();
        let barcode = Barcode::parse("3017620429003").unwrap();
        let url = client.product_url(&barcode);

        assert!(url.starts_with("https://example.test/api/v2/product/3017620429003.json?fields="));
        assert!(url.contains("additives_tags"));
        assert!(url.contains("categories_tags"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(FetchError::Upstream { status: 503 }.is_retryable());
        assert!(FetchError::Upstream { status: 429 }.is_retryable());
        assert!(!FetchError::Upstream { status: 400 }.is_retryable());
        assert!(!FetchError::NotFound { barcode: "1".into() }.is_retryable());
        assert!(!FetchError::Decode("bad".into()).is_retryable());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(FetchError::NotFound { barcode: "1".into() }.http_status(), 404);
        assert_eq!(FetchError::Upstream { status: 500 }.http_status(), 502);
        assert_eq!(FetchError::Decode("bad".into()).http_status(), 500);
    }
}
