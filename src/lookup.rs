//! # Product Lookup
//!
//! Resolves a scanned barcode to a [`ProductRecord`] through the Open Food
//! Facts v2 API. One request per scan: no retries, no caching. Any failure
//! is returned to the caller, which abandons the scan.

use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::LookupConfig;
use crate::errors::{error_logging, LookupError};
use crate::observability;
use crate::product::ProductRecord;
use crate::validation::is_valid_barcode;

/// Anything that can turn a barcode into a product
pub trait ProductLookup: Send + Sync {
    fn lookup(&self, barcode: &str) -> impl Future<Output = Result<ProductRecord, LookupError>> + Send;
}

/// HTTP client for the Open Food Facts product API
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    /// Build a client from lookup configuration
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| LookupError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Use an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL of the product document for `barcode`
    pub fn product_url(&self, barcode: &str) -> String {
        format!("{}/api/v2/product/{}.json", self.base_url, barcode)
    }

    async fn fetch(&self, barcode: &str) -> Result<ProductRecord, LookupError> {
        if !is_valid_barcode(barcode) {
            return Err(LookupError::InvalidBarcode(barcode.to_string()));
        }

        let url = self.product_url(barcode);
        debug!(barcode = %barcode, url = %url, "Fetching product");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // The API answers 404 with a regular "product not found" body
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(LookupError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        ProductRecord::from_off_response(barcode, &body)
    }
}

impl ProductLookup for OpenFoodFactsClient {
    async fn lookup(&self, barcode: &str) -> Result<ProductRecord, LookupError> {
        let start = Instant::now();
        let result = self.fetch(barcode).await;
        let duration = start.elapsed();

        match &result {
            Ok(product) => {
                info!(
                    barcode = %barcode,
                    product_name = %product.product_name,
                    duration_ms = duration.as_millis(),
                    "Product lookup succeeded"
                );
                observability::record_lookup_metrics("found", duration);
            }
            Err(e) if e.is_not_found() => {
                info!(barcode = %barcode, error = %e, "Product not found");
                observability::record_lookup_metrics("not_found", duration);
            }
            Err(e) => {
                error_logging::log_lookup_error(e, barcode, Some(&self.base_url));
                observability::record_lookup_metrics("error", duration);
            }
        }

        result
    }
}
