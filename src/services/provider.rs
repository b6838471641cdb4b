// src/services/provider.rs

//! Quote provider service.
//!
//! The remote source returns one random quote per call. Every failure mode
//! (network, non-2xx status, malformed body, blank fields) surfaces as an
//! error; callers do not distinguish between them.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{ProviderConfig, QuotePayload, QuoteRecord};
use crate::utils::http;

/// A source of random quotes.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch a single quote.
    async fn fetch_one(&self) -> Result<QuoteRecord>;
}

/// Provider backed by an HTTP endpoint.
pub struct HttpQuoteProvider {
    client: Client,
    url: String,
}

impl HttpQuoteProvider {
    /// Create a provider using the configured endpoint and client settings.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    async fn fetch_one(&self) -> Result<QuoteRecord> {
        let payload: QuotePayload = http::fetch_json(&self.client, &self.url).await?;
        QuoteRecord::try_from(payload)
    }
}
