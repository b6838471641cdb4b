// src/models/mod.rs

//! Domain models for the quote session core.

mod config;
mod quote;

// Re-export all public types
pub use config::{CarouselConfig, Config, ProviderConfig, SearchConfig, ShareConfig};
pub use quote::{QuotePayload, QuoteRecord};

/// An ordered working set of quotes.
pub type Batch = Vec<QuoteRecord>;
