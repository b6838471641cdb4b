//! Service layer for the quote session.
//!
//! This module contains the business logic for:
//! - Batch caching and refetch (`QuoteBatchCache`)
//! - Favorites (`FavoritesStore`)
//! - Search (`filter`, `SearchResults`)
//! - Carousel navigation (`CarouselNavigator`)
//! - Copy and share (`ShareClipboard`)

pub mod batch;
pub mod carousel;
pub mod favorites;
pub mod notify;
pub mod provider;
pub mod search;
pub mod share;

pub use batch::{BatchSource, LoadedBatch, QuoteBatchCache, pick_random};
pub use carousel::{CarouselNavigator, CarouselState, InputEvent, InputSurface, Key, NavAction};
pub use favorites::{AddResult, FavoritesStore};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier, QueuedNotifier};
pub use provider::{HttpQuoteProvider, QuoteProvider};
pub use search::SearchResults;
pub use share::{Capabilities, ShareClipboard, ShareOutcome};
