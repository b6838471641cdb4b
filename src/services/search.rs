// src/services/search.rs

//! Case-insensitive substring search over the cached batch.

use crate::models::QuoteRecord;

/// Default number of matches shown before the list is expanded.
pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

/// Return the quotes whose content, author or any tag contains `query`.
///
/// Matching ignores case and keeps batch order. An empty query matches
/// nothing.
pub fn filter(batch: &[QuoteRecord], query: &str) -> Vec<QuoteRecord> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    batch
        .iter()
        .filter(|quote| matches(quote, &needle))
        .cloned()
        .collect()
}

/// `needle` must already be lowercase.
fn matches(quote: &QuoteRecord, needle: &str) -> bool {
    quote.content.to_lowercase().contains(needle)
        || quote.author.to_lowercase().contains(needle)
        || quote.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

/// Matches for a query, with the collapsed preview used by the result list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    matches: Vec<QuoteRecord>,
    preview_limit: usize,
}

impl SearchResults {
    pub fn new(batch: &[QuoteRecord], query: &str, preview_limit: usize) -> Self {
        Self {
            matches: filter(batch, query),
            preview_limit,
        }
    }

    /// Every match in batch order.
    pub fn all(&self) -> &[QuoteRecord] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QuoteRecord> {
        self.matches.get(index)
    }

    /// Matches to display: all of them when expanded, otherwise the preview.
    pub fn visible(&self, show_all: bool) -> &[QuoteRecord] {
        if show_all {
            &self.matches
        } else {
            &self.matches[..self.matches.len().min(self.preview_limit)]
        }
    }

    /// Whether there are more matches than the preview shows.
    pub fn is_collapsible(&self) -> bool {
        self.matches.len() > self.preview_limit
    }

    /// Number of matches hidden by the collapsed preview.
    pub fn hidden_count(&self) -> usize {
        self.matches.len().saturating_sub(self.preview_limit)
    }
}
