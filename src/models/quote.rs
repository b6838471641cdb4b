//! Quote data structures.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A quotation fetched from the provider.
///
/// Identity for deduplication is the `(content, author)` pair; tags do not
/// participate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoteRecord {
    /// Quote text
    pub content: String,

    /// Attributed author
    pub author: String,

    /// Topic tags in provider order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuoteRecord {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
            tags: Vec::new(),
        }
    }

    /// Builder-style tag assignment.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether two records refer to the same quote.
    pub fn same_quote(&self, other: &QuoteRecord) -> bool {
        self.content == other.content && self.author == other.author
    }

    /// Text used for copying and sharing.
    pub fn share_text(&self) -> String {
        format!("\"{}\" — {}", self.content, self.author)
    }

    /// Tags joined for display.
    pub fn tag_line(&self) -> String {
        self.tags.join(", ")
    }
}

/// Raw provider payload.
///
/// Providers send extra bookkeeping fields (`_id`, `length`, dates) that are
/// ignored here.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotePayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl TryFrom<QuotePayload> for QuoteRecord {
    type Error = AppError;

    fn try_from(payload: QuotePayload) -> Result<Self> {
        let content = payload
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::invalid_quote("missing content"))?;
        let author = payload
            .author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AppError::invalid_quote("missing author"))?;

        Ok(Self {
            content,
            author,
            tags: payload.tags.unwrap_or_default(),
        })
    }
}
