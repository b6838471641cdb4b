// src/services/favorites.rs

//! Favorites management.
//!
//! An insertion-ordered list of quotes with no two entries sharing the same
//! `(content, author)` pair. Every mutation is persisted immediately.

use crate::error::{AppError, Result};
use crate::models::QuoteRecord;
use crate::storage::{FAVORITES_KEY, PersistentStore};

/// Outcome of [`FavoritesStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddResult {
    /// The quote was already a favorite; nothing changed.
    pub already_present: bool,
}

/// Persistent favorites list.
pub struct FavoritesStore {
    store: PersistentStore,
    favorites: Vec<QuoteRecord>,
}

impl FavoritesStore {
    /// Create an empty store without reading storage.
    pub fn new(store: PersistentStore) -> Self {
        Self {
            store,
            favorites: Vec::new(),
        }
    }

    /// Create a store populated from storage.
    ///
    /// Missing or malformed data yields an empty list.
    pub async fn load(store: PersistentStore) -> Self {
        let favorites: Vec<QuoteRecord> = store.load(FAVORITES_KEY).await.unwrap_or_default();
        log::debug!("Loaded {} favorites", favorites.len());
        Self { store, favorites }
    }

    pub fn list(&self) -> &[QuoteRecord] {
        &self.favorites
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Whether a quote with the same content and author is saved.
    pub fn contains(&self, quote: &QuoteRecord) -> bool {
        self.favorites.iter().any(|f| f.same_quote(quote))
    }

    /// Append `quote` unless an equal one is already saved.
    pub async fn add(&mut self, quote: QuoteRecord) -> AddResult {
        if self.contains(&quote) {
            return AddResult {
                already_present: true,
            };
        }

        self.favorites.push(quote);
        self.persist().await;
        AddResult {
            already_present: false,
        }
    }

    /// Remove the favorite at `index`, keeping the order of the rest.
    pub async fn remove_at(&mut self, index: usize) -> Result<QuoteRecord> {
        if index >= self.favorites.len() {
            return Err(AppError::IndexOutOfRange {
                index,
                len: self.favorites.len(),
            });
        }

        let removed = self.favorites.remove(index);
        self.persist().await;
        Ok(removed)
    }

    /// Remove every favorite.
    pub async fn clear(&mut self) {
        self.favorites.clear();
        self.persist().await;
    }

    async fn persist(&self) {
        self.store.save(FAVORITES_KEY, &self.favorites).await;
    }
}
