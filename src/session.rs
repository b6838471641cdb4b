// src/session.rs

//! Quote session.
//!
//! Ties the batch cache, favorites, search, carousel and share services into
//! the state a front end drives: the current quote, the search query and the
//! open carousel.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Batch, Config, QuoteRecord};
use crate::services::batch::{BatchSource, QuoteBatchCache, pick_random};
use crate::services::carousel::{CarouselNavigator, CarouselState, DirectInput, InputEvent, InputSurface, NavAction};
use crate::services::favorites::{AddResult, FavoritesStore};
use crate::services::notify::{LogNotifier, Notifier};
use crate::services::provider::QuoteProvider;
use crate::services::search::SearchResults;
use crate::services::share::{Capabilities, ShareClipboard, ShareOutcome};
use crate::storage::PersistentStore;

pub const ADDED_TO_FAVORITES_MESSAGE: &str = "Added to favorites!";
pub const ALREADY_IN_FAVORITES_MESSAGE: &str = "Already in favorites!";

/// Builder for [`QuoteSession`].
pub struct SessionBuilder {
    config: Config,
    store: PersistentStore,
    provider: Arc<dyn QuoteProvider>,
    notifier: Arc<dyn Notifier>,
    capabilities: Capabilities,
    surface: Arc<dyn InputSurface>,
}

impl SessionBuilder {
    pub fn new(config: Config, store: PersistentStore, provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            config,
            store,
            provider,
            notifier: Arc::new(LogNotifier),
            capabilities: Capabilities::none(),
            surface: Arc::new(DirectInput),
        }
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn input_surface(mut self, surface: Arc<dyn InputSurface>) -> Self {
        self.surface = surface;
        self
    }

    /// Build the session and read persisted favorites.
    ///
    /// The batch is not touched until [`QuoteSession::start`].
    pub async fn build(self) -> QuoteSession {
        let batch = QuoteBatchCache::new(
            self.store.clone(),
            self.provider,
            Arc::clone(&self.notifier),
        )
        .with_batch_size(self.config.provider.batch_size);
        let favorites = FavoritesStore::load(self.store).await;
        let share = ShareClipboard::new(
            self.capabilities,
            Arc::clone(&self.notifier),
            &self.config.share,
        );
        let carousel = CarouselNavigator::new(self.surface)
            .with_swipe_threshold(self.config.carousel.swipe_threshold_px);
        let preview_limit = self.config.search.preview_limit;

        QuoteSession {
            batch,
            favorites,
            share,
            notifier: self.notifier,
            carousel,
            current: None,
            query: String::new(),
            results: SearchResults::new(&[], "", preview_limit),
            show_all: false,
            preview_limit,
        }
    }
}

/// State of one quote session.
pub struct QuoteSession {
    batch: QuoteBatchCache,
    favorites: FavoritesStore,
    share: ShareClipboard,
    notifier: Arc<dyn Notifier>,
    carousel: CarouselNavigator,
    current: Option<QuoteRecord>,
    query: String,
    results: SearchResults,
    show_all: bool,
    preview_limit: usize,
}

impl QuoteSession {
    pub fn builder(config: Config, store: PersistentStore, provider: Arc<dyn QuoteProvider>) -> SessionBuilder {
        SessionBuilder::new(config, store, provider)
    }

    /// Load the batch and pick the first quote to show.
    ///
    /// A cached batch shows its first quote; a freshly fetched one shows a
    /// random quote. If the fetch fails there is no current quote and the
    /// failure has already been reported to the notifier.
    pub async fn start(&mut self) -> Result<BatchSource> {
        self.current = None;
        let loaded = self.batch.ensure_loaded().await?;

        let quote = match loaded.source {
            BatchSource::Cache => loaded.batch.first().cloned().ok_or(AppError::EmptyBatch)?,
            BatchSource::Fetched => pick_random(&loaded.batch)?,
        };
        log::info!(
            "Session started with {} quotes ({:?})",
            loaded.batch.len(),
            loaded.source
        );
        self.current = Some(quote);
        self.refresh_results();
        Ok(loaded.source)
    }

    /// Pick a new current quote from the cached batch.
    pub fn generate_new_quote(&mut self) -> Result<&QuoteRecord> {
        let quote = pick_random(&self.batch.batch())?;
        Ok(&*self.current.insert(quote))
    }

    pub fn current_quote(&self) -> Option<&QuoteRecord> {
        self.current.as_ref()
    }

    pub fn batch(&self) -> Batch {
        self.batch.batch()
    }

    pub fn is_loading(&self) -> bool {
        self.batch.is_loading()
    }

    // ---- Favorites ----

    pub fn favorites(&self) -> &[QuoteRecord] {
        self.favorites.list()
    }

    /// Save `quote` as a favorite and tell the user whether it was new.
    pub async fn add_favorite(&mut self, quote: QuoteRecord) -> AddResult {
        let result = self.favorites.add(quote).await;
        if result.already_present {
            self.notifier.info(ALREADY_IN_FAVORITES_MESSAGE);
        } else {
            self.notifier.success(ADDED_TO_FAVORITES_MESSAGE);
        }
        result
    }

    pub async fn add_current_to_favorites(&mut self) -> Result<AddResult> {
        let quote = self.current.clone().ok_or(AppError::EmptyBatch)?;
        Ok(self.add_favorite(quote).await)
    }

    pub async fn remove_favorite(&mut self, index: usize) -> Result<QuoteRecord> {
        self.favorites.remove_at(index).await
    }

    pub async fn clear_favorites(&mut self) {
        self.favorites.clear().await;
    }

    // ---- Search ----

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the search query and re-check the carousel against the new
    /// match list.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.refresh_results();
    }

    fn refresh_results(&mut self) {
        self.results = SearchResults::new(&self.batch.batch(), &self.query, self.preview_limit);
        self.carousel.sync_bounds(self.results.len());
    }

    pub fn matches(&self) -> &SearchResults {
        &self.results
    }

    /// Matches currently listed, honoring the collapsed preview.
    pub fn visible_matches(&self) -> &[QuoteRecord] {
        self.results.visible(self.show_all)
    }

    pub fn show_all(&self) -> bool {
        self.show_all
    }

    /// Expand or collapse the match list. Returns the new state.
    pub fn toggle_show_all(&mut self) -> bool {
        self.show_all = !self.show_all;
        self.show_all
    }

    // ---- Carousel ----

    pub fn open_match(&mut self, index: usize) -> Result<()> {
        self.carousel.open(index, self.results.len())
    }

    pub fn close_carousel(&mut self) {
        self.carousel.close();
    }

    pub fn carousel_state(&self) -> CarouselState {
        self.carousel.state()
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Option<NavAction> {
        self.carousel.handle_input(event, self.results.len())
    }

    pub fn next_match(&mut self) -> Result<usize> {
        self.carousel.next(self.results.len())
    }

    pub fn prev_match(&mut self) -> Result<usize> {
        self.carousel.prev(self.results.len())
    }

    /// Match shown by the open carousel.
    pub fn current_match(&self) -> Option<&QuoteRecord> {
        self.carousel.index().and_then(|i| self.results.get(i))
    }

    // ---- Share ----

    fn current_text(&self) -> Result<String> {
        self.current
            .as_ref()
            .map(QuoteRecord::share_text)
            .ok_or(AppError::EmptyBatch)
    }

    fn match_text(&self) -> Result<String> {
        self.current_match()
            .map(QuoteRecord::share_text)
            .ok_or(AppError::NotOpen)
    }

    pub async fn copy_current(&self) -> Result<()> {
        self.share.copy(&self.current_text()?).await
    }

    pub async fn share_current(&self) -> Result<ShareOutcome> {
        Ok(self.share.native_share(&self.current_text()?).await)
    }

    pub async fn share_current_on_facebook(&self) -> Result<String> {
        Ok(self.share.share_on_facebook(&self.current_text()?).await)
    }

    pub async fn copy_match(&self) -> Result<()> {
        self.share.copy(&self.match_text()?).await
    }

    pub async fn share_match(&self) -> Result<ShareOutcome> {
        Ok(self.share.native_share(&self.match_text()?).await)
    }

    pub async fn share_match_on_facebook(&self) -> Result<String> {
        Ok(self.share.share_on_facebook(&self.match_text()?).await)
    }
}
