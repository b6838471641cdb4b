//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use genquote::QuoteSession;
use genquote::error::{AppError, Result};
use genquote::models::{Config, QuoteRecord};
use genquote::services::{QueuedNotifier, QuoteProvider};
use genquote::storage::PersistentStore;

/// Provider that numbers its quotes and fails on chosen calls.
#[derive(Default)]
pub struct ScriptedProvider {
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: calls.into_iter().collect(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    async fn fetch_one(&self) -> Result<QuoteRecord> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&n) {
            return Err(AppError::invalid_quote(format!("scripted failure on call {n}")));
        }
        Ok(QuoteRecord::new(format!("Fetched quote {n}"), format!("Author {}", n % 5))
            .with_tags(["Wisdom"]))
    }
}

pub struct Harness {
    pub session: QuoteSession,
    pub provider: Arc<ScriptedProvider>,
    pub notices: Arc<QueuedNotifier>,
    pub store: PersistentStore,
}

/// Session over `store` with a scripted provider and a recording notifier.
pub async fn harness_with(store: PersistentStore, provider: ScriptedProvider) -> Harness {
    let provider = Arc::new(provider);
    let notices = Arc::new(QueuedNotifier::new());
    let session = QuoteSession::builder(Config::default(), store.clone(), provider.clone())
        .notifier(notices.clone())
        .build()
        .await;
    Harness {
        session,
        provider,
        notices,
        store,
    }
}

/// Session persisting under `dir`.
pub async fn disk_harness(dir: &Path, provider: ScriptedProvider) -> Harness {
    harness_with(PersistentStore::local(dir), provider).await
}

pub fn sample_quotes() -> Vec<QuoteRecord> {
    vec![
        QuoteRecord::new("Be yourself; everyone else is already taken.", "Oscar Wilde")
            .with_tags(["Famous Quotes"]),
        QuoteRecord::new("Where there is ruin, there is hope for a treasure.", "Rumi")
            .with_tags(["Love", "Hope"]),
        QuoteRecord::new("Whatever you are, be a good one.", "Abraham Lincoln"),
    ]
}
