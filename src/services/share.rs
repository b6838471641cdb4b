// src/services/share.rs

//! Copy and share actions for a quote.
//!
//! Platform capabilities are optional. They are resolved once, when the
//! service is built, and every action has an explicit path for a missing
//! capability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::ShareConfig;
use crate::services::notify::Notifier;

pub const COPIED_MESSAGE: &str = "Quote copied!";
pub const COPY_FAILED_MESSAGE: &str = "Failed to copy";
pub const SHARE_UNSUPPORTED_MESSAGE: &str = "Share not supported on this device";
pub const FACEBOOK_COPIED_MESSAGE: &str = "Quote copied! Paste it into Facebook post.";
pub const OPEN_FAILED_MESSAGE: &str = "Unable to open browser";

/// System clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Native share sheet.
#[async_trait]
pub trait NativeShare: Send + Sync {
    async fn share(&self, text: &str) -> Result<()>;
}

/// Opens a URL in a browser window.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<()>;
}

/// Platform capabilities available to [`ShareClipboard`].
#[derive(Clone, Default)]
pub struct Capabilities {
    pub clipboard: Option<Arc<dyn Clipboard>>,
    pub share: Option<Arc<dyn NativeShare>>,
    pub opener: Option<Arc<dyn UrlOpener>>,
}

impl Capabilities {
    /// No platform capabilities at all.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Outcome of [`ShareClipboard::native_share`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Unsupported,
    Failed,
}

/// Copy and share actions.
pub struct ShareClipboard {
    capabilities: Capabilities,
    notifier: Arc<dyn Notifier>,
    sharer_url: String,
    open_delay: Duration,
}

impl ShareClipboard {
    pub fn new(capabilities: Capabilities, notifier: Arc<dyn Notifier>, config: &ShareConfig) -> Self {
        log::debug!(
            "Share capabilities: clipboard={} share={} opener={}",
            capabilities.clipboard.is_some(),
            capabilities.share.is_some(),
            capabilities.opener.is_some()
        );
        Self {
            capabilities,
            notifier,
            sharer_url: config.facebook_sharer_url.clone(),
            open_delay: Duration::from_millis(config.open_delay_ms),
        }
    }

    /// Copy `text` and tell the user how it went.
    pub async fn copy(&self, text: &str) -> Result<()> {
        match self.write_clipboard(text).await {
            Ok(()) => {
                self.notifier.success(COPIED_MESSAGE);
                Ok(())
            }
            Err(e) => {
                log::warn!("Clipboard write failed: {}", e);
                self.notifier.error(COPY_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    async fn write_clipboard(&self, text: &str) -> Result<()> {
        let clipboard = self
            .capabilities
            .clipboard
            .as_ref()
            .ok_or(AppError::ClipboardUnavailable)?;
        clipboard.write_text(text).await
    }

    /// Hand `text` to the native share sheet.
    pub async fn native_share(&self, text: &str) -> ShareOutcome {
        let Some(share) = self.capabilities.share.as_ref() else {
            self.notifier.info(SHARE_UNSUPPORTED_MESSAGE);
            return ShareOutcome::Unsupported;
        };

        match share.share(text).await {
            Ok(()) => ShareOutcome::Shared,
            Err(e) => {
                log::warn!("Native share failed: {}", e);
                self.notifier.error(&format!("Share failed: {e}"));
                ShareOutcome::Failed
            }
        }
    }

    /// Sharer URL carrying `text` as the pre-filled quote.
    pub fn facebook_share_url(&self, text: &str) -> String {
        format!("{}?u=&quote={}", self.sharer_url, urlencoding::encode(text))
    }

    /// Copy `text`, then open the Facebook sharer after a short delay.
    ///
    /// The paste hint is only shown when the copy went through; otherwise
    /// the user is told the copy failed. Returns the sharer URL.
    pub async fn share_on_facebook(&self, text: &str) -> String {
        match self.write_clipboard(text).await {
            Ok(()) => self.notifier.info(FACEBOOK_COPIED_MESSAGE),
            Err(e) => {
                log::warn!("Clipboard write before Facebook share failed: {}", e);
                self.notifier.error(COPY_FAILED_MESSAGE);
            }
        }

        let url = self.facebook_share_url(text);
        tokio::time::sleep(self.open_delay).await;

        match self.capabilities.opener.as_ref() {
            Some(opener) => {
                if let Err(e) = opener.open(&url).await {
                    log::warn!("Failed to open {}: {}", url, e);
                    self.notifier.error(OPEN_FAILED_MESSAGE);
                }
            }
            None => self.notifier.error(OPEN_FAILED_MESSAGE),
        }
        url
    }
}
