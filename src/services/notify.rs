// src/services/notify.rs

//! User-facing notifications.
//!
//! The core reports outcomes ("Quote copied!", "Failed to load quotes") to a
//! [`Notifier`] and never waits on it. Rendering is up to the host.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn info(&self, message: &str) {
        self.notify(NoticeLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.notify(NoticeLevel::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NoticeLevel::Error, message);
    }
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => log::info!("{}", message),
            NoticeLevel::Success => log::info!("✓ {}", message),
            NoticeLevel::Error => log::error!("{}", message),
        }
    }
}

/// Buffers notifications until the host drains them.
#[derive(Debug, Default)]
pub struct QueuedNotifier {
    queue: Mutex<VecDeque<Notice>>,
}

impl QueuedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Messages currently pending, oldest first.
    pub fn messages(&self) -> Vec<String> {
        match self.queue.lock() {
            Ok(queue) => queue.iter().map(|n| n.message.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Notifier for QueuedNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        log::debug!("notice [{}]: {}", level, message);
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(Notice {
                level,
                message: message.to_string(),
            });
        }
    }
}
