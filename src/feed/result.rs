use crate::api::NewsItem;
use std::borrow::Cow;
use std::time::{Duration, Instant};

/// Message shown when a search or external fetch returns nothing.
pub const NO_RESULTS_MESSAGE: &str = "No news found for your search term.";

/// Coarse lifecycle state of the current [`FeedResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Loading,
    Ready,
    Failed,
}

/// How alarming a failure is.
///
/// `Info` covers soft conditions such as an empty search, which the view
/// renders as a neutral hint instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// The feed the view renders.
///
/// Replaced wholesale on every fetch completion, never merged. Items only
/// exist in `Ready`, a message only in `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedResult {
    Loading,
    Ready { items: Vec<NewsItem> },
    Failed { message: String, severity: Severity },
}

impl FeedResult {
    pub fn status(&self) -> FeedStatus {
        match self {
            FeedResult::Loading => FeedStatus::Loading,
            FeedResult::Ready { .. } => FeedStatus::Ready,
            FeedResult::Failed { .. } => FeedStatus::Failed,
        }
    }

    /// Items to display; empty unless `Ready`.
    pub fn items(&self) -> &[NewsItem] {
        match self {
            FeedResult::Ready { items } => items,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FeedResult::Loading)
    }
}

// ============================================================================
// Notices
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Transient, dismissible message that sits beside the feed without
/// replacing it (delete failures, "N articles fetched and saved").
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: Cow<'static, str>,
    pub kind: NoticeKind,
    pub raised_at: Instant,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            kind,
            raised_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.raised_at.elapsed() >= ttl
    }
}
