//! HTTP client for the NewsGram backend.
//!
//! - [`client`] - [`NewsApi`], one async method per backend operation, and
//!   [`RequestError`], the single error type every failure is normalized into
//! - [`types`] - wire types ([`NewsItem`], [`NewsId`])
//!
//! The client performs no retries; retry policy belongs to the caller.

mod client;
mod types;

pub use client::{NewsApi, RequestError, DEFAULT_TIMEOUT};
pub use types::{parse_timestamp, NewsId, NewsItem};
