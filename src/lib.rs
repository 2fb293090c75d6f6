//! Terminal client for the NewsGram news backend.
//!
//! The heart of the crate is the feed synchronization controller: it keeps
//! the displayed news list consistent with the selected category and
//! language while requests complete out of order, and mirrors the category
//! into a shareable feed link.
//!
//! - [`selection`] - active category/language filters and the category catalog
//! - [`location`] - feed link synchronizer (`?category=...`)
//! - [`api`] - typed HTTP client for the backend
//! - [`feed`] - fetch tickets, result state and the [`feed::FeedController`]
//! - [`app`] - application shell: spawns requests and applies their results
//! - [`ui`] - ratatui terminal interface

pub mod api;
pub mod app;
pub mod config;
pub mod feed;
pub mod location;
pub mod selection;
pub mod ui;
pub mod util;
