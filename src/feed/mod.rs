//! Feed synchronization.
//!
//! Keeps the displayed feed consistent with the user's selection, searches,
//! external fetches and deletions while requests complete out of order.
//!
//! - [`request`] - [`FetchRequest`], the backend reads the feed can issue,
//!   and [`FetchTicket`], a request tagged with its generation
//! - [`result`] - [`FeedResult`], the single state the view renders, plus
//!   transient [`Notice`]s
//! - [`controller`] - [`FeedController`], the state machine tying them
//!   together
//!
//! # Example
//!
//! ```ignore
//! let mut feed = FeedController::new(20);
//! if let Some(ticket) = feed.on_selection(selection.current()) {
//!     let outcome = ticket.request.execute(&api).await;
//!     feed.apply_fetch(ticket.generation, outcome);
//! }
//! ```

mod controller;
mod request;
mod result;

pub use controller::{Applied, DeleteAllState, FeedController};
pub use request::{FetchRequest, FetchTicket, DEFAULT_CATEGORY_LIMIT};
pub use result::{FeedResult, FeedStatus, Notice, NoticeKind, Severity, NO_RESULTS_MESSAGE};
