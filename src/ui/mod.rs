//! Terminal User Interface module.
//!
//! Renders whatever the feed controller exposes and turns key presses into
//! user actions on [`App`](crate::app::App).
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `render` - View rendering dispatch and overlays
//! - `feed_list` - Feed list widget
//! - `picker` - Category and language pickers
//! - `status` - Status bar widget
//! - `help` - Key binding overlay

mod feed_list;
mod help;
mod input;
mod loop_runner;
mod picker;
mod render;
mod status;

pub use loop_runner::{run, Action};
