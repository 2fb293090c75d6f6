//! Utility functions for common operations.
//!
//! - **Text processing**: Unicode-aware truncation and terminal control
//!   character stripping for backend-supplied text
//! - **URL checks**: scheme validation before handing a link to the browser

mod text;
mod url_check;

pub use text::{display_width, single_line, strip_control_chars, truncate_to_width};
pub use url_check::{validate_url_for_open, OpenUrlError};

/// Maximum length accepted in the search and external-fetch prompts.
pub const MAX_QUERY_LENGTH: usize = 256;
