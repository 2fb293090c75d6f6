//! Feed link synchronizer.
//!
//! Mirrors the selected category into the `category` query parameter of a
//! shareable feed link, and reads it back at startup so opening a link
//! reproduces the same filtered view. Language is deliberately not part of
//! the link.
//!
//! The synchronizer is a pure mirror: it never issues a fetch.

use crate::selection::{Selection, SelectionState};
use thiserror::Error;
use url::Url;

/// Query parameter carrying the category filter.
pub const CATEGORY_PARAM: &str = "category";

/// Base the links resolve against when nothing else is configured.
pub const DEFAULT_LINK_BASE: &str = "http://localhost:3000/";

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Invalid feed link: {0}")]
    Invalid(#[from] url::ParseError),
    #[error("Feed link cannot carry query parameters: {0}")]
    NotHierarchical(String),
}

/// Current feed link plus the logic to keep it in step with the selection.
#[derive(Debug, Clone)]
pub struct UrlSync {
    location: Url,
}

impl UrlSync {
    /// Start at the root route of `base` with no parameters.
    pub fn root(base: &str) -> Result<Self, LinkError> {
        let mut location = parse_base(base)?;
        location.set_path("/");
        location.set_query(None);
        location.set_fragment(None);
        Ok(Self { location })
    }

    /// Open `link`, which may be absolute (`http://host/?category=tech`) or
    /// relative to `base` (`?category=tech`, `/?category=tech`).
    pub fn from_link(link: &str, base: &str) -> Result<Self, LinkError> {
        let base = parse_base(base)?;
        let location = base.join(link.trim())?;
        if location.cannot_be_a_base() {
            return Err(LinkError::NotHierarchical(location.to_string()));
        }
        Ok(Self { location })
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// The category carried by the link: the first non-empty occurrence.
    pub fn category_param(&self) -> Option<String> {
        self.location
            .query_pairs()
            .find(|(k, v)| k == CATEGORY_PARAM && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    }

    /// Apply the link's category to the selection before any fetch is made.
    ///
    /// Returns `true` when the selection changed. Afterwards the link is
    /// normalized so it matches the selection exactly.
    pub fn hydrate(&mut self, state: &mut SelectionState) -> bool {
        let changed = match self.category_param() {
            Some(category) => {
                tracing::info!(category = %category, "Restoring category from feed link");
                state.set_category(category).is_some()
            }
            None => false,
        };
        self.mirror(state.current());
        changed
    }

    /// Reflect `selection.category` into the link.
    ///
    /// Non-empty: the parameter is set (any previous occurrences replaced).
    /// Empty: the parameter is removed entirely. Unrelated parameters stay.
    pub fn mirror(&mut self, selection: &Selection) {
        let others: Vec<(String, String)> = self
            .location
            .query_pairs()
            .filter(|(k, _)| k != CATEGORY_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let category = selection.category_filter();
        if others.is_empty() && category.is_none() {
            self.location.set_query(None);
        } else {
            let mut pairs = self.location.query_pairs_mut();
            pairs.clear();
            pairs.extend_pairs(others);
            if let Some(category) = category {
                pairs.append_pair(CATEGORY_PARAM, category);
            }
        }
        tracing::debug!(link = %self.location, "Feed link updated");
    }
}

fn parse_base(base: &str) -> Result<Url, LinkError> {
    let url = Url::parse(base)?;
    if url.cannot_be_a_base() {
        return Err(LinkError::NotHierarchical(base.to_string()));
    }
    Ok(url)
}
