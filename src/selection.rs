//! Selection state: the user's active category and language filters.
//!
//! This is the single source of truth the link synchronizer and the feed
//! controller read. Mutations happen only through explicit user actions, and
//! each one that actually changes a value is reported back as a
//! [`SelectionChange`] so the caller can run the downstream effects.

/// Language used when neither the config nor the command line picks one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages offered by the language picker: `(code, display name)`.
///
/// Selection itself accepts any code; this list only feeds the menu.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Español"),
    ("fr", "Français"),
    ("de", "Deutsch"),
    ("it", "Italiano"),
    ("pt", "Português"),
    ("ru", "Русский"),
    ("ja", "日本語"),
    ("ko", "한국어"),
    ("zh", "中文"),
];

/// Display name for a language code, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

// ============================================================================
// Selection
// ============================================================================

/// The active filter pair.
///
/// An empty `category` means "no filter" (the daily feed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub category: String,
    pub language: String,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            category: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Selection {
    /// The category filter, or `None` when the daily feed is selected.
    pub fn category_filter(&self) -> Option<&str> {
        if self.category.is_empty() {
            None
        } else {
            Some(&self.category)
        }
    }
}

/// Which field a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionField {
    Category,
    Language,
}

/// Event emitted by a mutation that changed the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub field: SelectionField,
    pub selection: Selection,
}

/// Owner of the current [`Selection`].
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    current: Selection,
}

impl SelectionState {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            current: Selection {
                category: String::new(),
                language: language.into(),
            },
        }
    }

    pub fn current(&self) -> &Selection {
        &self.current
    }

    /// Replace the category filter. No validation: any string is accepted,
    /// and the empty string clears the filter.
    ///
    /// Returns `None` when the value is unchanged (not an event).
    pub fn set_category(&mut self, category: impl Into<String>) -> Option<SelectionChange> {
        let category = category.into();
        if self.current.category == category {
            return None;
        }
        tracing::debug!(from = %self.current.category, to = %category, "Category changed");
        self.current.category = category;
        Some(self.change(SelectionField::Category))
    }

    /// Replace the language filter, leaving the category untouched.
    pub fn set_language(&mut self, language: impl Into<String>) -> Option<SelectionChange> {
        let language = language.into();
        if self.current.language == language {
            return None;
        }
        tracing::debug!(from = %self.current.language, to = %language, "Language changed");
        self.current.language = language;
        Some(self.change(SelectionField::Language))
    }

    fn change(&self, field: SelectionField) -> SelectionChange {
        SelectionChange {
            field,
            selection: self.current.clone(),
        }
    }
}

// ============================================================================
// Category Catalog
// ============================================================================

/// Categories known to the backend, used only to populate filter choices.
///
/// Order follows the backend; blanks and duplicates are dropped. Names are
/// kept byte for byte since they are sent back as path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCatalog {
    categories: Vec<String>,
}

impl CategoryCatalog {
    pub fn replace(&mut self, categories: Vec<String>) {
        let mut seen = std::collections::HashSet::new();
        self.categories = categories
            .into_iter()
            .filter(|c| !c.trim().is_empty() && seen.insert(c.clone()))
            .collect();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
