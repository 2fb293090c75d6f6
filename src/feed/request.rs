use crate::api::{NewsApi, NewsItem, RequestError};
use crate::selection::Selection;

/// Number of items requested for a category feed unless configured otherwise.
pub const DEFAULT_CATEGORY_LIMIT: usize = 20;

/// One backend read the feed controller can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Unfiltered daily feed.
    Daily { language: String },
    /// Latest items of one category.
    Category {
        category: String,
        limit: usize,
        language: String,
    },
    /// Keyword search, independent of the selection.
    Search { keyword: String },
    /// Upstream ingestion; the backend persists and returns the new items.
    External { query: String, language: String },
}

impl FetchRequest {
    /// The read that corresponds to a selection: daily feed when no category
    /// is set, category feed otherwise.
    pub fn for_selection(selection: &Selection, limit: usize) -> Self {
        match selection.category_filter() {
            None => FetchRequest::Daily {
                language: selection.language.clone(),
            },
            Some(category) => FetchRequest::Category {
                category: category.to_string(),
                limit,
                language: selection.language.clone(),
            },
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchRequest::Daily { .. } => "daily",
            FetchRequest::Category { .. } => "category",
            FetchRequest::Search { .. } => "search",
            FetchRequest::External { .. } => "external",
        }
    }

    /// Daily and category reads mirror the selection; searches and external
    /// fetches do not.
    pub fn follows_selection(&self) -> bool {
        matches!(
            self,
            FetchRequest::Daily { .. } | FetchRequest::Category { .. }
        )
    }

    /// Searches and external fetches report an empty result as "no results"
    /// rather than as an empty feed.
    pub fn empty_is_no_results(&self) -> bool {
        matches!(
            self,
            FetchRequest::Search { .. } | FetchRequest::External { .. }
        )
    }

    pub async fn execute(&self, api: &NewsApi) -> Result<Vec<NewsItem>, RequestError> {
        match self {
            FetchRequest::Daily { language } => api.daily_news(language).await,
            FetchRequest::Category {
                category,
                limit,
                language,
            } => api.news_by_category(category, *limit, language).await,
            FetchRequest::Search { keyword } => api.search(keyword).await,
            FetchRequest::External { query, language } => {
                api.fetch_external(query, language).await
            }
        }
    }
}

/// A fetch that has been issued: the request plus the generation it was
/// tagged with. Only the latest generation is ever applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: FetchRequest,
}
