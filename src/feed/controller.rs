use crate::api::{NewsId, NewsItem, RequestError};
use crate::feed::request::{FetchRequest, FetchTicket};
use crate::feed::result::{FeedResult, Notice, NoticeKind, Severity, NO_RESULTS_MESSAGE};
use crate::selection::Selection;
use std::collections::HashSet;
use std::time::Duration;

/// Outcome of offering a completed fetch to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A newer fetch was issued after this one; the response was dropped.
    Stale,
}

/// Progress of the two-step delete-all flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteAllState {
    #[default]
    Idle,
    /// Armed by the user; nothing has been sent yet.
    AwaitingConfirmation,
    /// Confirmed and sent; waiting for the backend.
    InFlight,
}

/// Feed synchronization state machine.
///
/// Holds the single current [`FeedResult`] and decides what to fetch and
/// which responses to apply. It performs no I/O: every operation that needs
/// the backend returns a [`FetchTicket`] (or a yes/no for deletes) and the
/// caller runs the request and reports back through the `apply_*` methods.
///
/// Ordering: every ticket carries a generation taken from a monotonically
/// increasing counter. A response is applied only if its generation is the
/// latest issued, so a slow superseded request can never overwrite a newer
/// result. The caller must feed `apply_*` calls one at a time (the event loop
/// does), which keeps fetch and delete read-modify-writes from interleaving.
#[derive(Debug)]
pub struct FeedController {
    result: FeedResult,
    generation: u64,
    /// Request behind the current result (or the one in flight).
    current_request: Option<FetchRequest>,
    /// Dependency key `{category, language}` the selection effect last ran for.
    effect_key: Option<Selection>,
    /// Ids confirmed deleted since the latest fetch was issued. Filtered out
    /// of that fetch's response, which may predate the delete.
    deleted_since_issue: HashSet<NewsId>,
    deleting: HashSet<NewsId>,
    delete_all: DeleteAllState,
    /// Generation current when delete-all was confirmed.
    delete_all_cutoff: u64,
    notice: Option<Notice>,
    category_limit: usize,
}

impl FeedController {
    pub fn new(category_limit: usize) -> Self {
        Self {
            result: FeedResult::Loading,
            generation: 0,
            current_request: None,
            effect_key: None,
            deleted_since_issue: HashSet::new(),
            deleting: HashSet::new(),
            delete_all: DeleteAllState::Idle,
            delete_all_cutoff: 0,
            notice: None,
            category_limit,
        }
    }

    pub fn result(&self) -> &FeedResult {
        &self.result
    }

    pub fn items(&self) -> &[NewsItem] {
        self.result.items()
    }

    /// Generation of the most recently issued fetch.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request behind the current result, or the one in flight.
    pub fn current_request(&self) -> Option<&FetchRequest> {
        self.current_request.as_ref()
    }

    // ========================================================================
    // Fetch triggers
    // ========================================================================

    /// Selection effect, keyed on `{category, language}`.
    ///
    /// Issues the daily or category fetch when the key differs from the last
    /// one the effect ran for; otherwise does nothing.
    pub fn on_selection(&mut self, selection: &Selection) -> Option<FetchTicket> {
        if self.effect_key.as_ref() == Some(selection) {
            tracing::debug!(category = %selection.category, language = %selection.language, "Selection unchanged, no fetch");
            return None;
        }
        self.effect_key = Some(selection.clone());
        Some(self.issue(FetchRequest::for_selection(selection, self.category_limit)))
    }

    /// Re-issue the fetch for the current selection unconditionally.
    pub fn refresh(&mut self, selection: &Selection) -> FetchTicket {
        self.effect_key = Some(selection.clone());
        self.issue(FetchRequest::for_selection(selection, self.category_limit))
    }

    /// Keyword search. Blank keywords are ignored.
    pub fn search(&mut self, keyword: &str) -> Option<FetchTicket> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }
        Some(self.issue(FetchRequest::Search {
            keyword: keyword.to_string(),
        }))
    }

    /// Ask the backend to ingest from its upstream source. Blank queries are
    /// ignored.
    pub fn fetch_external(&mut self, query: &str, language: &str) -> Option<FetchTicket> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        Some(self.issue(FetchRequest::External {
            query: query.to_string(),
            language: language.to_string(),
        }))
    }

    /// Tag a new fetch and move to `Loading` before anything is sent.
    ///
    /// A search or external fetch replaces the selection's feed, so the
    /// effect key is cleared and the next selection commit fetches again.
    fn issue(&mut self, request: FetchRequest) -> FetchTicket {
        if !request.follows_selection() {
            self.effect_key = None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.result = FeedResult::Loading;
        self.deleted_since_issue.clear();
        self.current_request = Some(request.clone());
        tracing::debug!(
            generation = self.generation,
            kind = request.kind(),
            "Issuing fetch"
        );
        FetchTicket {
            generation: self.generation,
            request,
        }
    }

    // ========================================================================
    // Fetch completion
    // ========================================================================

    /// Offer a completed fetch. Applied only when `generation` is the latest.
    pub fn apply_fetch(
        &mut self,
        generation: u64,
        outcome: Result<Vec<NewsItem>, RequestError>,
    ) -> Applied {
        if generation != self.generation {
            tracing::debug!(
                expected = self.generation,
                got = generation,
                "Ignoring stale fetch result (generation mismatch)"
            );
            return Applied::Stale;
        }

        let request = self.current_request.as_ref();
        let kind = request.map(FetchRequest::kind).unwrap_or("unknown");
        match outcome {
            Ok(mut items) => {
                if !self.deleted_since_issue.is_empty() {
                    items.retain(|item| !self.deleted_since_issue.contains(&item.id));
                }
                let count = items.len();
                let soft_empty = request.is_some_and(FetchRequest::empty_is_no_results);
                if count == 0 && soft_empty {
                    tracing::debug!(generation, kind, "Fetch returned no results");
                    self.result = FeedResult::Failed {
                        message: NO_RESULTS_MESSAGE.to_string(),
                        severity: Severity::Info,
                    };
                } else {
                    if matches!(request, Some(FetchRequest::External { .. })) {
                        self.notice = Some(Notice::new(
                            NoticeKind::Success,
                            format!("{} articles fetched and saved", count),
                        ));
                    }
                    tracing::debug!(generation, kind, count, "Fetch applied");
                    self.result = FeedResult::Ready { items };
                }
            }
            Err(e) => {
                tracing::warn!(generation, kind, error = %e, "Fetch failed");
                self.result = FeedResult::Failed {
                    message: e.message(),
                    severity: Severity::Error,
                };
            }
        }
        Applied::Applied
    }

    /// The task behind `generation` died without a response. If it was the
    /// latest fetch, fail it so the view does not stay in `Loading`.
    pub fn abandon_fetch(&mut self, generation: u64, reason: &str) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        self.result = FeedResult::Failed {
            message: format!("Internal error: {}", reason),
            severity: Severity::Error,
        };
        Applied::Applied
    }

    // ========================================================================
    // Deletes
    // ========================================================================

    /// Mark `id` as being deleted. Returns `false` when a delete for it is
    /// already in flight (the caller should not send another).
    pub fn begin_delete(&mut self, id: NewsId) -> bool {
        self.deleting.insert(id)
    }

    pub fn is_deleting(&self, id: NewsId) -> bool {
        self.deleting.contains(&id)
    }

    /// Apply the backend's answer to a single delete.
    ///
    /// Success, or a not-found (already gone), removes the item locally
    /// without re-fetching. Any other failure keeps the list intact and
    /// raises a notice. Returns `true` if an item left the list.
    pub fn apply_delete(&mut self, id: NewsId, outcome: Result<(), RequestError>) -> bool {
        self.deleting.remove(&id);
        match outcome {
            Ok(()) => self.remove_local(id),
            Err(e) if e.is_not_found() => {
                tracing::debug!(%id, "Item already gone on the backend");
                self.remove_local(id)
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "Delete failed");
                self.notice = Some(Notice::new(
                    NoticeKind::Error,
                    format!("Delete failed: {}", e),
                ));
                false
            }
        }
    }

    fn remove_local(&mut self, id: NewsId) -> bool {
        self.deleted_since_issue.insert(id);
        let FeedResult::Ready { items } = &mut self.result else {
            return false;
        };
        let before = items.len();
        items.retain(|item| item.id != id);
        before != items.len()
    }

    pub fn delete_all_state(&self) -> DeleteAllState {
        self.delete_all
    }

    /// Arm delete-all. Nothing is sent until [`confirm_delete_all`] is called.
    ///
    /// [`confirm_delete_all`]: FeedController::confirm_delete_all
    pub fn request_delete_all(&mut self) -> bool {
        if self.delete_all == DeleteAllState::InFlight {
            return false;
        }
        self.delete_all = DeleteAllState::AwaitingConfirmation;
        true
    }

    /// Grant confirmation. Returns `true` (and the caller should send the
    /// request) only if delete-all was armed.
    pub fn confirm_delete_all(&mut self) -> bool {
        if self.delete_all != DeleteAllState::AwaitingConfirmation {
            tracing::debug!(state = ?self.delete_all, "Delete-all confirmation without a pending request");
            return false;
        }
        self.delete_all = DeleteAllState::InFlight;
        self.delete_all_cutoff = self.generation;
        true
    }

    pub fn cancel_delete_all(&mut self) {
        if self.delete_all == DeleteAllState::AwaitingConfirmation {
            self.delete_all = DeleteAllState::Idle;
        }
    }

    /// Apply the backend's answer to delete-all.
    ///
    /// On success the feed becomes empty and a fetch issued before the
    /// confirmation is invalidated, since its response could only resurrect
    /// deleted items. A fetch issued after the confirmation is left alone.
    pub fn apply_delete_all(&mut self, outcome: Result<(), RequestError>) {
        self.delete_all = DeleteAllState::Idle;
        match outcome {
            Ok(()) => {
                if self.generation == self.delete_all_cutoff {
                    if self.result.is_loading() {
                        tracing::debug!(
                            generation = self.generation,
                            "Invalidating in-flight fetch after delete-all"
                        );
                    }
                    self.generation = self.generation.wrapping_add(1);
                    self.deleted_since_issue.clear();
                    self.result = FeedResult::Ready { items: Vec::new() };
                } else {
                    tracing::debug!(
                        generation = self.generation,
                        cutoff = self.delete_all_cutoff,
                        "Keeping fetch issued after delete-all"
                    );
                }
                self.deleting.clear();
                self.notice = Some(Notice::new(NoticeKind::Success, "All news deleted"));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Delete-all failed");
                self.notice = Some(Notice::new(
                    NoticeKind::Error,
                    format!("Delete all failed: {}", e),
                ));
            }
        }
    }

    // ========================================================================
    // Notices
    // ========================================================================

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) -> bool {
        self.notice.take().is_some()
    }

    /// Drop the notice once it has been visible for `ttl`. Returns `true` if
    /// one was cleared.
    pub fn expire_notice(&mut self, ttl: Duration) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(ttl)) {
            self.notice = None;
            return true;
        }
        false
    }
}

impl Default for FeedController {
    fn default() -> Self {
        Self::new(crate::feed::request::DEFAULT_CATEGORY_LIMIT)
    }
}
