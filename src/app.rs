use crate::api::{NewsApi, NewsId, NewsItem, RequestError};
use crate::feed::{Applied, DeleteAllState, FeedController, FetchRequest, FetchTicket, Notice, NoticeKind};
use crate::location::UrlSync;
use crate::selection::{CategoryCatalog, SelectionChange, SelectionField, SelectionState, LANGUAGES};
use futures::FutureExt;
use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Capacity of the background event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Number of frames in the loading spinner animation.
pub const SPINNER_FRAMES: usize = 10;

// ============================================================================
// Events
// ============================================================================

/// Events from background tasks.
///
/// Tasks only perform I/O and report here; all state changes happen when the
/// event loop hands these to [`App::handle_event`].
#[derive(Debug)]
pub enum AppEvent {
    /// A feed fetch finished.
    ///
    /// Fields:
    /// - `generation`: the ticket's generation, used to drop stale responses
    /// - `request`: what was fetched
    /// - `result`: items or the normalized error
    FeedLoaded {
        generation: u64,
        request: FetchRequest,
        result: Result<Vec<NewsItem>, RequestError>,
    },
    CategoriesLoaded(Result<Vec<String>, RequestError>),
    NewsDeleted {
        id: NewsId,
        result: Result<(), RequestError>,
    },
    AllNewsDeleted(Result<(), RequestError>),
    /// A background task panicked.
    ///
    /// `generation` is set when the task was a feed fetch.
    TaskPanicked {
        task: &'static str,
        generation: Option<u64>,
        error: String,
    },
}

// ============================================================================
// UI Modes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    External,
}

impl PromptKind {
    pub fn title(self) -> &'static str {
        match self {
            PromptKind::Search => " Search ",
            PromptKind::External => " Fetch from source ",
        }
    }
}

/// What currently captures keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Browse,
    /// Index 0 is "All Categories", then the catalog in order.
    CategoryPicker { selected: usize },
    LanguagePicker { selected: usize },
    Prompt { kind: PromptKind, input: String },
    Help,
}

// ============================================================================
// Application State
// ============================================================================

/// Tunables taken from the config file and command line.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub category_limit: usize,
    pub notice_timeout: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            category_limit: crate::feed::DEFAULT_CATEGORY_LIMIT,
            notice_timeout: Duration::from_secs(4),
        }
    }
}

/// Central application state.
///
/// Owns one instance of every component and is only ever mutated from the
/// event loop task.
pub struct App {
    pub api: NewsApi,
    pub selection: SelectionState,
    pub link: UrlSync,
    pub feed: FeedController,
    pub catalog: CategoryCatalog,

    // UI state
    pub mode: Mode,
    /// Cursor in the feed list.
    pub selected: usize,
    pub spinner_frame: usize,
    pub needs_redraw: bool,
    pub notice_timeout: Duration,

    event_tx: mpsc::Sender<AppEvent>,
}

impl App {
    pub fn new(
        api: NewsApi,
        link: UrlSync,
        selection: SelectionState,
        settings: AppSettings,
        event_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            api,
            selection,
            link,
            feed: FeedController::new(settings.category_limit),
            catalog: CategoryCatalog::default(),
            mode: Mode::Browse,
            selected: 0,
            spinner_frame: 0,
            needs_redraw: true,
            notice_timeout: settings.notice_timeout,
            event_tx,
        }
    }

    /// Startup sequence: restore the category from the link, run the
    /// selection effect once, and load the catalog.
    ///
    /// Hydration happens before the first fetch so a deep link never shows
    /// the unfiltered feed first.
    pub fn start(&mut self) {
        self.link.hydrate(&mut self.selection);
        self.run_selection_effect();
        self.load_categories();
    }

    pub fn link(&self) -> &Url {
        self.link.location()
    }

    pub fn items(&self) -> &[NewsItem] {
        self.feed.items()
    }

    pub fn selected_item(&self) -> Option<&NewsItem> {
        self.items().get(self.selected)
    }

    // ========================================================================
    // User actions
    // ========================================================================

    /// Commit a category. The effect runs even when the value is unchanged,
    /// so a search result on screen gives way to the selection's feed.
    pub fn set_category(&mut self, category: impl Into<String>) {
        if let Some(change) = self.selection.set_category(category) {
            self.selection_changed(change);
        }
        self.run_selection_effect();
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        if let Some(change) = self.selection.set_language(language) {
            self.selection_changed(change);
        }
        self.run_selection_effect();
    }

    fn selection_changed(&mut self, change: SelectionChange) {
        tracing::debug!(field = ?change.field, "Selection changed");
        // The link only carries the category
        if change.field == SelectionField::Category {
            self.link.mirror(&change.selection);
        }
    }

    pub fn refresh(&mut self) {
        let ticket = self.feed.refresh(self.selection.current());
        self.spawn_fetch(ticket);
        self.load_categories();
    }

    pub fn search(&mut self, keyword: &str) {
        if let Some(ticket) = self.feed.search(keyword) {
            self.spawn_fetch(ticket);
        }
    }

    pub fn fetch_external(&mut self, query: &str) {
        let language = self.selection.current().language.clone();
        if let Some(ticket) = self.feed.fetch_external(query, &language) {
            self.spawn_fetch(ticket);
        }
    }

    pub fn delete(&mut self, id: NewsId) {
        if !self.feed.begin_delete(id) {
            tracing::debug!(%id, "Delete already in flight, ignoring");
            return;
        }
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tracing::debug!(%id, "Spawning delete task");
        tokio::spawn(async move {
            let tx_panic = tx.clone();
            match catch_task_panic(async {
                let result = api.delete_news(id).await;
                if let Err(e) = tx.send(AppEvent::NewsDeleted { id, result }).await {
                    tracing::warn!(error = %e, event = "NewsDeleted", "Channel send failed (receiver dropped)");
                }
            })
            .await
            {
                Ok(()) => {}
                Err(panic_msg) => report_panic(&tx_panic, "delete", None, panic_msg).await,
            }
        });
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_item().map(|item| item.id) {
            self.delete(id);
        }
    }

    /// Arm delete-all; the UI shows a confirmation while armed.
    pub fn request_delete_all(&mut self) {
        if !self.feed.request_delete_all() {
            self.set_status("Delete all already in progress");
        }
    }

    pub fn confirm_delete_all(&mut self) {
        if !self.feed.confirm_delete_all() {
            return;
        }
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tracing::info!("Deleting all news");
        tokio::spawn(async move {
            let tx_panic = tx.clone();
            match catch_task_panic(async {
                let result = api.delete_all().await;
                if let Err(e) = tx.send(AppEvent::AllNewsDeleted(result)).await {
                    tracing::warn!(error = %e, event = "AllNewsDeleted", "Channel send failed (receiver dropped)");
                }
            })
            .await
            {
                Ok(()) => {}
                Err(panic_msg) => report_panic(&tx_panic, "delete-all", None, panic_msg).await,
            }
        });
    }

    pub fn cancel_delete_all(&mut self) {
        self.feed.cancel_delete_all();
    }

    pub fn awaiting_delete_all_confirmation(&self) -> bool {
        self.feed.delete_all_state() == DeleteAllState::AwaitingConfirmation
    }

    // ========================================================================
    // Background tasks
    // ========================================================================

    fn run_selection_effect(&mut self) {
        if let Some(ticket) = self.feed.on_selection(self.selection.current()) {
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let FetchTicket {
            generation,
            request,
        } = ticket;
        self.selected = 0;

        tracing::debug!(generation, kind = request.kind(), "Spawning fetch task");
        tokio::spawn(async move {
            let tx_panic = tx.clone();
            match catch_task_panic(async {
                let result = request.execute(&api).await;
                let event = AppEvent::FeedLoaded {
                    generation,
                    request,
                    result,
                };
                if let Err(e) = tx.send(event).await {
                    tracing::warn!(error = %e, event = "FeedLoaded", "Channel send failed (receiver dropped)");
                }
            })
            .await
            {
                Ok(()) => {}
                Err(panic_msg) => report_panic(&tx_panic, "fetch", Some(generation), panic_msg).await,
            }
        });
    }

    /// Reload the category catalog. Failures only leave the catalog as is.
    pub fn load_categories(&self) {
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let tx_panic = tx.clone();
            match catch_task_panic(async {
                let result = api.categories().await;
                if let Err(e) = tx.send(AppEvent::CategoriesLoaded(result)).await {
                    tracing::warn!(error = %e, event = "CategoriesLoaded", "Channel send failed (receiver dropped)");
                }
            })
            .await
            {
                Ok(()) => {}
                Err(panic_msg) => report_panic(&tx_panic, "categories", None, panic_msg).await,
            }
        });
    }

    // ========================================================================
    // Event handling
    // ========================================================================

    /// Apply one background event. Called only from the event loop.
    pub fn handle_event(&mut self, event: AppEvent) {
        self.needs_redraw = true;
        match event {
            AppEvent::FeedLoaded {
                generation,
                request,
                result,
            } => {
                let ingested = matches!(request, FetchRequest::External { .. }) && result.is_ok();
                if self.feed.apply_fetch(generation, result) == Applied::Applied {
                    self.clamp_selection();
                    if ingested {
                        self.load_categories();
                    }
                }
            }
            AppEvent::CategoriesLoaded(Ok(categories)) => {
                tracing::debug!(count = categories.len(), "Category catalog loaded");
                self.catalog.replace(categories);
                if let Mode::CategoryPicker { selected } = &mut self.mode {
                    *selected = (*selected).min(self.catalog.len());
                }
            }
            AppEvent::CategoriesLoaded(Err(e)) => {
                tracing::warn!(error = %e, "Failed to load categories");
            }
            AppEvent::NewsDeleted { id, result } => {
                if self.feed.apply_delete(id, result) {
                    self.clamp_selection();
                }
            }
            AppEvent::AllNewsDeleted(result) => {
                let deleted = result.is_ok();
                self.feed.apply_delete_all(result);
                if deleted {
                    self.selected = 0;
                    self.load_categories();
                }
            }
            AppEvent::TaskPanicked {
                task,
                generation,
                error,
            } => {
                tracing::error!(task, error, "Background task panicked");
                if let Some(generation) = generation {
                    self.feed.abandon_fetch(generation, &error);
                }
                self.feed.set_notice(Notice::new(
                    NoticeKind::Error,
                    format!("Internal error in {} task", task),
                ));
            }
        }
    }

    /// Periodic housekeeping: spinner animation and notice expiry.
    pub fn tick(&mut self) {
        if self.feed.result().is_loading() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
            self.needs_redraw = true;
        }
        if self.feed.expire_notice(self.notice_timeout) {
            self.needs_redraw = true;
        }
    }

    /// Show a short informational message in the status bar.
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.feed.set_notice(Notice::new(NoticeKind::Info, msg));
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn nav_down(&mut self) {
        let item_count = self.items().len();
        let catalog_len = self.catalog.len();
        match &mut self.mode {
            Mode::CategoryPicker { selected } => {
                *selected = (*selected + 1).min(catalog_len);
            }
            Mode::LanguagePicker { selected } => {
                *selected = (*selected + 1).min(LANGUAGES.len().saturating_sub(1));
            }
            _ => {
                if item_count > 0 {
                    self.selected = (self.selected + 1).min(item_count - 1);
                }
            }
        }
    }

    pub fn nav_up(&mut self) {
        match &mut self.mode {
            Mode::CategoryPicker { selected } | Mode::LanguagePicker { selected } => {
                *selected = selected.saturating_sub(1);
            }
            _ => self.selected = self.selected.saturating_sub(1),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    /// Open the category picker with the cursor on the current category.
    pub fn open_category_picker(&mut self) {
        let current = &self.selection.current().category;
        let selected = self
            .catalog
            .as_slice()
            .iter()
            .position(|c| c == current)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.mode = Mode::CategoryPicker { selected };
    }

    pub fn open_language_picker(&mut self) {
        let current = &self.selection.current().language;
        let selected = LANGUAGES
            .iter()
            .position(|(code, _)| *code == current.as_str())
            .unwrap_or(0);
        self.mode = Mode::LanguagePicker { selected };
    }

    /// Apply the picker choice under the cursor and return to browsing.
    pub fn commit_picker(&mut self) {
        match std::mem::take(&mut self.mode) {
            Mode::CategoryPicker { selected } => {
                let category = match selected {
                    0 => String::new(),
                    i => self
                        .catalog
                        .as_slice()
                        .get(i - 1)
                        .cloned()
                        .unwrap_or_default(),
                };
                self.set_category(category);
            }
            Mode::LanguagePicker { selected } => {
                if let Some((code, _)) = LANGUAGES.get(selected) {
                    self.set_language(*code);
                }
            }
            other => self.mode = other,
        }
    }

    /// Submit the open prompt, if any, and return to browsing.
    pub fn submit_prompt(&mut self) {
        if let Mode::Prompt { kind, input } = std::mem::take(&mut self.mode) {
            match kind {
                PromptKind::Search => self.search(&input),
                PromptKind::External => self.fetch_external(&input),
            }
        }
    }
}

// ============================================================================
// Task helpers
// ============================================================================

/// Wraps a future to catch panics and convert them to errors.
///
/// Panics in spawned tasks would otherwise vanish inside the runtime. Here
/// they become `Err(message)` so the loop can be told via
/// [`AppEvent::TaskPanicked`].
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

async fn report_panic(
    tx: &mpsc::Sender<AppEvent>,
    task: &'static str,
    generation: Option<u64>,
    error: String,
) {
    tracing::error!(task, error = %error, "Task panicked");
    let event = AppEvent::TaskPanicked {
        task,
        generation,
        error,
    };
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = "TaskPanicked", "Channel send failed (receiver dropped)");
    }
}
