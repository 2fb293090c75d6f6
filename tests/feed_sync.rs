//! End-to-end tests for feed synchronization.
//!
//! Each test drives a real `App` (no terminal) against its own wiremock
//! backend, pumping background events through the same `handle_event` path
//! the event loop uses.

use newsgram::api::{NewsApi, NewsId};
use newsgram::app::{App, AppEvent, AppSettings, EVENT_CHANNEL_CAPACITY};
use newsgram::feed::{DeleteAllState, FeedResult, FeedStatus, NoticeKind, Severity, NO_RESULTS_MESSAGE};
use newsgram::location::UrlSync;
use newsgram::selection::SelectionState;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LINK_BASE: &str = "http://localhost:3000/";

fn news(ids: &[i64], tag: &str) -> serde_json::Value {
    json!(ids
        .iter()
        .map(|id| json!({
            "id": id,
            "title": format!("{} story {}", tag, id),
            "description": "Lorem ipsum",
            "author": null,
            "category": tag,
            "language": "en",
            "sourceUrl": format!("https://example.com/{}", id),
            "publishedAt": "2025-10-03T10:30:00"
        }))
        .collect::<Vec<_>>())
}

async fn mount_categories(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/news/viewCategories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["sports", "technology"])))
        .mount(server)
        .await;
}

fn new_app(server: &MockServer, link: Option<&str>) -> (App, mpsc::Receiver<AppEvent>) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let api = NewsApi::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let link = match link {
        Some(link) => UrlSync::from_link(link, LINK_BASE).unwrap(),
        None => UrlSync::root(LINK_BASE).unwrap(),
    };
    let app = App::new(api, link, SelectionState::default(), AppSettings::default(), tx);
    (app, rx)
}

/// Handle background events until `done` holds.
async fn pump_until(app: &mut App, rx: &mut mpsc::Receiver<AppEvent>, done: impl Fn(&App) -> bool) {
    while !done(app) {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a background event")
            .expect("event channel closed");
        app.handle_event(event);
    }
}

/// Handle background events until `n` feed fetches have completed.
async fn pump_fetches(app: &mut App, rx: &mut mpsc::Receiver<AppEvent>, n: usize) {
    let mut seen = 0;
    while seen < n {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a fetch")
            .expect("event channel closed");
        if matches!(event, AppEvent::FeedLoaded { .. }) {
            seen += 1;
        }
        app.handle_event(event);
    }
}

fn ids(app: &App) -> Vec<i64> {
    app.items().iter().map(|i| i.id.0).collect()
}

fn not_loading(app: &App) -> bool {
    !app.feed.result().is_loading()
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_startup_without_link_loads_daily_feed() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .and(query_param("targetLanguage", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[1, 2], "daily")))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    assert_eq!(app.feed.result(), &FeedResult::Loading);

    pump_until(&mut app, &mut rx, |a| not_loading(a) && !a.catalog.is_empty()).await;
    assert_eq!(ids(&app), vec![1, 2]);
    assert_eq!(app.catalog.as_slice(), &["sports".to_string(), "technology".to_string()]);
    assert_eq!(app.link().query(), None);
}

#[tokio::test]
async fn test_deep_link_fetches_category_before_any_daily_fetch() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .and(query_param("targetLanguage", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[1], "daily")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin/tech"))
        .and(query_param("limit", "20"))
        .and(query_param("targetLanguage", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[7, 8], "tech")))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, Some("/?category=tech"));
    app.start();
    assert_eq!(app.selection.current().category, "tech");

    pump_until(&mut app, &mut rx, not_loading).await;
    assert_eq!(ids(&app), vec![7, 8]);
    assert_eq!(app.link().query(), Some("category=tech"));
}

#[tokio::test]
async fn test_empty_category_param_yields_daily_feed() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[3], "daily")))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, Some("?category="));
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;
    assert_eq!(ids(&app), vec![3]);
    assert_eq!(app.link().as_str(), LINK_BASE);
}

// ============================================================================
// Selection changes
// ============================================================================

#[tokio::test]
async fn test_category_round_trip_updates_link_and_fetches() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .and(query_param("targetLanguage", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[1], "daily")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin/sports"))
        .and(query_param("limit", "20"))
        .and(query_param("targetLanguage", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[10, 11], "sports")))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;

    app.set_category("sports");
    assert_eq!(app.link().query(), Some("category=sports"));
    assert!(app.feed.result().is_loading());
    pump_until(&mut app, &mut rx, not_loading).await;
    assert_eq!(ids(&app), vec![10, 11]);

    app.set_category("");
    assert_eq!(app.link().query(), None);
    pump_until(&mut app, &mut rx, not_loading).await;
    assert_eq!(ids(&app), vec![1]);
}

#[tokio::test]
async fn test_same_category_does_not_refetch() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin/world"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[5], "world")))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, Some("?category=world"));
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;

    app.set_category("world");
    assert_eq!(app.feed.result().status(), FeedStatus::Ready);
}

#[tokio::test]
async fn test_slow_superseded_response_is_ignored() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .and(query_param("targetLanguage", "en"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(news(&[1, 2], "english"))
                .set_delay(Duration::from_millis(600)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .and(query_param("targetLanguage", "es"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[30], "spanish")))
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    app.set_language("es");
    // Language is not part of the link
    assert_eq!(app.link().query(), None);

    // Both responses arrive: the fast "es" one first, the stale "en" one later
    pump_fetches(&mut app, &mut rx, 2).await;
    assert_eq!(ids(&app), vec![30]);
    assert_eq!(app.feed.result().status(), FeedStatus::Ready);
}

#[tokio::test]
async fn test_backend_error_becomes_failed_and_refresh_recovers() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[4], "daily")))
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;
    assert_eq!(
        app.feed.result(),
        &FeedResult::Failed {
            message: "Internal server error. Please try again later.".into(),
            severity: Severity::Error
        }
    );

    app.refresh();
    pump_until(&mut app, &mut rx, not_loading).await;
    assert_eq!(ids(&app), vec![4]);
}

// ============================================================================
// Search and external fetch
// ============================================================================

#[tokio::test]
async fn test_search_without_results_is_informational() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[1, 2], "daily")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news/search"))
        .and(query_param("keyword", "election"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;

    app.search("election");
    assert!(app.items().is_empty());
    pump_until(&mut app, &mut rx, not_loading).await;
    assert_eq!(
        app.feed.result(),
        &FeedResult::Failed {
            message: NO_RESULTS_MESSAGE.into(),
            severity: Severity::Info
        }
    );
}

#[tokio::test]
async fn test_external_fetch_reports_count_and_reloads_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/news/viewCategories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["science"])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/news/external"))
        .and(query_param("query", "mars rover"))
        .and(query_param("targetLanguage", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[40, 41], "science")))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    pump_until(&mut app, &mut rx, |a| not_loading(a) && !a.catalog.is_empty()).await;
    assert_eq!(app.feed.result(), &FeedResult::Ready { items: vec![] });

    app.fetch_external("mars rover");
    pump_fetches(&mut app, &mut rx, 1).await;
    assert_eq!(ids(&app), vec![40, 41]);
    let notice = app.feed.notice().unwrap();
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.message, "2 articles fetched and saved");

    // Catalog reload after ingestion
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, AppEvent::CategoriesLoaded(Ok(_))));
}

// ============================================================================
// Deletes
// ============================================================================

#[tokio::test]
async fn test_delete_removes_only_that_item() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[1, 2, 3], "daily")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/news/deleteNews/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;

    app.delete(NewsId(2));
    // Second press while in flight sends nothing
    app.delete(NewsId(2));
    pump_until(&mut app, &mut rx, |a| !a.feed.is_deleting(NewsId(2))).await;
    assert_eq!(ids(&app), vec![1, 3]);
}

#[tokio::test]
async fn test_failed_delete_keeps_list_and_raises_notice() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[1, 2], "daily")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/news/deleteNews/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;

    app.delete(NewsId(1));
    pump_until(&mut app, &mut rx, |a| !a.feed.is_deleting(NewsId(1))).await;
    assert_eq!(ids(&app), vec![1, 2]);
    assert_eq!(app.feed.notice().map(|n| n.kind), Some(NoticeKind::Error));
}

#[tokio::test]
async fn test_delete_all_needs_confirmation() {
    let server = MockServer::start().await;
    mount_categories(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/news/dailyBulletin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(&[1, 2], "daily")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/news/deleteAll"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (mut app, mut rx) = new_app(&server, None);
    app.start();
    pump_until(&mut app, &mut rx, not_loading).await;

    // Cancelled request sends nothing
    app.request_delete_all();
    app.cancel_delete_all();
    app.confirm_delete_all();
    assert_eq!(app.feed.delete_all_state(), DeleteAllState::Idle);
    assert_eq!(ids(&app), vec![1, 2]);

    app.request_delete_all();
    assert!(app.awaiting_delete_all_confirmation());
    app.confirm_delete_all();
    pump_until(&mut app, &mut rx, |a| {
        a.feed.delete_all_state() == DeleteAllState::Idle
    })
    .await;
    assert!(app.items().is_empty());
    assert_eq!(app.feed.result().status(), FeedStatus::Ready);
}
