use crate::api::types::{NewsId, NewsItem};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_ERROR_BODY_SIZE: usize = 64 * 1024;

/// Path prefix every backend operation lives under.
const API_PREFIX: [&str; 2] = ["api", "news"];

/// Default timeout applied to every backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Error Types
// ============================================================================

/// The single error type surfaced by [`NewsApi`].
///
/// Every failure mode (transport, HTTP status, payload) is folded into one
/// of these variants, and `Display` yields the user-facing message. Callers
/// never see `reqwest` errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The backend could not be reached (DNS, refused connection, TLS, reset).
    #[error("Network error. Please check your connection.")]
    Transport { detail: String },
    /// The call did not complete within the configured bound.
    #[error("Request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
    /// Non-2xx response. `message` is already human-readable.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// 2xx response whose body could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Response too large (exceeds {0} bytes)")]
    TooLarge(usize),
    /// The configured base URL cannot host API paths.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl RequestError {
    /// Build the error for a non-2xx status, preferring the backend's own
    /// `message` field when it sent one.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = match status {
            404 => "Resource not found".to_string(),
            500 => "Internal server error. Please try again later.".to_string(),
            _ => serde_json::from_slice::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("message")?.as_str().map(str::to_owned))
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| format!("Server error: {}", status)),
        };
        RequestError::Http { status, message }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RequestError::Http { status: 404, .. })
    }

    /// Human-readable message for display.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        RequestError::Transport {
            detail: err.to_string(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Typed client for the `/api/news` backend.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted, so each
/// background task gets its own handle.
#[derive(Debug, Clone)]
pub struct NewsApi {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl NewsApi {
    /// Create a client for the backend at `base_url` (scheme + host, optional
    /// path prefix).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(timeout)
            .build()?;
        Self::with_client(client, base_url, timeout)
    }

    /// Create a client around an existing `reqwest::Client`.
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, RequestError> {
        let base = Url::parse(base_url).map_err(|e| RequestError::InvalidUrl(e.to_string()))?;
        match base.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(RequestError::InvalidUrl(format!(
                    "unsupported scheme '{}'",
                    scheme
                )))
            }
        }
        if base.cannot_be_a_base() {
            return Err(RequestError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /dailyBulletin?targetLanguage=`
    pub async fn daily_news(&self, language: &str) -> Result<Vec<NewsItem>, RequestError> {
        let url = self.endpoint(&["dailyBulletin"], &[("targetLanguage", language)])?;
        self.get_json(url).await
    }

    /// `GET /dailyBulletin/{category}?limit=&targetLanguage=`
    pub async fn news_by_category(
        &self,
        category: &str,
        limit: usize,
        language: &str,
    ) -> Result<Vec<NewsItem>, RequestError> {
        let limit = limit.to_string();
        let url = self.endpoint(
            &["dailyBulletin", category],
            &[("limit", limit.as_str()), ("targetLanguage", language)],
        )?;
        self.get_json(url).await
    }

    /// `GET /search?keyword=`
    pub async fn search(&self, keyword: &str) -> Result<Vec<NewsItem>, RequestError> {
        let url = self.endpoint(&["search"], &[("keyword", keyword)])?;
        self.get_json(url).await
    }

    /// `GET /external?query=&targetLanguage=`
    ///
    /// The backend pulls from its upstream source, persists the results and
    /// returns what it saved.
    pub async fn fetch_external(
        &self,
        query: &str,
        language: &str,
    ) -> Result<Vec<NewsItem>, RequestError> {
        let url = self.endpoint(
            &["external"],
            &[("query", query), ("targetLanguage", language)],
        )?;
        self.get_json(url).await
    }

    /// `GET /viewCategories`
    pub async fn categories(&self) -> Result<Vec<String>, RequestError> {
        let url = self.endpoint(&["viewCategories"], &[])?;
        self.get_json(url).await
    }

    /// `DELETE /deleteNews/{id}`
    pub async fn delete_news(&self, id: NewsId) -> Result<(), RequestError> {
        let id = id.to_string();
        let url = self.endpoint(&["deleteNews", id.as_str()], &[])?;
        self.delete(url).await
    }

    /// `DELETE /deleteAll`
    pub async fn delete_all(&self) -> Result<(), RequestError> {
        let url = self.endpoint(&["deleteAll"], &[])?;
        self.delete(url).await
    }

    /// Build `{base}/api/news/{segments...}?{query...}`.
    ///
    /// Segments are percent-encoded individually, so a category containing
    /// `/` or `?` stays a single path segment.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, RequestError> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RequestError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty();
            path.extend(API_PREFIX);
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RequestError> {
        tracing::debug!(method = "GET", url = %url, "Making request");
        let bytes = self
            .bounded(async {
                let response = self.client.get(url.clone()).send().await?;
                let response = check_status(response).await?;
                read_limited_bytes(response, MAX_RESPONSE_SIZE).await
            })
            .await?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Failed to decode response body");
            RequestError::Malformed(e.to_string())
        })
    }

    async fn delete(&self, url: Url) -> Result<(), RequestError> {
        tracing::debug!(method = "DELETE", url = %url, "Making request");
        self.bounded(async {
            let response = self.client.delete(url.clone()).send().await?;
            check_status(response).await?;
            Ok(())
        })
        .await
    }

    /// Enforce the overall deadline on a request, body read included.
    async fn bounded<T, F>(&self, fut: F) -> Result<T, RequestError>
    where
        F: std::future::Future<Output = Result<T, RequestError>>,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RequestError::Timeout(self.timeout)),
        };
        if let Err(e) = &result {
            match e {
                RequestError::Transport { detail } => {
                    tracing::warn!(detail = %detail, "Request failed at transport level");
                }
                other => tracing::warn!(error = %other, "Request failed"),
            }
        }
        result
    }
}

/// Map a non-2xx response to [`RequestError::Http`], passing successes through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RequestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    // Best effort: the body only refines the message.
    let body = read_limited_bytes(response, MAX_ERROR_BODY_SIZE)
        .await
        .unwrap_or_default();
    Err(RequestError::from_status(status.as_u16(), &body))
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, RequestError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(RequestError::TooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(RequestError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn item_json(id: i64, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "description": "desc",
            "sourceUrl": format!("https://example.com/{}", id),
            "publishedAt": "2025-10-03T10:30:00",
            "category": "technology"
        })
    }

    async fn api_for(server: &MockServer) -> NewsApi {
        NewsApi::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_daily_news_sends_target_language() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/dailyBulletin"))
            .and(query_param("targetLanguage", "fr"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([item_json(1, "Un"), item_json(2, "Deux")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let items = api_for(&server).await.daily_news("fr").await.unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Un", "Deux"]);
    }

    #[tokio::test]
    async fn test_category_path_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/dailyBulletin/sports"))
            .and(query_param("limit", "20"))
            .and(query_param("targetLanguage", "en"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([item_json(3, "Goal")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let items = api_for(&server)
            .await
            .news_by_category("sports", 20, "en")
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, NewsId(3));
    }

    #[tokio::test]
    async fn test_category_is_a_single_encoded_segment() {
        let server = MockServer::start().await;
        let api = api_for(&server).await;
        let url = api
            .endpoint(&["dailyBulletin", "a/b c?"], &[("limit", "5")])
            .unwrap();
        assert_eq!(url.path(), "/api/news/dailyBulletin/a%2Fb%20c%3F");
        assert_eq!(url.query(), Some("limit=5"));
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let api = NewsApi::new("http://backend.local/proxy/", DEFAULT_TIMEOUT).unwrap();
        let url = api.endpoint(&["viewCategories"], &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://backend.local/proxy/api/news/viewCategories"
        );
    }

    #[tokio::test]
    async fn test_search_encodes_keyword() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/search"))
            .and(query_param("keyword", "climate & energy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let items = api_for(&server).await.search("climate & energy").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_external_fetch_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/external"))
            .and(query_param("query", "mars rover"))
            .and(query_param("targetLanguage", "es"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([item_json(9, "Marte")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let items = api_for(&server)
            .await
            .fetch_external("mars rover", "es")
            .await
            .unwrap();
        assert_eq!(items[0].title, "Marte");
    }

    #[tokio::test]
    async fn test_categories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/viewCategories"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!(["technology", "sports"])),
            )
            .mount(&server)
            .await;

        let cats = api_for(&server).await.categories().await.unwrap();
        assert_eq!(cats, vec!["technology".to_string(), "sports".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_endpoints_accept_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/news/deleteNews/17"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/news/deleteAll"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        api.delete_news(NewsId(17)).await.unwrap();
        api.delete_all().await.unwrap();
    }

    #[tokio::test]
    async fn test_404_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = api_for(&server).await.delete_news(NewsId(1)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Resource not found");
    }

    #[tokio::test]
    async fn test_500_message_is_fixed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"message": "stack trace"})),
            )
            .expect(1) // No retries
            .mount(&server)
            .await;

        let err = api_for(&server).await.daily_news("en").await.unwrap_err();
        assert_eq!(err.message(), "Internal server error. Please try again later.");
    }

    #[tokio::test]
    async fn test_other_status_prefers_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/news/external"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"message": "Invalid language code"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/news/search"))
            .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let err = api.fetch_external("q", "xx").await.unwrap_err();
        assert_eq!(
            err,
            RequestError::Http {
                status: 400,
                message: "Invalid language code".to_string()
            }
        );

        let err = api.search("q").await.unwrap_err();
        assert_eq!(err.message(), "Server error: 503");
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"an array\"}"))
            .mount(&server)
            .await;

        let err = api_for(&server).await.daily_news("en").await.unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
        assert!(err.message().starts_with("Malformed response"));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([]))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let api = NewsApi::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let err = api.daily_news("en").await.unwrap_err();
        assert_eq!(err, RequestError::Timeout(Duration::from_millis(200)));
        assert_eq!(err.message(), "Request timed out after 0.2s");
    }

    #[test]
    fn test_timeout_message_keeps_fractions() {
        assert_eq!(
            RequestError::Timeout(Duration::from_millis(1500)).message(),
            "Request timed out after 1.5s"
        );
        assert_eq!(
            RequestError::Timeout(Duration::from_secs(10)).message(),
            "Request timed out after 10s"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let api = NewsApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = api.categories().await.unwrap_err();
        assert!(
            matches!(err, RequestError::Transport { .. } | RequestError::Timeout(_)),
            "got {:?}",
            err
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(
            NewsApi::new("file:///etc", DEFAULT_TIMEOUT),
            Err(RequestError::InvalidUrl(_))
        ));
        assert!(matches!(
            NewsApi::new("not a url", DEFAULT_TIMEOUT),
            Err(RequestError::InvalidUrl(_))
        ));
    }
}
