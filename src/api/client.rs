use crate::api::error::ApiError;
use crate::config::AppConfig;
use crate::models::ApiResponse;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Linear retry: attempt `n` waits `delay * n` before the next try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay * attempt
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    ai_search_url: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            ai_search_url: config.ai_search_url.clone(),
            timeout: config.request_timeout,
            retry: RetryPolicy {
                retries: config.retry_attempts,
                delay: config.retry_delay,
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn ai_search_url(&self) -> &str {
        &self.ai_search_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.execute(Method::GET, self.url(path), token, query, None, ApiError::is_retryable)
            .await
    }

    /// GET for records the API may not have yet: a 404 is an answer, returned
    /// as `None` straight away rather than retried.
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ApiError> {
        let result = self
            .execute(Method::GET, self.url(path), token, query, None, |err| {
                err.is_retryable() && err.status() != Some(404)
            })
            .await;
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: String,
        token: Option<&str>,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.execute(method, url, token, &[], Some(&body), ApiError::is_retryable)
            .await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        self.execute(
            Method::DELETE,
            self.url(path),
            token,
            &[],
            None,
            ApiError::is_retryable,
        )
        .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
        retry_if: impl Fn(&ApiError) -> bool,
    ) -> Result<T, ApiError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = self
                .send_once(method.clone(), &url, token, query, body)
                .await;

            match result {
                Ok(data) => return Ok(data),
                Err(err) if attempt <= self.retry.retries && retry_if(&err) => {
                    let wait = self.retry.delay_for(attempt);
                    warn!(
                        "{method} {url} failed (attempt {attempt}): {err}; retrying in {} ms",
                        wait.as_millis()
                    );
                    sleep(wait).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        debug!("{method} {url}");
        let mut request = self
            .http
            .request(method, url)
            .timeout(self.timeout)
            .header(ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let request = authorize(request, token);

        let response = request.send().await.map_err(|err| self.classify(err))?;
        let response = check_response(response).await?;
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))?;

        if !envelope.success {
            return Err(ApiError::Rejected(envelope.message));
        }
        Ok(envelope.data)
    }

    fn classify(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Request interceptor: attaches the bearer token when the caller holds one.
pub fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) if !token.is_empty() => request.header(AUTHORIZATION, format!("Bearer {token}")),
        _ => request,
    }
}

/// Response interceptor: turns non-2xx statuses into [`ApiError`]s.
pub async fn check_response(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::time::Instant;

    #[derive(Default)]
    struct Hits {
        flaky: AtomicUsize,
        expired: AtomicUsize,
        rejected: AtomicUsize,
        missing: AtomicUsize,
    }

    fn envelope(data: serde_json::Value) -> Json<serde_json::Value> {
        Json(json!({ "success": true, "data": data, "message": "ok" }))
    }

    /// Serves a small upstream on a random port and counts hits per route.
    async fn spawn_upstream() -> (String, Arc<Hits>) {
        let hits = Arc::new(Hits::default());
        let app = Router::new()
            .route(
                "/flaky",
                get({
                    let hits = Arc::clone(&hits);
                    move || async move {
                        if hits.flaky.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err((StatusCode::INTERNAL_SERVER_ERROR, "warming up"))
                        } else {
                            Ok(envelope(json!(5)))
                        }
                    }
                }),
            )
            .route(
                "/expired",
                get({
                    let hits = Arc::clone(&hits);
                    move || async move {
                        hits.expired.fetch_add(1, Ordering::SeqCst);
                        (StatusCode::UNAUTHORIZED, "expired")
                    }
                }),
            )
            .route(
                "/rejected",
                get({
                    let hits = Arc::clone(&hits);
                    move || async move {
                        hits.rejected.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "success": false, "data": null, "message": "bad filter" }))
                    }
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    envelope(json!(1))
                }),
            )
            .route(
                "/api/page-context/:page",
                get({
                    let hits = Arc::clone(&hits);
                    move || async move {
                        hits.missing.fetch_add(1, Ordering::SeqCst);
                        (StatusCode::NOT_FOUND, "no context")
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), hits)
    }

    fn client_for(base_url: &str, timeout: Duration, delay: Duration) -> ApiClient {
        let config = AppConfig {
            api_base_url: base_url.to_string(),
            ai_search_url: format!("{base_url}/api/ai-search"),
            request_timeout: timeout,
            retry_attempts: 3,
            retry_delay: delay,
            ..AppConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let (base, hits) = spawn_upstream().await;
        let client = client_for(&base, Duration::from_secs(5), Duration::from_millis(5));

        let value: u32 = client.get("/flaky", Some("tok"), &[]).await.unwrap();

        assert_eq!(value, 5);
        assert_eq!(hits.flaky.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unauthorized_is_sent_once() {
        let (base, hits) = spawn_upstream().await;
        let client = client_for(&base, Duration::from_secs(5), Duration::from_millis(5));

        let err = client
            .get::<u32>("/expired", Some("tok"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(hits.expired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_envelope_is_sent_once() {
        let (base, hits) = spawn_upstream().await;
        let client = client_for(&base, Duration::from_secs(5), Duration::from_millis(5));

        let err = client
            .get::<u32>("/rejected", Some("tok"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Rejected(ref message) if message == "bad filter"));
        assert_eq!(hits.rejected.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let (base, _hits) = spawn_upstream().await;
        let client = client_for(&base, Duration::from_millis(100), Duration::from_millis(5));

        let err = client.get::<u32>("/slow", Some("tok"), &[]).await.unwrap_err();

        assert!(matches!(err, ApiError::Timeout(100)));
    }

    #[tokio::test]
    async fn missing_page_context_answers_without_retrying() {
        let (base, hits) = spawn_upstream().await;
        // Default one-second retry delay: any retry would show in the elapsed time.
        let client = client_for(&base, Duration::from_secs(5), Duration::from_secs(1));

        let started = Instant::now();
        let context = client
            .page_context("tok", "smart-analytics", "s1")
            .await
            .unwrap();

        assert!(context.is_none());
        assert_eq!(hits.missing.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn retry_delay_grows_linearly() {
        let policy = RetryPolicy {
            retries: 3,
            delay: Duration::from_millis(200),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(600));
    }

    #[test]
    fn authorize_sets_bearer_header() {
        let client = Client::new();
        let request = authorize(client.get("http://localhost/api/bookmarks"), Some("abc"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer abc"
        );

        let anonymous = authorize(client.get("http://localhost/api/bookmarks"), None)
            .build()
            .unwrap();
        assert!(anonymous.headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn check_response_maps_unauthorized() {
        let response = Response::from(
            axum::http::Response::builder()
                .status(401)
                .body("expired")
                .unwrap(),
        );
        let err = check_response(response).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn check_response_keeps_body_for_other_statuses() {
        let response = Response::from(
            axum::http::Response::builder()
                .status(500)
                .body("boom")
                .unwrap(),
        );
        let err = check_response(response).await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
