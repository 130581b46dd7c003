//! Admin API client implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::cookie::Jar;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client as HttpClient, Method, StatusCode, Url};
use serde_json::Value;
use tokio::sync::oneshot;

use super::api::{AuthApi, ResourceApi};
use super::models::{LoginRequest, Resource, conflict_message, unwrap_data};
use super::pagination::PaginationParams;
use super::rate_limit::ReactiveLimiter;
use super::refresh::{
    LeaderGuard, REFRESH_FAILED, RefreshCoordinator, RefreshFailure, RefreshOutcome,
    RefreshTicket,
};
use super::token::{AccessToken, extract_access_token};
use crate::config::Config;
use crate::error::{ApiError, ConfigError, Error, Result};
use crate::session::{CookieFile, Notice, SessionEvents, TokenStore};

/// Used when a 429 carries no usable Retry-After header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const INVALID_TOKEN_RESPONSE: &str = "Invalid token response format";

/// Outbound request descriptor
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Path relative to the API prefix
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    retried: bool,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Successful response, body parsed as JSON when possible
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// Business payload with the envelope removed
    pub fn data(self) -> Value {
        unwrap_data(self.body)
    }
}

struct RawResponse {
    status: StatusCode,
    body: Value,
    retry_after: Option<Duration>,
}

/// Admin API client
pub struct AdminClient {
    http: HttpClient,
    jar: Arc<Jar>,
    base_url: String,
    refresh_url: Url,
    login_path: String,
    logout_path: String,
    refresh_timeout: Duration,
    queue_timeout: Duration,
    store: Arc<dyn TokenStore>,
    coordinator: RefreshCoordinator,
    events: SessionEvents,
    limiter: ReactiveLimiter,
    cookies: Option<CookieFile>,
}

impl AdminClient {
    /// Create a client for the configured backend
    pub fn new(config: &Config, store: Arc<dyn TokenStore>, events: SessionEvents) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = HttpClient::builder()
            .timeout(config.timeouts.request())
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let base_url = config.base_url();
        let refresh_url = Url::parse(&format!("{}{}", base_url, config.refresh_path))
            .map_err(|e| ConfigError::Invalid(format!("Invalid refresh URL: {}", e)))?;

        Ok(Self {
            http,
            jar,
            base_url,
            refresh_url,
            login_path: config.login_path.clone(),
            logout_path: config.logout_path.clone(),
            refresh_timeout: config.timeouts.refresh(),
            queue_timeout: config.timeouts.queue(),
            store,
            coordinator: RefreshCoordinator::new(),
            events,
            limiter: ReactiveLimiter::default(),
            cookies: None,
        })
    }

    /// Persist the cookie jar across runs through `cookies`
    pub fn with_cookie_file(mut self, cookies: CookieFile) -> Result<Self> {
        cookies.restore(&self.jar, &self.refresh_url)?;
        self.cookies = Some(cookies);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(RequestSpec::new(Method::GET, path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(RequestSpec::new(Method::POST, path).json(body))
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(RequestSpec::new(Method::PUT, path).json(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(RequestSpec::new(Method::DELETE, path)).await
    }

    /// Send a request through the interceptor pipeline.
    ///
    /// A 401 is recovered at most once per request: the request is replayed
    /// with a refreshed (or already replaced) token and a second 401 is final.
    pub async fn send(&self, mut spec: RequestSpec) -> Result<ApiResponse> {
        let mut token = self.store.get();

        loop {
            let raw = self.dispatch(&spec, token.as_ref()).await?;
            let status = raw.status;

            if status.is_success() {
                return Ok(ApiResponse {
                    status: status.as_u16(),
                    body: raw.body,
                });
            }

            match status {
                StatusCode::UNAUTHORIZED if !spec.retried => {
                    spec.retried = true;
                    token = Some(self.recover_session(token.as_ref()).await?);
                    debug!("Replaying {} {} with new token", spec.method, spec.path);
                }
                StatusCode::UNAUTHORIZED => {
                    debug!("{} {} rejected again after replay", spec.method, spec.path);
                    return Err(ApiError::Unauthorized.into());
                }
                StatusCode::CONFLICT => return Err(self.conflict(raw.body).into()),
                StatusCode::TOO_MANY_REQUESTS => {
                    self.limiter.activate();
                    let retry_after = raw
                        .retry_after
                        .unwrap_or(Duration::from_secs(DEFAULT_RETRY_AFTER_SECS));
                    return Err(ApiError::RateLimit(retry_after).into());
                }
                _ => {
                    return Err(ApiError::Http {
                        status: status.as_u16(),
                        body: raw.body,
                    }
                    .into());
                }
            }
        }
    }

    /// Get a usable token after a 401, refreshing at most once per cycle
    async fn recover_session(&self, sent_with: Option<&AccessToken>) -> Result<AccessToken> {
        match self.coordinator.begin(sent_with, || self.store.get()) {
            RefreshTicket::NoSession => {
                debug!("401 without a stored token, nothing to refresh");
                Err(ApiError::Unauthorized.into())
            }
            RefreshTicket::Replay(token) => {
                debug!("Token was replaced while the request was in flight");
                Ok(token)
            }
            RefreshTicket::Follower(rx) => self.wait_for_refresh(rx).await,
            RefreshTicket::Leader(guard) => self.lead_refresh(guard).await,
        }
    }

    async fn wait_for_refresh(
        &self,
        rx: oneshot::Receiver<RefreshOutcome>,
    ) -> Result<AccessToken> {
        match tokio::time::timeout(self.queue_timeout, rx).await {
            Ok(Ok(Ok(token))) => Ok(token),
            Ok(Ok(Err(failure))) => Err(ApiError::RefreshFailed(failure.reason).into()),
            Ok(Err(_)) => Err(ApiError::RefreshFailed(REFRESH_FAILED.to_string()).into()),
            Err(_) => {
                warn!(
                    "Queued request gave up after {:?} waiting for refresh",
                    self.queue_timeout
                );
                Err(ApiError::QueueTimedOut(self.queue_timeout).into())
            }
        }
    }

    async fn lead_refresh(&self, guard: LeaderGuard<'_>) -> Result<AccessToken> {
        match self.refresh_access_token().await {
            Ok(token) => {
                if let Err(e) = self.store.set(&token) {
                    warn!("Failed to persist refreshed token: {}", e);
                }
                self.save_cookies();
                guard.settle(Ok(token.clone()));
                info!("Access token refreshed");
                Ok(token)
            }
            Err(err) => {
                warn!("Token refresh failed: {}", err);
                // Token goes before the cycle closes so no later 401 can start
                // another refresh with the dead session.
                self.events.end_session(self.store.as_ref());
                guard.settle(Err(RefreshFailure::new(REFRESH_FAILED)));
                self.events.redirect_to_login().await;
                Err(ApiError::Unauthorized.into())
            }
        }
    }

    /// Ask the backend for a new access token using the refresh cookie.
    ///
    /// Only reached through [`lead_refresh`](Self::lead_refresh). The whole
    /// exchange, body included, is bounded by the refresh timeout.
    async fn refresh_access_token(&self) -> Result<AccessToken> {
        debug!("GET {}", self.refresh_url);

        let raw = tokio::time::timeout(self.refresh_timeout, self.request_refresh())
            .await
            .map_err(|_| ApiError::RefreshTimedOut(self.refresh_timeout))??;
        if raw.status.as_u16() >= 400 {
            return Err(ApiError::RefreshRejected(raw.status.as_u16()).into());
        }

        extract_access_token(&raw.body)
            .ok_or_else(|| ApiError::InvalidResponse(INVALID_TOKEN_RESPONSE.to_string()).into())
    }

    /// Cookie-authenticated GET, no bearer header
    async fn request_refresh(&self) -> Result<RawResponse> {
        let response = self
            .http
            .get(self.refresh_url.clone())
            .send()
            .await
            .map_err(ApiError::from)?;
        read_response(response).await
    }

    fn conflict(&self, body: Value) -> ApiError {
        let message = conflict_message(&body);
        self.events
            .notifications()
            .show(Notice::error(message.clone()));
        ApiError::Conflict { message, body }
    }

    fn save_cookies(&self) {
        if let Some(ref cookies) = self.cookies
            && let Err(e) = cookies.save(&self.jar, &self.refresh_url)
        {
            warn!("Failed to save cookies: {}", e);
        }
    }

    /// Send one HTTP request, attaching `token` as a bearer credential
    async fn dispatch(&self, spec: &RequestSpec, token: Option<&AccessToken>) -> Result<RawResponse> {
        self.limiter.wait_if_active().await;

        let url = format!("{}{}", self.base_url, spec.path);
        debug!("{} {}", spec.method, url);

        let mut request = self.http.request(spec.method.clone(), &url);
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token.bearer());
        }
        if let Some(ref body) = spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from)?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<RawResponse> {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs);

    let text = response
        .text()
        .await
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response: {}", e)))?;

    Ok(RawResponse {
        status,
        body: parse_body(&text),
        retry_after,
    })
}

/// JSON when it parses, otherwise the raw text as a JSON string
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn ensure_writable(resource: Resource) -> Result<()> {
    if resource.is_read_only() {
        return Err(Error::Other(format!("{}s are read-only", resource.label())));
    }
    Ok(())
}

#[async_trait]
impl AuthApi for AdminClient {
    async fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        let credentials = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let spec = RequestSpec::new(Method::POST, self.login_path.as_str()).json(credentials);

        let raw = self.dispatch(&spec, None).await?;
        match raw.status {
            status if status.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(ApiError::Unauthorized.into());
            }
            StatusCode::CONFLICT => return Err(self.conflict(raw.body).into()),
            status => {
                return Err(ApiError::Http {
                    status: status.as_u16(),
                    body: raw.body,
                }
                .into());
            }
        }

        let token = extract_access_token(&raw.body)
            .ok_or_else(|| ApiError::InvalidResponse(INVALID_TOKEN_RESPONSE.to_string()))?;
        self.store.set(&token)?;
        self.save_cookies();

        info!("Signed in as {}", email);
        Ok(token)
    }

    async fn logout(&self) -> Result<()> {
        if let Some(token) = self.store.get() {
            let spec = RequestSpec::new(Method::POST, self.logout_path.as_str());
            match self.dispatch(&spec, Some(&token)).await {
                Ok(raw) if raw.status.is_success() => debug!("Backend session closed"),
                Ok(raw) => debug!("Backend logout answered {}", raw.status),
                Err(e) => debug!("Backend logout failed: {}", e),
            }
        }

        self.store.clear()?;
        if let Some(ref cookies) = self.cookies {
            cookies.remove()?;
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceApi for AdminClient {
    async fn list(
        &self,
        resource: Resource,
        pagination: Option<&PaginationParams>,
    ) -> Result<Value> {
        let params = pagination.cloned().unwrap_or_default();
        let spec =
            RequestSpec::new(Method::GET, resource.path()).query(params.to_query_params());
        Ok(self.send(spec).await?.data())
    }

    async fn fetch(&self, resource: Resource, id: &str) -> Result<Value> {
        Ok(self.get(&resource.item_path(id)).await?.data())
    }

    async fn create(&self, resource: Resource, body: Value) -> Result<Value> {
        ensure_writable(resource)?;
        Ok(self.post(resource.path(), body).await?.data())
    }

    async fn update(&self, resource: Resource, id: &str, body: Value) -> Result<Value> {
        ensure_writable(resource)?;
        Ok(self.put(&resource.item_path(id), body).await?.data())
    }

    async fn remove(&self, resource: Resource, id: &str) -> Result<Value> {
        ensure_writable(resource)?;
        Ok(self.delete(&resource.item_path(id)).await?.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::refresh::RefreshState;
    use crate::config::Timeouts;
    use crate::session::MemoryTokenStore;
    use crate::session::notify::{Navigator, Notifications, Notifier};
    use futures::future::join_all;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Mutex;

    const PRODUCTS: &str = "/api/v1/admin/products";
    const REFRESH: &str = "/api/v1/admin/auth/refresh-token";

    #[derive(Default)]
    struct Recorder {
        notices: Mutex<Vec<Notice>>,
        routes: Mutex<Vec<String>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    impl Navigator for Recorder {
        fn navigate(&self, route: &str) {
            self.routes.lock().unwrap().push(route.to_string());
        }
    }

    struct Harness {
        server: mockito::ServerGuard,
        client: Arc<AdminClient>,
        store: Arc<MemoryTokenStore>,
        recorder: Arc<Recorder>,
    }

    async fn harness(token: Option<&str>) -> Harness {
        harness_with(token, Timeouts {
            logout_delay_ms: 0,
            queue_secs: 5,
            ..Timeouts::default()
        })
        .await
    }

    async fn harness_with(token: Option<&str>, timeouts: Timeouts) -> Harness {
        let server = mockito::Server::new_async().await;
        let config = Config {
            api_host: server.url(),
            timeouts,
            ..Config::default()
        };

        let store = Arc::new(match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        });
        let recorder = Arc::new(Recorder::default());
        let events = SessionEvents::new(
            Notifications::new(Some(recorder.clone())),
            recorder.clone(),
            "/login",
            Duration::ZERO,
        );
        let client = Arc::new(AdminClient::new(&config, store.clone(), events).unwrap());

        Harness {
            server,
            client,
            store,
            recorder,
        }
    }

    fn assert_unauthorized(result: &Result<ApiResponse>) {
        assert!(
            matches!(result, Err(Error::Api(ApiError::Unauthorized))),
            "expected Unauthorized, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let mut h = harness(Some("tok-1234567890")).await;
        let mock = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", "Bearer tok-1234567890")
            .with_status(200)
            .with_body(r#"{"statuscode":200,"responseBody":{"data":[{"id":"p1"}]}}"#)
            .create_async()
            .await;

        let response = h.client.get("/products").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.data(), json!([{ "id": "p1" }]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_token_sends_no_header() {
        let mut h = harness(None).await;
        let mock = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        h.client.get("/products").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_401_without_token_rejects_without_refresh() {
        let mut h = harness(None).await;
        let _products = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(401)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .expect(0)
            .create_async()
            .await;

        let result = h.client.get("/products").await;

        assert_unauthorized(&result);
        refresh.assert_async().await;
        assert!(h.recorder.routes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let mut h = harness(Some("expiredTok123")).await;
        let expired = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", "Bearer expiredTok123")
            .with_status(401)
            .expect(3)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"accessToken":"freshTok9999"}"#)
            .expect(1)
            .create_async()
            .await;
        let fresh = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", "Bearer freshTok9999")
            .with_status(200)
            .with_body("[]")
            .expect(3)
            .create_async()
            .await;

        let results = join_all((0..3).map(|_| h.client.get("/products"))).await;

        assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);
        assert_eq!(h.store.get().unwrap().as_str(), "freshTok9999");
        assert_eq!(h.client.coordinator.state(), RefreshState::Idle);
        expired.assert_async().await;
        refresh.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight_across_threads() {
        let mut h = harness(Some("expiredTok123")).await;
        let _expired = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", "Bearer expiredTok123")
            .with_status(401)
            .expect_at_least(1)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .with_status(200)
            .with_body(r#"{"data":{"token":"freshTok9999"}}"#)
            .expect(1)
            .create_async()
            .await;
        let _fresh = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", "Bearer freshTok9999")
            .with_status(200)
            .with_body("[]")
            .expect(8)
            .create_async()
            .await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = h.client.clone();
                tokio::spawn(async move { client.get("/products").await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_failure_rejects_everyone_and_logs_out_once() {
        let mut h = harness(Some("expiredTok123")).await;
        let _expired = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(401)
            .expect(3)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .with_status(400)
            .with_body(r#"{"message":"refresh token expired"}"#)
            .expect(1)
            .create_async()
            .await;

        let results = join_all((0..3).map(|_| h.client.get("/products"))).await;

        assert!(results.iter().all(|r| r.is_err()));
        assert!(results.iter().any(|r| matches!(r, Err(Error::Api(ApiError::Unauthorized)))));
        assert!(h.store.get().is_none());
        assert_eq!(*h.recorder.routes.lock().unwrap(), vec!["/login".to_string()]);
        let notices = h.recorder.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("Session expired"));
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_401_is_terminal() {
        let mut h = harness(Some("expiredTok123")).await;
        let _expired = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(401)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let result = h.client.get("/products").await;

        assert_unauthorized(&result);
        assert!(h.store.get().is_none());
        assert_eq!(h.recorder.routes.lock().unwrap().len(), 1);
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_slow_refresh_times_out_and_ends_session() {
        let mut h = harness_with(
            Some("expiredTok123"),
            Timeouts {
                logout_delay_ms: 0,
                queue_secs: 5,
                refresh_secs: 1,
                ..Timeouts::default()
            },
        )
        .await;
        let _expired = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(401)
            .create_async()
            .await;
        // Headers go out at once, the body only after the deadline
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(br#"{"token":"freshTok9999"}"#)
            })
            .expect(2)
            .create_async()
            .await;

        let started = std::time::Instant::now();
        let direct = h.client.refresh_access_token().await;
        assert!(
            matches!(direct, Err(Error::Api(ApiError::RefreshTimedOut(after))) if after == Duration::from_secs(1)),
            "{:?}",
            direct
        );
        assert!(started.elapsed() < Duration::from_secs(3));

        let results = join_all((0..3).map(|_| h.client.get("/products"))).await;

        assert!(results.iter().all(|r| r.is_err()), "{:?}", results);
        assert!(h.store.get().is_none());
        assert_eq!(*h.recorder.routes.lock().unwrap(), vec!["/login".to_string()]);
        assert_eq!(h.recorder.notices.lock().unwrap().len(), 1);
        assert_eq!(h.client.coordinator.state(), RefreshState::Idle);
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_refresh_body_is_failure() {
        let mut h = harness(Some("expiredTok123")).await;
        let _expired = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(401)
            .create_async()
            .await;
        let _refresh = h
            .server
            .mock("GET", REFRESH)
            .with_status(200)
            .with_body(r#"{"token":"short"}"#)
            .create_async()
            .await;

        let err = h.client.refresh_access_token().await.unwrap_err();
        assert!(err.to_string().contains(INVALID_TOKEN_RESPONSE));

        let result = h.client.get("/products").await;
        assert_unauthorized(&result);
        assert!(h.store.get().is_none());
    }

    #[tokio::test]
    async fn test_second_401_after_replay_is_final() {
        let mut h = harness(Some("expiredTok123")).await;
        let products = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .with_status(200)
            .with_body(r#"{"token":"freshTok9999"}"#)
            .expect(1)
            .create_async()
            .await;

        let result = h.client.get("/products").await;

        assert_unauthorized(&result);
        assert_eq!(h.store.get().unwrap().as_str(), "freshTok9999");
        assert!(h.recorder.routes.lock().unwrap().is_empty());
        products.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_queued_request_replays_with_new_token() {
        let mut h = harness(Some("expiredTok123")).await;
        let _expired = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", "Bearer expiredTok123")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let fresh = h
            .server
            .mock("GET", PRODUCTS)
            .match_header("authorization", "Bearer freshTok9999")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        // Hold the cycle open as if another request were refreshing
        let expired = AccessToken::new("expiredTok123");
        let guard = match h.client.coordinator.begin(Some(&expired), || h.store.get()) {
            RefreshTicket::Leader(guard) => guard,
            other => panic!("expected leader, got {:?}", other),
        };

        let client = h.client.clone();
        let pending = tokio::spawn(async move { client.get("/products").await });

        for _ in 0..200 {
            if h.client.coordinator.queued() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.client.coordinator.queued(), 1);

        let new_token = AccessToken::new("freshTok9999");
        h.store.set(&new_token).unwrap();
        guard.settle(Ok(new_token));

        assert!(pending.await.unwrap().is_ok());
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_queued_request_times_out() {
        let mut h = harness_with(
            Some("expiredTok123"),
            Timeouts {
                logout_delay_ms: 0,
                queue_secs: 1,
                ..Timeouts::default()
            },
        )
        .await;
        let _expired = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(401)
            .create_async()
            .await;

        let expired = AccessToken::new("expiredTok123");
        let _guard = h.client.coordinator.begin(Some(&expired), || h.store.get());

        let result = h.client.get("/products").await;
        assert!(
            matches!(result, Err(Error::Api(ApiError::QueueTimedOut(_)))),
            "{:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_conflict_notifies_and_rejects() {
        let mut h = harness(Some("tok-1234567890")).await;
        let _mock = h
            .server
            .mock("POST", PRODUCTS)
            .with_status(409)
            .with_body(r#"{"message":"Product already exists"}"#)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .expect(0)
            .create_async()
            .await;

        let result = h
            .client
            .create(Resource::Product, json!({ "name": "Mug" }))
            .await;

        match result {
            Err(Error::Api(err @ ApiError::Conflict { .. })) => {
                assert_eq!(err.statuscode(), Some(409));
                assert!(err.to_string().contains("Product already exists"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        let notices = h.recorder.notices.lock().unwrap();
        assert_eq!(notices.as_slice(), &[Notice::error("Product already exists")]);
        assert_eq!(h.store.get().unwrap().as_str(), "tok-1234567890");
        assert_eq!(h.client.coordinator.state(), RefreshState::Idle);
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_errors_pass_through() {
        let mut h = harness(Some("tok-1234567890")).await;
        let _mock = h
            .server
            .mock("GET", "/api/v1/admin/orders/o-404")
            .with_status(404)
            .with_body(r#"{"message":"Order not found"}"#)
            .create_async()
            .await;

        let result = h.client.fetch(Resource::Order, "o-404").await;

        match result {
            Err(Error::Api(ApiError::Http { status, body })) => {
                assert_eq!(status, 404);
                assert_eq!(body["message"], "Order not found");
            }
            other => panic!("expected 404 passthrough, got {:?}", other),
        }
        assert!(h.recorder.notices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_429_activates_rate_limiting() {
        let mut h = harness(Some("tok-1234567890")).await;
        let _mock = h
            .server
            .mock("GET", PRODUCTS)
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let result = h.client.get("/products").await;

        match result {
            Err(Error::Api(ApiError::RateLimit(after))) => {
                assert_eq!(after, Duration::from_secs(7))
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
        assert!(h.client.limiter.is_active());
    }

    #[tokio::test]
    async fn test_login_stores_token_and_cookie_reaches_refresh() {
        let mut h = harness(None).await;
        let login = h
            .server
            .mock("POST", "/api/v1/admin/auth/login")
            .match_body(Matcher::Json(json!({
                "email": "ops@example.com",
                "password": "hunter22"
            })))
            .with_status(200)
            .with_header("set-cookie", "refreshToken=r-cookie-1; Path=/; HttpOnly")
            .with_body(r#"{"statuscode":200,"responseBody":{"data":{"accessToken":"loginToken1234"}}}"#)
            .create_async()
            .await;
        let refresh = h
            .server
            .mock("GET", REFRESH)
            .match_header("cookie", "refreshToken=r-cookie-1")
            .with_status(200)
            .with_body(r#""rawRefreshedToken""#)
            .create_async()
            .await;

        let token = h.client.login("ops@example.com", "hunter22").await.unwrap();
        assert_eq!(token.as_str(), "loginToken1234");
        assert_eq!(h.store.get().unwrap().as_str(), "loginToken1234");

        let refreshed = h.client.refresh_access_token().await.unwrap();
        assert_eq!(refreshed.as_str(), "rawRefreshedToken");
        login.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut h = harness(None).await;
        let _login = h
            .server
            .mock("POST", "/api/v1/admin/auth/login")
            .with_status(401)
            .create_async()
            .await;

        let result = h.client.login("ops@example.com", "wrong").await;
        assert!(matches!(result, Err(Error::Api(ApiError::Unauthorized))));
        assert!(h.store.get().is_none());
    }

    #[tokio::test]
    async fn test_login_bad_request_is_unauthorized() {
        let mut h = harness(None).await;
        let _login = h
            .server
            .mock("POST", "/api/v1/admin/auth/login")
            .with_status(400)
            .with_body(r#"{"message":"Invalid email or password"}"#)
            .create_async()
            .await;

        let result = h.client.login("ops@example.com", "").await;
        assert!(
            matches!(result, Err(Error::Api(ApiError::Unauthorized))),
            "{:?}",
            result
        );
        assert!(h.store.get().is_none());
        assert!(h.recorder.notices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_token_even_if_backend_fails() {
        let mut h = harness(Some("tok-1234567890")).await;
        let logout = h
            .server
            .mock("POST", "/api/v1/admin/auth/logout")
            .match_header("authorization", "Bearer tok-1234567890")
            .with_status(500)
            .create_async()
            .await;

        h.client.logout().await.unwrap();

        assert!(h.store.get().is_none());
        logout.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_sends_pagination() {
        let mut h = harness(Some("tok-1234567890")).await;
        let _mock = h
            .server
            .mock("GET", "/api/v1/admin/categories")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"responseBody":{"data":[{"id":"c1","name":"Shoes"}]}}"#)
            .create_async()
            .await;

        let params = PaginationParams::new().page(2).limit(5);
        let data = h.client.list(Resource::Category, Some(&params)).await.unwrap();

        assert_eq!(data, json!([{ "id": "c1", "name": "Shoes" }]));
    }

    #[tokio::test]
    async fn test_admin_logs_are_read_only() {
        let h = harness(Some("tok-1234567890")).await;

        let result = h.client.remove(Resource::AdminLog, "1").await;
        assert!(matches!(result, Err(Error::Other(_))));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"a":1}"#), json!({ "a": 1 }));
        assert_eq!(parse_body("plain"), json!("plain"));
    }
}
