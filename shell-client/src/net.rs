// shell-client/src/net.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::{AuthContext, AuthMode};
use crate::context::AppContext;
use crate::error::NetworkError;

/// One outbound request as seen by the transport layer
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Raw response before any policy or parsing is applied
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

/// Seam between the client and the wire, so tests can run against a
/// scripted in-memory transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, NetworkError>;
}

/// Production transport backed by reqwest
pub struct HttpTransport {
    inner: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { inner: reqwest::Client::new() }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, NetworkError> {
        let mut builder = self.inner.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        Ok(TransportResponse { status: status.as_u16(), status_text, body })
    }
}

/// How response status codes are classified.
///
/// The backend answers 201 when a first data call creates the user record,
/// so the default accepts any 2xx. `StrictOk` is available for callers that
/// want 200 only; the choice is explicit here rather than diverging
/// silently by call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// Any 2xx counts as success (default)
    AnySuccess,
    /// Only 200 OK counts; 201 and other 2xx are treated as errors
    StrictOk,
}

impl SuccessPolicy {
    pub fn accepts(&self, status: u16) -> bool {
        match self {
            SuccessPolicy::AnySuccess => (200..300).contains(&status),
            SuccessPolicy::StrictOk => status == 200,
        }
    }
}

/// Wraps the request primitive: merges headers, serializes JSON bodies,
/// and normalizes non-success responses into errors. The auth context is
/// re-resolved on every call.
pub struct NetworkClient {
    ctx: Arc<AppContext>,
    transport: Arc<dyn Transport>,
    policy: SuccessPolicy,
}

impl NetworkClient {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self::with_transport(ctx, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(ctx: Arc<AppContext>, transport: Arc<dyn Transport>) -> Self {
        Self { ctx, transport, policy: SuccessPolicy::AnySuccess }
    }

    pub fn with_success_policy(mut self, policy: SuccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Issue a JSON call. Caller-supplied headers win over resolver
    /// headers on key collision.
    pub async fn call(
        &self,
        url: &str,
        method: Method,
        body: Option<&Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<Value, NetworkError> {
        let response = self.request(url, method, body, extra_headers).await?;
        let value = serde_json::from_str(&response.body)?;
        Ok(value)
    }

    /// Fetch a resource as raw text, with the same credential resolution
    /// as JSON calls. Used for view markup/style/script resources.
    pub async fn fetch_text(&self, url: &str) -> Result<String, NetworkError> {
        let response = self.request(url, Method::GET, None, &[]).await?;
        Ok(response.body)
    }

    async fn request(
        &self,
        url: &str,
        method: Method,
        body: Option<&Value>,
        extra_headers: &[(&str, &str)],
    ) -> Result<TransportResponse, NetworkError> {
        // Fresh resolution per call; host availability changes apply
        // on the very next request.
        let auth = AuthContext::resolve(&self.ctx);
        let headers = merge_headers(&auth.headers, extra_headers);

        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %url, mode = ?auth.mode, "issuing request");

        let body = match body {
            Some(value) => Some(
                serde_json::to_string(value).map_err(|e| NetworkError::Encode(e.to_string()))?,
            ),
            None => None,
        };

        let response = self
            .transport
            .send(TransportRequest { method, url: url.to_string(), headers, body })
            .await?;

        if !self.policy.accepts(response.status) {
            tracing::debug!(%request_id, status = response.status, "request rejected");
            if response.status == 401 && auth.mode == AuthMode::Anonymous {
                return Err(NetworkError::AuthUnavailable);
            }
            return Err(NetworkError::Status {
                status: response.status,
                status_text: response.status_text,
            });
        }

        Ok(response)
    }
}

/// Merge resolver headers with caller extras; the caller wins on collision
pub fn merge_headers(
    auth_headers: &BTreeMap<String, String>,
    extra_headers: &[(&str, &str)],
) -> Vec<(String, String)> {
    let mut merged = auth_headers.clone();
    for (name, value) in extra_headers {
        merged.insert((*name).to_string(), (*value).to_string());
    }
    merged.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{CONTENT_TYPE_HEADER, CONTENT_TYPE_JSON};
    use common::Config;
    use serde_json::json;
    use std::sync::Mutex;

    /// Transport that answers every request with one canned response and
    /// records what it was asked to send.
    struct RecordingTransport {
        status: u16,
        body: String,
        requests: Mutex<Vec<TransportRequest>>,
    }

    impl RecordingTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self { status, body: body.to_string(), requests: Mutex::new(Vec::new()) })
        }

        fn last_request(&self) -> TransportRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse, NetworkError> {
            self.requests.lock().unwrap().push(request);
            Ok(TransportResponse {
                status: self.status,
                status_text: String::new(),
                body: self.body.clone(),
            })
        }
    }

    fn anonymous_client(transport: Arc<RecordingTransport>) -> NetworkClient {
        let defaults = Config::default();
        let ctx = Arc::new(crate::context::AppContext::new(defaults.shell, defaults.auth, None));
        NetworkClient::with_transport(ctx, transport)
    }

    #[test]
    fn caller_headers_win_on_collision() {
        let mut auth_headers = BTreeMap::new();
        auth_headers.insert(CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE_JSON.to_string());

        let merged = merge_headers(&auth_headers, &[(CONTENT_TYPE_HEADER, "text/plain")]);
        assert_eq!(merged, vec![(CONTENT_TYPE_HEADER.to_string(), "text/plain".to_string())]);
    }

    #[test]
    fn disjoint_headers_are_both_kept() {
        let mut auth_headers = BTreeMap::new();
        auth_headers.insert(CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE_JSON.to_string());

        let merged = merge_headers(&auth_headers, &[("X-Custom", "1")]);
        assert!(merged.contains(&(CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE_JSON.to_string())));
        assert!(merged.contains(&("X-Custom".to_string(), "1".to_string())));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn success_policy_classifies_created() {
        assert!(SuccessPolicy::AnySuccess.accepts(201));
        assert!(!SuccessPolicy::StrictOk.accepts(201));
        assert!(SuccessPolicy::StrictOk.accepts(200));
        assert!(!SuccessPolicy::AnySuccess.accepts(404));
    }

    #[test]
    fn encode_and_parse_errors_name_their_direction() {
        let encode = NetworkError::Encode("key must be a string".to_string());
        assert!(encode.to_string().starts_with("request body"));

        let parse = serde_json::from_str::<Value>("<html>").unwrap_err();
        assert!(NetworkError::from(parse).to_string().starts_with("response body"));
    }

    #[tokio::test]
    async fn call_sends_merged_headers_and_json_body() {
        let transport = RecordingTransport::new(200, "{\"ok\":true}");
        let client = anonymous_client(Arc::clone(&transport));

        let result = client
            .call("http://test/api/echo", Method::POST, Some(&json!({"a": 1})), &[("X-Custom", "1")])
            .await
            .unwrap();

        assert_eq!(result, json!({"ok": true}));

        let request = transport.last_request();
        assert_eq!(request.body.as_deref(), Some("{\"a\":1}"));
        assert!(request
            .headers
            .contains(&(CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE_JSON.to_string())));
        assert!(request.headers.contains(&("X-Custom".to_string(), "1".to_string())));
    }

    #[tokio::test]
    async fn anonymous_rejection_surfaces_as_auth_unavailable() {
        let transport = RecordingTransport::new(401, "{\"error\":\"no auth\"}");
        let client = anonymous_client(transport);

        let err = client
            .call("http://test/api/user/get_data", Method::POST, None, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, NetworkError::AuthUnavailable));
    }

    #[tokio::test]
    async fn non_success_surfaces_status() {
        let transport = RecordingTransport::new(500, "oops");
        let client = anonymous_client(transport);

        let err = client.fetch_text("http://test/pages/main/index.html").await.unwrap_err();
        assert!(matches!(err, NetworkError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn unparseable_success_body_is_a_parse_error() {
        let transport = RecordingTransport::new(200, "<html>not json</html>");
        let client = anonymous_client(transport);

        let err = client.call("http://test/api/user/get_data", Method::POST, None, &[]).await.unwrap_err();
        assert!(matches!(err, NetworkError::Parse(_)));
    }

    #[tokio::test]
    async fn strict_policy_rejects_created() {
        let transport = RecordingTransport::new(201, "{\"user\":{\"id\":1}}");
        let client = anonymous_client(transport).with_success_policy(SuccessPolicy::StrictOk);

        let err = client.call("http://test/api/user/get_data", Method::POST, None, &[]).await.unwrap_err();
        assert!(matches!(err, NetworkError::Status { status: 201, .. }));
    }
}
