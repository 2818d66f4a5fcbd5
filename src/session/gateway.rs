//! Upstream session-creation gateway.
//!
//! # Responsibilities
//! - Define the capability the request pipeline depends on
//! - Provide the concrete HTTP client for the ChatKit sessions API
//! - Classify upstream failures for logging
//!
//! # Design Decisions
//! - The pipeline owns the deadline; the gateway never retries
//! - Closures implement [`SessionCreator`] so tests can stub the upstream
//! - Error detail stays server-side; callers map every failure to one
//!   generic client response

use std::future::Future;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::session::types::{ClientSecret, EffectiveSessionParameters, ExpiryAnchor};

const SESSIONS_PATH: &str = "chatkit/sessions";
const BETA_HEADER: &str = "openai-beta";
const BETA_VALUE: &str = "chatkit_beta=v1";
/// Upstream error bodies are truncated to this many bytes before logging.
const MAX_LOGGED_BODY: usize = 512;

/// Errors from a session-creation attempt.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection, TLS or I/O failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Upstream answered 2xx with an unusable body.
    #[error("malformed upstream response: {0}")]
    Decode(String),

    /// The call did not finish within the deadline.
    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// Gateway could not be constructed.
    #[error("gateway configuration error: {0}")]
    Config(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Capability to create an upstream chat session.
pub trait SessionCreator: Send + Sync {
    fn create(&self, params: EffectiveSessionParameters) -> BoxFuture<'_, GatewayResult<ClientSecret>>;
}

impl<F, Fut> SessionCreator for F
where
    F: Fn(EffectiveSessionParameters) -> Fut + Send + Sync,
    Fut: Future<Output = GatewayResult<ClientSecret>> + Send + 'static,
{
    fn create(&self, params: EffectiveSessionParameters) -> BoxFuture<'_, GatewayResult<ClientSecret>> {
        Box::pin(self(params))
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionBody<'a> {
    user: &'a str,
    workflow: WorkflowParam<'a>,
    expires_after: ExpiresAfterParam,
    rate_limits: RateLimitsParam,
}

#[derive(Debug, Serialize)]
struct WorkflowParam<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct ExpiresAfterParam {
    anchor: ExpiryAnchor,
    seconds: u64,
}

#[derive(Debug, Serialize)]
struct RateLimitsParam {
    max_requests_per_1_minute: u64,
}

#[derive(Debug, Deserialize)]
struct ChatSession {
    client_secret: String,
}

impl<'a> From<&'a EffectiveSessionParameters> for CreateSessionBody<'a> {
    fn from(params: &'a EffectiveSessionParameters) -> Self {
        Self {
            user: &params.user,
            workflow: WorkflowParam { id: &params.workflow_id },
            expires_after: ExpiresAfterParam {
                anchor: params.expiry_anchor,
                seconds: params.expires_after_seconds,
            },
            rate_limits: RateLimitsParam {
                max_requests_per_1_minute: params.rate_limit_per_minute,
            },
        }
    }
}

/// HTTP client for `POST {base_url}/chatkit/sessions`.
#[derive(Clone)]
pub struct OpenAiSessionGateway {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl OpenAiSessionGateway {
    /// Create a gateway from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> GatewayResult<Self> {
        let endpoint = sessions_endpoint(&config.base_url)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| GatewayError::Config("API key is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(BETA_HEADER, HeaderValue::from_static(BETA_VALUE));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.timeout_secs));
        if is_loopback(&endpoint) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        tracing::info!(endpoint = %endpoint, "Session gateway initialized");

        Ok(Self { client, endpoint })
    }

    async fn create_session(&self, params: EffectiveSessionParameters) -> GatewayResult<ClientSecret> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&CreateSessionBody::from(&params))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body: truncate(body, MAX_LOGGED_BODY),
            });
        }

        let session: ChatSession = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if session.client_secret.is_empty() {
            return Err(GatewayError::Decode("empty client_secret".to_string()));
        }

        Ok(ClientSecret::new(session.client_secret))
    }
}

impl SessionCreator for OpenAiSessionGateway {
    fn create(&self, params: EffectiveSessionParameters) -> BoxFuture<'_, GatewayResult<ClientSecret>> {
        Box::pin(self.create_session(params))
    }
}

fn sessions_endpoint(base_url: &str) -> GatewayResult<url::Url> {
    let base = format!("{}/", base_url.trim_end_matches('/'));
    url::Url::parse(&base)
        .and_then(|base| base.join(SESSIONS_PATH))
        .map_err(|e| GatewayError::Config(format!("invalid base URL '{}': {}", base_url, e)))
}

/// Local upstreams (development stubs) bypass any system proxy.
fn is_loopback(url: &url::Url) -> bool {
    match url.host() {
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        None => false,
    }
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut end = max;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EffectiveSessionParameters {
        EffectiveSessionParameters {
            user: "u".into(),
            workflow_id: "wf_1".into(),
            expires_after_seconds: 1200,
            rate_limit_per_minute: 10,
            expiry_anchor: ExpiryAnchor::CreatedAt,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let p = params();
        let body = serde_json::to_value(CreateSessionBody::from(&p)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "user": "u",
                "workflow": { "id": "wf_1" },
                "expires_after": { "anchor": "created_at", "seconds": 1200 },
                "rate_limits": { "max_requests_per_1_minute": 10 },
            })
        );
    }

    #[test]
    fn test_sessions_endpoint() {
        assert_eq!(
            sessions_endpoint("https://api.openai.com/v1").unwrap().as_str(),
            "https://api.openai.com/v1/chatkit/sessions"
        );
        assert_eq!(
            sessions_endpoint("http://127.0.0.1:9999/v1/").unwrap().as_str(),
            "http://127.0.0.1:9999/v1/chatkit/sessions"
        );
        assert!(sessions_endpoint("not a url").is_err());
    }

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback(&url::Url::parse("http://127.0.0.1:9/v1").unwrap()));
        assert!(is_loopback(&url::Url::parse("http://localhost/v1").unwrap()));
        assert!(is_loopback(&url::Url::parse("http://[::1]:9/").unwrap()));
        assert!(!is_loopback(&url::Url::parse("https://api.openai.com/v1").unwrap()));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo".to_string(), 2), "h");
        assert_eq!(truncate("short".to_string(), 512), "short");
    }

    #[tokio::test]
    async fn test_closure_is_a_session_creator() {
        let creator = |p: EffectiveSessionParameters| async move {
            Ok::<_, GatewayError>(ClientSecret::new(format!("secret-{}", p.user)))
        };
        let secret = creator.create(params()).await.unwrap();
        assert_eq!(secret.expose(), "secret-u");
    }
}
