//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use chatkit_session_relay::config::{RelayConfig, SessionPolicyMode};
use chatkit_session_relay::session::{
    ClientSecret, EffectiveSessionParameters, GatewayError, GatewayResult, SessionCreator,
};
use tokio::net::TcpListener;

/// A request captured by the stub upstream.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Start a stub ChatKit API on an ephemeral port. Every call to
/// `POST /v1/chatkit/sessions` is recorded and answered with `(status, body)`
/// after `delay`.
pub async fn start_stub_upstream(
    status: u16,
    body: &'static str,
    delay: Duration,
) -> (SocketAddr, Arc<Mutex<Vec<CapturedRequest>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();

    let app = Router::new().route(
        "/v1/chatkit/sessions",
        post(move |headers: HeaderMap, raw: String| {
            let sink = sink.clone();
            async move {
                let json = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);
                sink.lock().unwrap().push(CapturedRequest { headers, body: json });
                tokio::time::sleep(delay).await;
                (
                    StatusCode::from_u16(status).unwrap(),
                    [("content-type", "application/json")],
                    body,
                )
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, captured)
}

/// A valid configuration in server-fixed mode with `("w", 1200, 10)`.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.api_key = "sk-test".into();
    config.session.workflow_id = "w".into();
    config.session.expires_after_seconds = 1200;
    config.session.rate_limit_per_minute = 10;
    config
}

pub fn client_supplied_config() -> RelayConfig {
    let mut config = test_config();
    config.session.mode = SessionPolicyMode::ClientSupplied;
    config
}

/// Stub gateway recording every call.
#[derive(Clone, Default)]
pub struct StubGateway {
    pub secret: Option<String>,
    pub error: Option<String>,
    pub calls: Arc<Mutex<Vec<EffectiveSessionParameters>>>,
}

impl StubGateway {
    pub fn succeeding(secret: &str) -> Self {
        Self {
            secret: Some(secret.to_string()),
            ..Default::default()
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<EffectiveSessionParameters> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl SessionCreator for StubGateway {
    fn create(
        &self,
        params: EffectiveSessionParameters,
    ) -> futures_util::future::BoxFuture<'_, GatewayResult<ClientSecret>> {
        self.calls.lock().unwrap().push(params);
        let result = match (&self.secret, &self.error) {
            (_, Some(error)) => Err(GatewayError::Transport(error.clone())),
            (Some(secret), None) => Ok(ClientSecret::new(secret.clone())),
            (None, None) => Err(GatewayError::Decode("no secret configured".into())),
        };
        Box::pin(async move { result })
    }
}
