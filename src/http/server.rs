//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, CORS, headers)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown, bounded by a deadline

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::health::healthz;
use crate::http::request::MakeRequestUuidV4;
use crate::http::session::{create_session, SessionState};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::security::{cors_middleware, headers, OriginPolicy};
use crate::session::{SessionCreator, SessionRequestValidator};

pub const SESSION_PATH: &str = "/api/chatkit/session";
pub const HEALTH_PATH: &str = "/healthz";

/// How long cancelled connections get to flush their 503 before `run`
/// stops waiting on them.
const CANCEL_GRACE: Duration = Duration::from_secs(1);

/// HTTP server for the session relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    /// Fired when the drain deadline passes; every in-flight handler is
    /// dropped and answered 503.
    cancel: Shutdown,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and upstream
    /// gateway.
    pub fn new(config: RelayConfig, gateway: Arc<dyn SessionCreator>) -> Self {
        let state = SessionState {
            gateway,
            validator: Arc::new(SessionRequestValidator::new(&config.session)),
            upstream_timeout: Duration::from_secs(config.upstream.timeout_secs),
        };
        let policy = Arc::new(OriginPolicy::from_list(&config.cors.allowed_origins));

        tracing::info!(
            mode = ?config.session.mode,
            cors_wildcard = policy.is_wildcard(),
            upstream_timeout_secs = config.upstream.timeout_secs,
            request_timeout_secs = config.timeouts.request_secs,
            "Session relay configured"
        );

        let cancel = Shutdown::new();
        let router = Self::build_router(&config, state, policy, cancel.subscribe());
        Self {
            router,
            config,
            cancel,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &RelayConfig,
        state: SessionState,
        policy: Arc<OriginPolicy>,
        cancel: ShutdownSignal,
    ) -> Router {
        let router = Router::new()
            .route(HEALTH_PATH, get(healthz))
            .route(SESSION_PATH, any(create_session))
            .with_state(state)
            .layer(middleware::from_fn_with_state(policy, cors_middleware));

        let router = if config.security.enable_headers {
            headers::apply(router)
        } else {
            router
        };

        router
            .layer(middleware::from_fn_with_state(cancel, cancel_on_deadline))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests
    /// for at most `timeouts.shutdown_secs`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let drain = Duration::from_secs(self.config.timeouts.shutdown_secs);
        tracing::info!(address = %addr, "HTTP server starting");

        let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                let _ = signalled_tx.send(());
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            biased;
            result = &mut serve => return result,
            _ = signalled_rx => {}
        }

        tracing::info!(drain_secs = drain.as_secs(), "Draining in-flight requests");
        if let Ok(result) = tokio::time::timeout(drain, &mut serve).await {
            tracing::info!("HTTP server stopped");
            return result;
        }

        tracing::warn!("Drain deadline exceeded; cancelling remaining requests");
        self.cancel.trigger();
        match tokio::time::timeout(CANCEL_GRACE, serve).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Connections still open after cancellation; giving up on them");
                Ok(())
            }
        }
    }
}

/// Race the request against the drain deadline. Losing drops the handler
/// future, which also drops any upstream call it was awaiting.
async fn cancel_on_deadline(
    State(mut cancel): State<ShutdownSignal>,
    request: Request<Body>,
    next: Next,
) -> Response {
    tokio::select! {
        response = next.run(request) => response,
        _ = cancel.triggered() => {
            tracing::warn!("Request cancelled at drain deadline");
            (StatusCode::SERVICE_UNAVAILABLE, "server shutting down").into_response()
        }
    }
}
