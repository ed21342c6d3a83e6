//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create the axum Router with the feed and health handlers
//! - Wire up middleware (tracing, request ID)
//! - Route aggregation failures to the fallback at the handler boundary
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - Feed endpoints never surface a 5xx for an upstream failure; the
//!   fallback body with 200 is the whole point of the degraded mode
//! - Unknown user on the per-user endpoint is an honest 404
//! - Breaker state is exposed read-only for operational visibility

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::FeedConfig;
use crate::feed::{FallbackProvider, FeedAggregator, FeedError};
use crate::http::request::request_id_middleware;
use crate::model::FeedEntry;
use crate::observability::metrics;
use crate::resilience::{BreakerRegistry, BreakerState};
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<FeedAggregator>,
    pub fallback: Arc<FallbackProvider>,
    pub breakers: Arc<BreakerRegistry>,
}

/// HTTP server for the feed aggregation service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &FeedConfig) -> Self {
        let client = UpstreamClient::new(&config.upstreams);
        let breakers = Arc::new(BreakerRegistry::new(config.breaker.clone()));
        let aggregator = Arc::new(FeedAggregator::new(client, breakers.clone()));

        let state = AppState {
            aggregator,
            fallback: Arc::new(FallbackProvider),
            breakers,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/feed/all", get(get_feed))
            .route("/feed/user/{user_name}", get(get_posts_by_user))
            .route("/health", get(get_health))
            .with_state(state)
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// `GET /feed/all`: the aggregated feed, degraded but well-formed during
/// an outage.
async fn get_feed(State(state): State<AppState>, headers: HeaderMap) -> Json<Vec<FeedEntry>> {
    let auth = bearer_token(&headers);
    match state.aggregator.feed(auth.as_deref()).await {
        Ok(entries) => {
            metrics::record_feed_request("/feed/all", "ok");
            Json(entries)
        }
        Err(cause) => {
            metrics::record_feed_request("/feed/all", "degraded");
            Json(state.fallback.feed_fallback(&cause))
        }
    }
}

/// `GET /feed/user/{userName}`: one user's posts, 404 when the user does
/// not exist.
async fn get_posts_by_user(
    State(state): State<AppState>,
    Path(user_name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let auth = bearer_token(&headers);
    match state.aggregator.posts_by_user(&user_name, auth.as_deref()).await {
        Ok(entries) => {
            metrics::record_feed_request("/feed/user", "ok");
            Json(entries).into_response()
        }
        Err(FeedError::UserNotFound { user_name }) => {
            metrics::record_feed_request("/feed/user", "not_found");
            tracing::debug!(user_name = %user_name, "User not found");
            (StatusCode::NOT_FOUND, format!("user not found: {}", user_name)).into_response()
        }
        Err(cause) => {
            metrics::record_feed_request("/feed/user", "degraded");
            Json(state.fallback.feed_fallback(&cause)).into_response()
        }
    }
}

/// Health report including per-dependency breaker state.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub breakers: BTreeMap<&'static str, BreakerState>,
}

/// `GET /health`: liveness plus a read-only view of every breaker.
async fn get_health(State(state): State<AppState>) -> Json<HealthReport> {
    let breakers = state.breakers.states().into_iter().collect();
    Json(HealthReport {
        status: "up",
        breakers,
    })
}
