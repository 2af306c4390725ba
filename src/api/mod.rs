use std::sync::Arc;

use axum::{
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    BoxError, Router,
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::AppState;

pub mod handlers;

/// Build the full HTTP surface: admin API, intake, EDL feed, metrics, and
/// the static admin UI as fallback.
pub fn router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.config.assets_dir);
    let request_timeout = state.config.request_timeout;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/requests", get(handlers::list_requests))
        .route("/accept", post(handlers::accept_request))
        .route("/reject", post(handlers::reject_request))
        .route("/request", post(handlers::submit_request))
        .route("/edl", get(handlers::edl_feed))
        .route("/metrics", get(handlers::metrics))
        .fallback_service(assets)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}

/// A request that outlives its deadline fails like any other request: bare 500.
async fn handle_timeout(err: BoxError) -> StatusCode {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::error!("request timed out");
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Middleware: tags every response with a unique `x-request-id` so callers
/// can correlate a bare 500 with the server logs.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let span = tracing::info_span!("http", request_id = %req_id);

    let mut resp = next.run(req).instrument(span).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
