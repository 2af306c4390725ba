use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;

use crate::errors::EdlError;
use crate::models::request::{Request, RequestId};
use crate::AppState;

// ── Form bodies ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DecisionForm {
    /// A missing field is treated like an empty id and fails the decision.
    #[serde(default)]
    pub requestid: String,
}

#[derive(Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub reason: String,
}

/// Pull the decision's request id from the form body, falling back to the
/// query string. A body that isn't a urlencoded form counts as absent, so the
/// decision still ends in `InvalidRequestId` (500) rather than a 4xx.
fn decision_id(
    query: Result<Query<DecisionForm>, QueryRejection>,
    form: Result<Form<DecisionForm>, FormRejection>,
) -> Result<RequestId, EdlError> {
    let from_body = match form {
        Ok(Form(form)) => form.requestid,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "decision body is not a form");
            String::new()
        }
    };
    let from_query = match query {
        Ok(Query(query)) => query.requestid,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable decision query string");
            String::new()
        }
    };

    if from_body.is_empty() {
        RequestId::parse(&from_query)
    } else {
        RequestId::parse(&from_body)
    }
}

/// 302 back to the admin UI after a decision.
fn back_to_index() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /requests — every pending request as a JSON array
pub async fn list_requests(State(state): State<Arc<AppState>>) -> Result<Response, EdlError> {
    let listing = state.requests.list().await?;
    for id in &listing.incomplete {
        tracing::warn!(request_id = %id, "skipping request with missing fields");
    }
    state.metrics.set_pending(listing.requests.len());

    let body = serde_json::to_vec(&listing.requests)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// POST /accept — add the request's URL to the EDL and retire the request
pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DecisionForm>, QueryRejection>,
    form: Result<Form<DecisionForm>, FormRejection>,
) -> Result<Response, EdlError> {
    let result = match decision_id(query, form) {
        Ok(id) => state.engine.accept(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(accepted) => {
            if !accepted.newly_listed {
                state.metrics.record_duplicate();
                tracing::info!(
                    request_id = %accepted.id,
                    url = %accepted.url,
                    "URL already present in EDL set"
                );
            }
            tracing::info!(request_id = %accepted.id, url = %accepted.url, "request accepted");
            state.metrics.record_transition("accept", "ok");
            Ok(back_to_index())
        }
        Err(e) => {
            state.metrics.record_transition("accept", e.kind());
            Err(e)
        }
    }
}

/// POST /reject — discard the request
pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DecisionForm>, QueryRejection>,
    form: Result<Form<DecisionForm>, FormRejection>,
) -> Result<Response, EdlError> {
    let result = match decision_id(query, form) {
        Ok(id) => state.engine.reject(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(rejected) => {
            tracing::info!(request_id = %rejected.id, "request rejected");
            state.metrics.record_transition("reject", "ok");
            Ok(back_to_index())
        }
        Err(e) => {
            state.metrics.record_transition("reject", e.kind());
            Err(e)
        }
    }
}

/// POST /request — record a new pending unblock request
pub async fn submit_request(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SubmitForm>,
) -> Result<(StatusCode, Json<Request>), EdlError> {
    let request = state
        .requests
        .submit(&form.user, &form.url, &form.reason)
        .await?;
    tracing::info!(request_id = %request.id, user = %request.user, "request submitted");
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /edl — the list consumed by the enforcement point
pub async fn edl_feed(State(state): State<Arc<AppState>>) -> Result<Response, EdlError> {
    let body = state.edl.render().await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.encode(),
    )
        .into_response()
}
