//! HTTP routes, one set per namespace.
//!
//! | Method | Path | Operation |
//! |---|---|---|
//! | `GET` | `/health` | liveness and served namespaces |
//! | `GET` | `/{namespace}/directories` | category folders per letter |
//! | `GET` | `/{namespace}/invoice` | next pending invoice |
//! | `POST` | `/{namespace}/sort` | file an invoice |
//! | `POST` | `/{namespace}/folders` | create a category folder |
//! | `POST` | `/{namespace}/undo` | reverse a sort or folder creation |
//!
//! Every body is `{success, message, ...payload}`. The status code follows
//! the [`Cause`] of a failure.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use filer_engine::{
    Cause, CreateFolderRequest, Invoice, LetterBucket, Namespace, Outcome, Registry, SortRequest, UndoRequest,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:namespace/directories", get(list_directories))
        .route("/:namespace/invoice", get(next_invoice))
        .route("/:namespace/sort", post(sort))
        .route("/:namespace/folders", post(create_folder))
        .route("/:namespace/undo", post(undo))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(registry)
}

#[derive(Serialize)]
struct Reply<T> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<Cause>,
    #[serde(flatten)]
    payload: Option<T>,
}

#[derive(Serialize)]
struct Directories {
    directories: Vec<LetterBucket>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Recorded<R> {
    undo_record: R,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionId {
    action_id: Value,
}

fn status(cause: Cause) -> StatusCode {
    match cause {
        Cause::InvalidInput => StatusCode::BAD_REQUEST,
        Cause::NotFound => StatusCode::NOT_FOUND,
        Cause::Conflict | Cause::NotEmpty => StatusCode::CONFLICT,
        Cause::PartialTransfer | Cause::Storage | Cause::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(cause: Option<Cause>, message: impl Into<String>, payload: Option<T>) -> Response {
    let body = Reply {
        success: cause.is_none(),
        message: message.into(),
        cause,
        payload,
    };
    (cause.map_or(StatusCode::OK, status), Json(body)).into_response()
}

fn reply<T: Serialize>(outcome: Outcome<T>) -> Response {
    match outcome {
        Outcome::Success { message, payload } => respond(None, message, Some(payload)),
        Outcome::Failure { message, cause } => respond::<T>(Some(cause), message, None),
    }
}

fn lookup(registry: &Registry, name: &str) -> Result<Arc<Namespace>, Response> {
    registry.get(name).ok_or_else(|| {
        tracing::debug!(namespace = name, "Request for unknown namespace");
        respond::<()>(Some(Cause::NotFound), format!("Namespace {name} does not exist."), None)
    })
}

fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(request)| request).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        respond::<()>(Some(Cause::InvalidInput), format!("Invalid request - {}", rejection.body_text()), None)
    })
}

async fn health(State(registry): State<Registry>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "namespaces": registry.names().collect::<Vec<_>>(),
    }))
}

async fn list_directories(State(registry): State<Registry>, Path(name): Path<String>) -> Response {
    let namespace = match lookup(&registry, &name) {
        Ok(namespace) => namespace,
        Err(response) => return response,
    };
    reply(namespace.list_directories().await.map(|directories| Directories { directories }))
}

async fn next_invoice(State(registry): State<Registry>, Path(name): Path<String>) -> Response {
    let namespace = match lookup(&registry, &name) {
        Ok(namespace) => namespace,
        Err(response) => return response,
    };
    reply::<Invoice>(namespace.next_invoice().await)
}

async fn sort(
    State(registry): State<Registry>,
    Path(name): Path<String>,
    request: Result<Json<SortRequest>, JsonRejection>,
) -> Response {
    let (namespace, request) = match (lookup(&registry, &name), body(request)) {
        (Ok(namespace), Ok(request)) => (namespace, request),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    reply(namespace.sort(request).await.map(|undo_record| Recorded { undo_record }))
}

async fn create_folder(
    State(registry): State<Registry>,
    Path(name): Path<String>,
    request: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> Response {
    let (namespace, request) = match (lookup(&registry, &name), body(request)) {
        (Ok(namespace), Ok(request)) => (namespace, request),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    reply(namespace.create_folder(request).await.map(|undo_record| Recorded { undo_record }))
}

/// The caller's `actionId` is echoed back whether or not the undo worked.
async fn undo(
    State(registry): State<Registry>,
    Path(name): Path<String>,
    request: Result<Json<UndoRequest>, JsonRejection>,
) -> Response {
    let (namespace, request) = match (lookup(&registry, &name), body(request)) {
        (Ok(namespace), Ok(request)) => (namespace, request),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    let undone = namespace.undo(request).await;
    let action_id = Some(ActionId { action_id: undone.action_id });
    respond(undone.outcome.cause(), undone.outcome.message(), action_id)
}
