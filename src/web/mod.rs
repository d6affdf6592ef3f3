//! HTTP surface: routing, role enforcement, and JSON request/response
//! shapes for the key-value store.

mod handlers;
mod state;

pub use state::AppState;

use crate::core::DbError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Database(DbError),
    Input(String),
    RoleViolation(String),
}

impl From<DbError> for WebError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::RoleViolation(role, reason) => {
                WebError::RoleViolation(format!("this node is a {role}, {reason}"))
            }
            DbError::Validation(msg) => WebError::Input(msg),
            other => WebError::Database(other),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Database(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                "internal_error".to_string(),
            ),
            WebError::Input(msg) => (StatusCode::BAD_REQUEST, msg, "validation_error".to_string()),
            WebError::RoleViolation(msg) => {
                (StatusCode::FORBIDDEN, msg, "role_violation".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code,
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

/// Builds the full axum router for a node. The same set of routes is
/// exposed regardless of role; each handler enforces its own
/// leader-only / follower-only admission rule (§4.5), so there is a
/// single router shape to reason about rather than two.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/write", post(handlers::write))
        .route("/kv/:key", delete(handlers::delete_key))
        .route("/read/:key", get(handlers::read))
        .route("/replicate", post(handlers::replicate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
