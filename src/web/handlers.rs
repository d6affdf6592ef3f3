use super::{AppState, Result, WebError};
use crate::core::DbError;
use crate::coordinator::WriteOutcome;
use crate::store::ReplicationMessage;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub node_type: &'static str,
}

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        service: "semisync-kv",
        version: env!("CARGO_PKG_VERSION"),
        node_type: state.role.as_str(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub node_type: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        node_type: state.role.as_str(),
    })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub role: &'static str,
    pub global_version: u64,
    pub key_count: usize,
    pub quorum: Option<usize>,
    pub followers: Option<Vec<String>>,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let (global_version, key_count) = state.store.snapshot_stats();
    let (quorum, followers) = match &state.coordinator {
        Some(coordinator) => (
            Some(coordinator.quorum()),
            Some(coordinator.follower_urls().to_vec()),
        ),
        None => (None, None),
    };
    Json(StatusResponse {
        role: state.role.as_str(),
        global_version,
        key_count,
        quorum,
        followers,
    })
}

#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WriteResponse {
    Success {
        success: bool,
        message: String,
        quorum_reached: usize,
    },
    Failure {
        success: bool,
        acks: usize,
        quorum: usize,
    },
}

fn write_outcome_response(outcome: WriteOutcome) -> Response {
    match outcome {
        WriteOutcome::QuorumReached { version, acks } => (
            StatusCode::OK,
            Json(WriteResponse::Success {
                success: true,
                message: format!("write applied at version {version}"),
                quorum_reached: acks,
            }),
        )
            .into_response(),
        WriteOutcome::QuorumMissed { acks, quorum } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(WriteResponse::Failure {
                success: false,
                acks,
                quorum,
            }),
        )
            .into_response(),
    }
}

pub async fn write(State(state): State<AppState>, Json(req): Json<WriteRequest>) -> Result<Response> {
    let coordinator = require_leader(&state)?;
    if req.key.is_empty() {
        return Err(WebError::Input("key must not be empty".to_string()));
    }
    let outcome = coordinator.write(&req.key, &req.value).await;
    Ok(write_outcome_response(outcome))
}

pub async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    let coordinator = require_leader(&state)?;
    if key.is_empty() {
        return Err(WebError::Input("key must not be empty".to_string()));
    }
    let outcome = coordinator.delete(&key).await;
    Ok(write_outcome_response(outcome))
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub key: String,
    pub value: Option<String>,
    pub found: bool,
}

pub async fn read(State(state): State<AppState>, Path(key): Path<String>) -> Json<ReadResponse> {
    match state.store.read(&key) {
        Some(entry) => Json(ReadResponse {
            key,
            value: Some(entry.value),
            found: true,
        }),
        None => Json(ReadResponse {
            key,
            value: None,
            found: false,
        }),
    }
}

#[derive(Debug, Serialize)]
pub struct ReplicateResponse {
    pub status: &'static str,
}

pub async fn replicate(
    State(state): State<AppState>,
    Json(msg): Json<ReplicationMessage>,
) -> Result<Json<ReplicateResponse>> {
    if state.is_leader() {
        return Err(WebError::RoleViolation(
            "the leader does not accept replication traffic".to_string(),
        ));
    }
    // Applied or dropped-as-stale, the follower always acknowledges 200;
    // rejecting a stale message would make the leader spuriously miss a
    // quorum it logically already has (§4.4).
    state.store.apply_remote(&msg);
    Ok(Json(ReplicateResponse {
        status: "replicated",
    }))
}

fn require_leader(state: &AppState) -> Result<&crate::coordinator::WriteCoordinator> {
    state.coordinator.as_deref().ok_or_else(|| {
        WebError::from(DbError::RoleViolation("follower", "writes are leader-only"))
    })
}
