use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info};

use crate::{
    error::{LifecycleError, Result},
    models::CreateClusterRequest,
    services::ALL_CLUSTERS,
    AppState,
};

/// `POST /create`: partial record JSON in, new cluster id out as plain text.
/// An empty body creates a cluster with every default.
pub async fn create_cluster(State(state): State<AppState>, body: Bytes) -> Result<String> {
    let request = parse_create_request(&body)?;
    let id = state.clusters.create(request).await?;
    info!(cluster_id = %id, "Cluster created");
    Ok(id)
}

fn parse_create_request(body: &[u8]) -> Result<CreateClusterRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CreateClusterRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| LifecycleError::validation(format!("Invalid cluster spec: {}", e)))
}

/// `GET /status/:id`: the record, or every cluster id for `*`.
pub async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    if id == ALL_CLUSTERS {
        let ids = state.clusters.list_ids().await?;
        return Ok(Json(ids).into_response());
    }

    let record = state.clusters.status(&id).await?;
    Ok(Json(record).into_response())
}

/// `POST /prolong/:id/:minutes`
pub async fn prolong_cluster(
    State(state): State<AppState>,
    Path((id, minutes)): Path<(String, String)>,
) -> Result<String> {
    let outcome = state.clusters.prolong(&id, &minutes).await?;
    Ok(outcome.message())
}

/// `POST /prolong/:id` without an amount.
pub async fn prolong_missing_minutes(Path(id): Path<String>) -> Result<String> {
    Err(LifecycleError::validation(format!(
        "Invalid prolong request for cluster {}, the number of minutes is missing",
        id
    )))
}

/// `POST /reconcile`: one sweep on demand. The report is returned either
/// way; any per-record failure turns the status into 500.
pub async fn reconcile(State(state): State<AppState>) -> Result<Response> {
    let report = state.reconciler.sweep().await?;
    if report.is_success() {
        return Ok(Json(report).into_response());
    }

    error!(failed = ?report.failed_ids(), "On-demand sweep had failures");
    Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(report)).into_response())
}
