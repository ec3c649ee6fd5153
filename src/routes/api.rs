use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::bulk::{BulkCoordinator, BulkOutcome, BulkRow, KindDeleter};
use crate::clients::{BackendClient, ClientError};
use crate::models::docker::ResourceKind;
use crate::models::views::BulkDeleteResponse;

/// All client errors leave the route layer as one displayed string, mirroring
/// the backend's status where it supplied one.
fn error_response(e: ClientError) -> Response {
    let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(json!({"error": e.to_string()}))).into_response()
}

fn proxy<T: serde::Serialize>(result: Result<T, ClientError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(e),
    }
}

// --- Dashboard ---

pub async fn handle_overview(State(state): State<AppState>) -> Response {
    match state.stats.overview().await {
        Ok(overview) => Json(overview).into_response(),
        Err(message) => {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": message}))).into_response()
        }
    }
}

// --- Containers ---

pub async fn handle_list_containers(State(state): State<AppState>) -> Response {
    proxy(state.backend.list_containers().await)
}

pub async fn handle_list_running(State(state): State<AppState>) -> Response {
    proxy(state.backend.list_running_containers().await)
}

pub async fn handle_get_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    proxy(state.backend.get_container(&id).await)
}

pub async fn handle_start_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.backend.start_container(&id).await {
        Ok(msg) => Json(json!({"status": msg.status})).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_stop_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.backend.stop_container(&id).await {
        Ok(msg) => Json(json!({"status": msg.status})).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn handle_container_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    proxy(state.backend.container_logs(&id).await)
}

pub async fn handle_delete_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    delete_one(&state, ResourceKind::Container, &id).await
}

// --- Images ---

pub async fn handle_list_images(State(state): State<AppState>) -> Response {
    proxy(state.backend.list_images().await)
}

pub async fn handle_delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    delete_one(&state, ResourceKind::Image, &id).await
}

// --- Networks ---

pub async fn handle_list_networks(State(state): State<AppState>) -> Response {
    proxy(state.backend.list_networks().await)
}

pub async fn handle_get_network(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    proxy(state.backend.get_network(&id).await)
}

pub async fn handle_disconnected_containers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    proxy(state.backend.disconnected_containers(&id).await)
}

pub async fn handle_delete_network(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    delete_one(&state, ResourceKind::Network, &id).await
}

// --- Volumes ---

pub async fn handle_list_volumes(State(state): State<AppState>) -> Response {
    proxy(state.backend.list_volumes().await)
}

pub async fn handle_delete_volume(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    delete_one(&state, ResourceKind::Volume, &name).await
}

// --- Ports ---

pub async fn handle_list_ports(State(state): State<AppState>) -> Response {
    proxy(state.backend.list_ports().await)
}

// --- Single deletes ---

async fn delete_one(state: &AppState, kind: ResourceKind, id: &str) -> Response {
    match state.backend.delete_resource(kind, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

// --- Bulk deletes ---

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    ids: Vec<String>,
}

pub async fn handle_bulk_delete_containers(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Response {
    run_bulk_delete(&state, ResourceKind::Container, req.ids).await
}

pub async fn handle_bulk_delete_images(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Response {
    run_bulk_delete(&state, ResourceKind::Image, req.ids).await
}

pub async fn handle_bulk_delete_networks(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Response {
    run_bulk_delete(&state, ResourceKind::Network, req.ids).await
}

pub async fn handle_bulk_delete_volumes(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Response {
    run_bulk_delete(&state, ResourceKind::Volume, req.ids).await
}

/// Walks a posted selection through the coordinator against the backend's
/// current list. In-use or unknown ids are rejected before anything is
/// deleted; a mid-batch failure reports what was deleted alongside the error.
async fn run_bulk_delete(state: &AppState, kind: ResourceKind, ids: Vec<String>) -> Response {
    let rows = match fetch_rows(&state.backend, kind).await {
        Ok(rows) => rows,
        Err(e) => return error_response(e),
    };

    let mut coordinator = BulkCoordinator::new(rows);
    let mut seen = std::collections::BTreeSet::new();
    for id in &ids {
        if !seen.insert(id.clone()) {
            continue;
        }
        if !coordinator.toggle_select(id) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("{} {} is in use or does not exist", kind.as_str(), id)
                })),
            )
                .into_response();
        }
    }

    if !coordinator.request_delete() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Nothing to delete"})),
        )
            .into_response();
    }

    let deleter = KindDeleter {
        backend: state.backend.as_ref(),
        kind,
    };
    match coordinator.confirm(&deleter).await {
        BulkOutcome::Completed { deleted } => Json(BulkDeleteResponse {
            deleted,
            error: None,
        })
        .into_response(),
        BulkOutcome::Failed { deleted, error } => (
            StatusCode::CONFLICT,
            Json(BulkDeleteResponse {
                deleted,
                error: Some(error),
            }),
        )
            .into_response(),
        BulkOutcome::Ignored => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Nothing to delete"})),
        )
            .into_response(),
    }
}

async fn fetch_rows(
    backend: &BackendClient,
    kind: ResourceKind,
) -> Result<Vec<BulkRow>, ClientError> {
    let rows = match kind {
        ResourceKind::Container => backend
            .list_containers()
            .await?
            .into_iter()
            .map(|c| BulkRow {
                in_use: c.state.running,
                id: c.id,
                name: c.name,
            })
            .collect(),
        ResourceKind::Image => backend
            .list_images()
            .await?
            .into_iter()
            .map(|i| BulkRow {
                name: i.display_name().to_string(),
                in_use: i.in_use,
                id: i.id,
            })
            .collect(),
        ResourceKind::Network => backend
            .list_networks()
            .await?
            .into_iter()
            .map(|n| BulkRow {
                id: n.id,
                name: n.name,
                in_use: n.in_use,
            })
            .collect(),
        // Volumes are addressed by name on the backend
        ResourceKind::Volume => backend
            .list_volumes()
            .await?
            .into_iter()
            .map(|v| BulkRow {
                id: v.name.clone(),
                name: v.name,
                in_use: v.in_use,
            })
            .collect(),
    };
    Ok(rows)
}

pub async fn handle_healthz() -> &'static str {
    "ok\n"
}
