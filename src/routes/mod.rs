pub mod api;
pub mod auth;
pub mod logs;

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{AppState, session};

pub fn build_router(state: AppState) -> Router {
    // Everything that can reach resource data sits behind the session gate
    let protected = Router::new()
        .route("/api/overview", get(api::handle_overview))
        // Containers
        .route("/api/containers", get(api::handle_list_containers))
        .route("/api/containers/running", get(api::handle_list_running))
        .route(
            "/api/containers/bulk-delete",
            post(api::handle_bulk_delete_containers),
        )
        .route(
            "/api/containers/{id}",
            get(api::handle_get_container).delete(api::handle_delete_container),
        )
        .route("/api/containers/{id}/start", post(api::handle_start_container))
        .route("/api/containers/{id}/stop", post(api::handle_stop_container))
        .route("/api/containers/{id}/logs", get(api::handle_container_logs))
        .route(
            "/api/containers/{id}/logs/stream",
            get(logs::handle_log_stream),
        )
        // Images
        .route("/api/images", get(api::handle_list_images))
        .route("/api/images/bulk-delete", post(api::handle_bulk_delete_images))
        .route("/api/images/{id}", delete(api::handle_delete_image))
        // Networks
        .route("/api/networks", get(api::handle_list_networks))
        .route(
            "/api/networks/bulk-delete",
            post(api::handle_bulk_delete_networks),
        )
        .route(
            "/api/networks/{id}",
            get(api::handle_get_network).delete(api::handle_delete_network),
        )
        .route(
            "/api/networks/{id}/disconnected",
            get(api::handle_disconnected_containers),
        )
        // Volumes
        .route("/api/volumes", get(api::handle_list_volumes))
        .route(
            "/api/volumes/bulk-delete",
            post(api::handle_bulk_delete_volumes),
        )
        .route("/api/volumes/{name}", delete(api::handle_delete_volume))
        // Ports
        .route("/api/ports", get(api::handle_list_ports))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .merge(protected)
        // Auth surface stays outside the gate; logout is idempotent
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/login", get(auth::handle_login_page))
        .route("/healthz", get(api::handle_healthz))
        .route("/", get(|| async { Redirect::to("/login") }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
