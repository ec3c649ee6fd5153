use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, session};

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let auth = &state.config.auth;
    if req.username == auth.admin_username && req.password == auth.admin_password {
        let (value, session_data) = state.sessions.issue(&req.username);
        let cookie = session::set_cookie(&value, state.config.cookie_secure);
        tracing::info!("login for {}", session_data.username);
        (
            [(header::SET_COOKIE, cookie)],
            Json(json!({"isLoggedIn": true, "username": session_data.username})),
        )
            .into_response()
    } else {
        tracing::info!("rejected login attempt for {:?}", req.username);
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid credentials"})),
        )
            .into_response()
    }
}

/// Clears the session cookie. Logging out without a session is not an error.
pub async fn handle_logout(State(state): State<AppState>) -> Response {
    let cookie = session::clear_cookie(state.config.cookie_secure);
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({"success": true})),
    )
        .into_response()
}

/// Landing spot for gate redirects. The real login form belongs to the
/// rendering layer; this page just points at the login endpoint.
pub async fn handle_login_page() -> Html<&'static str> {
    Html(
        "<!doctype html><title>Dockyard Console</title>\
         <p>Sign in by POSTing {username, password} to /api/auth/login.</p>",
    )
}
