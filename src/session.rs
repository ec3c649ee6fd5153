use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;

use crate::AppState;

pub const COOKIE_NAME: &str = "dockyard_session";
const SESSION_TTL_DAYS: i64 = 7;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub is_logged_in: bool,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session cookies with the server-held secret.
/// A cookie that fails any check is indistinguishable from a missing one.
pub struct SessionKey {
    secret: Vec<u8>,
}

impl SessionKey {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Creates a session for `username` and returns the signed cookie value.
    pub fn issue(&self, username: &str) -> (String, SessionData) {
        let session = SessionData {
            is_logged_in: true,
            username: username.to_string(),
            expires_at: Utc::now() + Duration::days(SESSION_TTL_DAYS),
        };
        // Serializing a plain struct cannot fail.
        let payload = serde_json::to_vec(&session).expect("session serializes");
        let value = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(self.sign(&payload))
        );
        (value, session)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key size");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    /// Returns the session only if the cookie is well formed, carries a valid
    /// signature and has not expired.
    pub fn verify(&self, cookie_value: &str) -> Option<SessionData> {
        let (payload_b64, sig_b64) = cookie_value.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let sig = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key size");
        mac.update(&payload);
        mac.verify_slice(&sig).ok()?;

        let session: SessionData = serde_json::from_slice(&payload).ok()?;
        if !session.is_logged_in || session.expires_at <= Utc::now() {
            return None;
        }
        Some(session)
    }
}

pub fn set_cookie(value: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        COOKIE_NAME,
        value,
        SESSION_TTL_DAYS * 24 * 3600
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", COOKIE_NAME);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Pulls this console's session cookie out of a Cookie header, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == COOKIE_NAME).then(|| value.to_string())
    })
}

/// Gate for protected routes: no valid session means no resource data.
/// API requests get a 401; anything else is sent to the login page.
pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let session = session_cookie(req.headers()).and_then(|v| state.sessions.verify(&v));

    match session {
        Some(_) => next.run(req).await,
        None => {
            tracing::debug!("rejecting unauthenticated request to {}", req.uri().path());
            if req.uri().path().starts_with("/api/") {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": "Not authenticated"})),
                )
                    .into_response()
            } else {
                Redirect::to("/login").into_response()
            }
        }
    }
}
