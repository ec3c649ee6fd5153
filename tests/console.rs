use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use dockyard_console::clients::BackendClient;
use dockyard_console::clients::stats::StatsPoller;
use dockyard_console::config::{AuthDef, BackendDef, Config};
use dockyard_console::session::SessionKey;
use dockyard_console::{AppState, routes};

const SECRET: &str = "0123456789abcdef0123456789abcdef";

// --- Stub backend ---

#[derive(Default)]
struct Stub {
    log_fetches: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    // network id -> error message returned on delete
    fail_delete: Mutex<Option<(String, String)>>,
    stats_ok: Mutex<bool>,
    container_status: Mutex<String>,
}

impl Stub {
    fn log_fetch_count(&self, id: &str) -> usize {
        self.log_fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.as_str() == id)
            .count()
    }
}

async fn stub_networks() -> Json<Value> {
    Json(json!([
        {"id": "n1", "name": "net-one", "driver": "bridge", "scope": "local",
         "internal": false, "inUse": false, "containers": 0},
        {"id": "n2", "name": "net-two", "driver": "bridge", "scope": "local",
         "internal": false, "inUse": true, "containers": 2},
        {"id": "n3", "name": "net-three", "driver": "bridge", "scope": "local",
         "internal": false, "inUse": false, "containers": 0},
        {"id": "n4", "name": "net-four", "driver": "bridge", "scope": "local",
         "internal": false, "inUse": false, "containers": 0},
    ]))
}

async fn stub_delete_network(State(stub): State<Arc<Stub>>, Path(id): Path<String>) -> Response {
    if let Some((fail_id, message)) = stub.fail_delete.lock().unwrap().clone() {
        if fail_id == id {
            stub.deletes.lock().unwrap().push(id);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": message})),
            )
                .into_response();
        }
    }
    stub.deletes.lock().unwrap().push(id);
    StatusCode::NO_CONTENT.into_response()
}

async fn stub_logs(State(stub): State<Arc<Stub>>, Path(id): Path<String>) -> Json<Value> {
    stub.log_fetches.lock().unwrap().push(id.clone());
    let status = stub.container_status.lock().unwrap().clone();
    Json(json!({
        "logs": format!("line one\nline two ({})", id),
        "container": {"id": id, "name": "web", "status": status}
    }))
}

async fn stub_docker_stats(State(stub): State<Arc<Stub>>) -> Response {
    if *stub.stats_ok.lock().unwrap() {
        Json(json!({
            "containers": {"total": 5, "running": 2, "stopped": 3},
            "images": 7, "networks": 4, "volumes": 1
        }))
        .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "stats down"})),
        )
            .into_response()
    }
}

async fn stub_system_stats(State(stub): State<Arc<Stub>>) -> Response {
    if *stub.stats_ok.lock().unwrap() {
        Json(json!({
            "cpu": {"cores": 4, "usage_per_core": [1.0, 2.0, 3.0, 4.0], "average_usage": 2.5},
            "memory": {"total": 1024, "available": 512, "used": 512, "percent": 50.0},
            "disk": {"total": 2048, "used": 1024, "free": 1024, "percent": 50.0},
            "network": {"interfaces": {}, "io": {}}
        }))
        .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "stats down"})),
        )
            .into_response()
    }
}

/// Serves the stub backend on an ephemeral port and returns its base URL.
async fn spawn_stub(stub: Arc<Stub>) -> String {
    let router = Router::new()
        .route("/api/networks", get(stub_networks))
        .route(
            "/api/networks/{id}/",
            axum::routing::delete(stub_delete_network),
        )
        .route("/api/containers/{id}/logs/", get(stub_logs))
        .route("/api/stats", get(stub_docker_stats))
        .route("/api/system/stats", get(stub_system_stats))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// --- Console under test ---

fn console_state(backend_url: &str) -> AppState {
    let config = Config {
        listen_port: 0,
        backend: BackendDef {
            base_url: backend_url.to_string(),
        },
        auth: AuthDef {
            admin_username: "admin".into(),
            admin_password: "hunter2".into(),
            session_secret: SECRET.into(),
        },
        cookie_secure: false,
        stats_interval_secs: 5,
        log_interval_secs: 1,
    };
    let backend = Arc::new(BackendClient::new(backend_url));
    AppState {
        stats: Arc::new(StatsPoller::new(backend.clone(), config.stats_interval_secs)),
        backend,
        sessions: Arc::new(SessionKey::new(SECRET)),
        config: Arc::new(config),
    }
}

async fn body_json(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(router: &Router) -> String {
    let res = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"username": "admin", "password": "hunter2"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should set the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

// --- Session gate ---

#[tokio::test]
async fn login_unlocks_protected_routes() {
    let stub = Arc::new(Stub::default());
    let state = console_state(&spawn_stub(stub).await);
    let router = routes::build_router(state);

    let cookie = login(&router).await;
    let res = router
        .clone()
        .oneshot(get_with_cookie("/api/networks", &cookie))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert_eq!(body[1]["inUse"], json!(true));
}

#[tokio::test]
async fn wrong_password_gets_401_and_no_cookie() {
    let state = console_state("http://127.0.0.1:1");
    let router = routes::build_router(state);

    let res = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"username": "admin", "password": "wrong"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(res).await["error"], json!("Invalid credentials"));
}

#[tokio::test]
async fn missing_or_mangled_cookies_are_both_rejected() {
    let state = console_state("http://127.0.0.1:1");
    let router = routes::build_router(state);

    let res = router
        .clone()
        .oneshot(Request::builder().uri("/api/containers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // A forged cookie must behave exactly like a missing one
    let res = router
        .clone()
        .oneshot(get_with_cookie(
            "/api/containers",
            "dockyard_session=bm90.dmFsaWQ",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["error"], json!("Not authenticated"));
}

#[tokio::test]
async fn logout_clears_the_cookie_and_is_idempotent() {
    let state = console_state("http://127.0.0.1:1");
    let router = routes::build_router(state);

    // No session at all: still a success
    let res = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("Max-Age=0"));
    assert_eq!(body_json(res).await["success"], json!(true));
}

// --- Error normalization through the proxy ---

#[tokio::test]
async fn backend_delete_error_message_is_surfaced_verbatim() {
    let stub = Arc::new(Stub::default());
    *stub.fail_delete.lock().unwrap() = Some(("n1".into(), "in use".into()));
    let state = console_state(&spawn_stub(stub).await);
    let router = routes::build_router(state);
    let cookie = login(&router).await;

    let res = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/networks/n1")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(res).await["error"], json!("in use"));
}

// --- Bulk delete ---

async fn post_bulk_delete(router: &Router, cookie: &str, ids: Value) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/networks/bulk-delete")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, cookie)
                .body(Body::from(json!({"ids": ids}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn bulk_delete_runs_in_order_and_stops_at_first_failure() {
    let stub = Arc::new(Stub::default());
    *stub.fail_delete.lock().unwrap() = Some(("n3".into(), "boom".into()));
    let state = console_state(&spawn_stub(stub.clone()).await);
    let router = routes::build_router(state);
    let cookie = login(&router).await;

    let res = post_bulk_delete(&router, &cookie, json!(["n1", "n3", "n4"])).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let body = body_json(res).await;
    assert_eq!(body["deleted"], json!(["net-one"]));
    assert_eq!(body["error"], json!("boom"));

    // n1 deleted, n3 attempted and failed, n4 never attempted
    assert_eq!(*stub.deletes.lock().unwrap(), vec!["n1", "n3"]);
}

#[tokio::test]
async fn bulk_delete_succeeds_end_to_end() {
    let stub = Arc::new(Stub::default());
    let state = console_state(&spawn_stub(stub.clone()).await);
    let router = routes::build_router(state);
    let cookie = login(&router).await;

    let res = post_bulk_delete(&router, &cookie, json!(["n1", "n4"])).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["deleted"], json!(["net-one", "net-four"]));
    assert!(body.get("error").is_none());
    assert_eq!(*stub.deletes.lock().unwrap(), vec!["n1", "n4"]);
}

#[tokio::test]
async fn bulk_delete_rejects_in_use_resources_before_deleting_anything() {
    let stub = Arc::new(Stub::default());
    let state = console_state(&spawn_stub(stub.clone()).await);
    let router = routes::build_router(state);
    let cookie = login(&router).await;

    let res = post_bulk_delete(&router, &cookie, json!(["n1", "n2"])).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(stub.deletes.lock().unwrap().is_empty());
}

// --- Dashboard overview ---

#[tokio::test]
async fn overview_reports_errors_then_retains_the_last_good_snapshot() {
    let stub = Arc::new(Stub::default());
    let state = console_state(&spawn_stub(stub.clone()).await);
    let stats = state.stats.clone();
    let router = routes::build_router(state);
    let cookie = login(&router).await;

    // Backend down on first load: error state, not a zeroed dashboard
    stats.refresh().await;
    let res = router
        .clone()
        .oneshot(get_with_cookie("/api/overview", &cookie))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(res).await["error"], json!("stats down"));

    // Backend recovers
    *stub.stats_ok.lock().unwrap() = true;
    stats.refresh().await;
    let res = router
        .clone()
        .oneshot(get_with_cookie("/api/overview", &cookie))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["docker"]["containers"]["total"], json!(5));
    assert!(body.get("stale").is_none());

    // Backend fails again: last good data survives, marked stale
    *stub.stats_ok.lock().unwrap() = false;
    stats.refresh().await;
    let res = router
        .clone()
        .oneshot(get_with_cookie("/api/overview", &cookie))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["docker"]["containers"]["total"], json!(5));
    assert_eq!(body["stale"], json!(true));
    assert_eq!(body["error"], json!("stats down"));
}

// --- Log tail ---

#[tokio::test]
async fn stopped_container_log_stream_fetches_exactly_once() {
    let stub = Arc::new(Stub::default());
    *stub.container_status.lock().unwrap() = "exited".to_string();
    let state = console_state(&spawn_stub(stub.clone()).await);
    let router = routes::build_router(state);
    let cookie = login(&router).await;

    let res = router
        .oneshot(get_with_cookie("/api/containers/c1/logs/stream", &cookie))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The stream ends after one snapshot, so the whole body can be collected
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("event: log"));
    assert!(body.contains("line two (c1)"));
    assert_eq!(stub.log_fetch_count("c1"), 1);
}

#[tokio::test]
async fn running_container_stream_polls_until_the_panel_closes() {
    let stub = Arc::new(Stub::default());
    *stub.container_status.lock().unwrap() = "running".to_string();
    let state = console_state(&spawn_stub(stub.clone()).await);
    let router = routes::build_router(state);
    let cookie = login(&router).await;

    // Serve the console over a real socket so dropping the client connection
    // exercises stream cancellation.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::new();
    let res = client
        .get(format!("http://{}/api/containers/c1/logs/stream", addr))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // With a 1s poll interval, the open fetch plus at least one tick land here
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    assert!(stub.log_fetch_count("c1") >= 2);

    // Closing the panel: future ticks must stop (at most one in-flight tick
    // may still complete)
    drop(res);
    tokio::time::sleep(std::time::Duration::from_millis(2000)).await;
    let after_close = stub.log_fetch_count("c1");
    tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
    assert_eq!(stub.log_fetch_count("c1"), after_close);

    // A new panel for a different container never touches the old id
    let res = client
        .get(format!("http://{}/api/containers/c2/logs/stream", addr))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    drop(res);
    assert_eq!(stub.log_fetch_count("c1"), after_close);
    assert!(stub.log_fetch_count("c2") >= 1);
}
