use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::{Json, Query};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{any, get, post};
use serde_json::{Value, json};

/// Returns the server address from PORT env var, defaulting to an ephemeral
/// port on localhost.
///
/// # Example
///
/// ```ignore
/// let addr = courier_examples::server_addr()?;
/// let listener = tokio::net::TcpListener::bind(addr).await?;
/// ```
pub fn server_addr() -> anyhow::Result<SocketAddr> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "0".into());
    Ok(format!("127.0.0.1:{port}").parse()?)
}

/// Start the demo server in the background and return its base URL.
pub async fn spawn_server() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind(server_addr()?).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router()).await {
            eprintln!("demo server failed: {err}");
        }
    });
    Ok(format!("http://{addr}"))
}

/// The routes used by the demo binaries.
pub fn router() -> Router {
    Router::new()
        .route("/cancel/get", get(slow))
        .route("/cancel/post", post(slow))
        .route("/error/get", get(server_error))
        .route("/error/timeout", get(slow))
        .route("/extend/user", get(extend_user))
        .route("/extend/{verb}", any(extend_echo))
        .route("/interceptor/get", get(|| async { "hello" }))
        .route("/more/get", get(more_get))
        .route("/more/login", get(more_login))
        .route("/more/post", post(more_post))
        .route("/more/304", get(|| async { StatusCode::NOT_MODIFIED }))
        .route("/more/A", get(|| async { Json(json!("A")) }))
        .route("/more/B", get(|| async { Json(json!("B")) }))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "finally"
}

async fn server_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "msg": "hello world" })),
    )
}

async fn extend_user() -> Json<Value> {
    Json(json!({
        "code": 0,
        "message": "ok",
        "result": { "name": "jack", "age": 18 }
    }))
}

async fn extend_echo(method: Method, body: String) -> Json<Value> {
    Json(json!({ "method": method.as_str(), "body": body }))
}

async fn more_get(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    Json(json!({
        "params": params,
        "cookie": header("cookie"),
        "xsrf": header("x-xsrf-token-d"),
    }))
}

async fn more_login() -> impl IntoResponse {
    ([(header::SET_COOKIE, "XSRF-TOKEN-D=1234abc; Path=/")], "ok")
}

async fn more_post(headers: HeaderMap) -> impl IntoResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    // "Yee1:123456"
    if authorization == "Basic WWVlMToxMjM0NTY=" {
        (StatusCode::OK, Json(json!({ "ok": true })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "ok": false })))
    }
}
