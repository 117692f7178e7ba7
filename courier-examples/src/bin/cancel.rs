//! Example: cancelling requests
//!
//! - A token source cancels a request in flight, then a request started with
//!   the already cancelled token fails before reaching the server
//! - A token created with an executor hands out its canceler
//!
//! Run with: cargo run --bin cancel

use std::time::Duration;

use courier_client::{CancelToken, Canceler, Courier, RequestConfig, is_cancel};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let base_url = courier_examples::spawn_server().await?;
    let client = Courier::builder().base_url(base_url).build()?;

    println!("=== Example: Cancellation ===");

    let source = CancelToken::source();
    let request = client.get(
        "/cancel/get",
        RequestConfig::new().cancel_token(source.token()),
    );
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.cancel_with("Operation canceled by user");
    };
    let (result, ()) = tokio::join!(request, cancel);
    if let Err(err) = result {
        if is_cancel(&err) {
            println!("Request canceled: {}", err);
        }
    }

    // The token stays cancelled, so this one never reaches the server.
    let result = client
        .post(
            "/cancel/post",
            json!({ "a": 1 }),
            RequestConfig::new().cancel_token(source.token()),
        )
        .await;
    if let Err(err) = result {
        if let Some(cancel) = err.as_cancel() {
            println!("{}", cancel.message().unwrap_or_default());
        }
    }

    let mut canceler: Option<Canceler> = None;
    let token = CancelToken::new(|c| canceler = Some(c));
    let request = client.get("/cancel/get", RequestConfig::new().cancel_token(token));
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        if let Some(canceler) = &canceler {
            canceler.cancel();
        }
    };
    let (result, ()) = tokio::join!(request, cancel);
    if result.as_ref().is_err_and(is_cancel) {
        println!("Request canceled");
    }

    Ok(())
}
