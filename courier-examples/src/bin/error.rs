//! Example: normalized errors
//!
//! - An unknown route fails status validation with a 404
//! - A 500 response is attached to the error
//! - A slow route exceeds the request timeout
//!
//! Run with: cargo run --bin error

use std::time::Duration;

use courier_client::{ClientError, Courier, Method, RequestConfig};

fn report(result: Result<courier_client::Response, ClientError>) {
    match result {
        Ok(response) => println!("{} {:?}", response.status, response.data),
        Err(err) => {
            println!("error: {}", err);
            if let Some(code) = err.code() {
                println!("  code: {}", code);
            }
            if let Some(response) = err.response() {
                println!("  status: {}, data: {:?}", response.status, response.data);
            }
            if let Some(request) = err.as_request_error().map(|e| e.request()) {
                println!("  request: {} {}", request.method, request.uri);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let base_url = courier_examples::spawn_server().await?;
    let client = Courier::builder().base_url(base_url).build()?;

    println!("=== Example: Errors ===");

    report(
        client
            .request(RequestConfig::new().method(Method::GET).url("/error/get1"))
            .await,
    );

    report(
        client
            .request(RequestConfig::new().method(Method::GET).url("/error/get"))
            .await,
    );

    report(
        client
            .request(
                RequestConfig::new()
                    .url("/error/timeout")
                    .timeout(Duration::from_millis(2000)),
            )
            .await,
    );

    Ok(())
}
