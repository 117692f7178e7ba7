//! Example: interceptors
//!
//! - Request interceptors run newest first, response interceptors oldest first
//! - An ejected interceptor no longer runs
//! - A header interceptor stamps every request
//!
//! Run with: cargo run --bin interceptors

use courier_client::{Courier, HeaderInterceptor, RequestConfig, Response};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let base_url = courier_examples::spawn_server().await?;
    let client = Courier::builder()
        .base_url(base_url)
        .with_request_interceptor(HeaderInterceptor::new("x-requested-by", "courier"))
        .build()?;

    println!("=== Example: Interceptors ===");

    let requests = &client.interceptors().request;
    requests.use_fulfilled(|config: RequestConfig| async move {
        println!("request interceptor 1");
        Ok(config.header("test", "1"))
    });
    requests.use_fulfilled(|config: RequestConfig| async move {
        println!("request interceptor 2");
        Ok(config.header("test", "2"))
    });
    requests.use_fulfilled(|config: RequestConfig| async move {
        println!("request interceptor 3");
        Ok(config.header("test", "3"))
    });

    let responses = &client.interceptors().response;
    responses.use_fulfilled(|mut response: Response| async move {
        println!("response interceptor 1");
        response.status_text.push_str(" [1]");
        Ok(response)
    });
    let second = responses.use_fulfilled(|mut response: Response| async move {
        println!("response interceptor 2");
        response.status_text.push_str(" [2]");
        Ok(response)
    });
    responses.use_fulfilled(|mut response: Response| async move {
        println!("response interceptor 3");
        response.status_text.push_str(" [3]");
        Ok(response)
    });
    responses.eject(second);

    let response = client.get("/interceptor/get", None).await?;
    println!("status text: {}", response.status_text);
    println!(
        "test header as sent: {:?}",
        response.request.headers.get("test")
    );

    Ok(())
}
