//! Example: more configuration
//!
//! - XSRF token with custom cookie and header names
//! - Basic auth
//! - Custom status validation for a 304
//! - Params, a custom params serializer and a base URL
//! - `all` / `spread` and `get_uri`
//!
//! Run with: cargo run --bin more

use anyhow::Context;
use courier_client::{Courier, Params, RequestConfig, Response, all, spread};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let base_url = courier_examples::spawn_server().await?;

    println!("=== Example: More ===");

    let instance = Courier::builder()
        .base_url(base_url.clone())
        .xsrf_cookie_name("XSRF-TOKEN-D")
        .xsrf_header_name("X-XSRF-TOKEN-D")
        .build()?;
    instance.get("/more/login", None).await?;
    let response = instance.get("/more/get", None).await?;
    println!("xsrf: {:?}", response.data);

    let client = Courier::builder().base_url(base_url.clone()).build()?;

    let response = client
        .post(
            "/more/post",
            json!({ "a": 1 }),
            RequestConfig::new().auth("Yee1", "123456"),
        )
        .await?;
    println!("auth: {} {:?}", response.status, response.data);

    match client.get("/more/304", None).await {
        Ok(response) => println!("304: {}", response.status),
        Err(err) => println!("304: {}", err),
    }
    let response = client
        .get(
            "/more/304",
            RequestConfig::new().validate_status(|status| (200..400).contains(&status.as_u16())),
        )
        .await?;
    println!("304 with validator: {}", response.status);

    let params = Params::from_serialize(&json!({ "a": 1, "b": 2, "c": "x" }))
        .context("params must be an object")?;
    let response = client
        .get("/more/get", RequestConfig::new().params(params.clone()))
        .await?;
    println!("params: {:?}", response.data);

    let brackets = Courier::builder()
        .base_url(base_url)
        .config(RequestConfig::new().params_serializer(|params: &Params| {
            params
                .iter()
                .map(|(key, value)| format!("{key}[]={value}"))
                .collect::<Vec<_>>()
                .join("&")
        }))
        .build()?;
    println!(
        "custom serializer: {}",
        brackets.get_uri(RequestConfig::new().url("/more/get").params(params))?
    );

    let responses = all([client.get("/more/A", None), client.get("/more/B", None)]).await?;
    let print_both = spread(|[a, b]: [Response; 2]| {
        println!("{:?}", a.data);
        println!("{:?}", b.data);
    });
    print_both(responses);

    let uri = client.get_uri(
        RequestConfig::new()
            .base_url("https://www.baidu.com")
            .url("/user/12345")
            .param("idClient", 1)
            .param("idTest", 2)
            .param("testString", "thisIsATest"),
    )?;
    println!("{uri}");

    Ok(())
}
