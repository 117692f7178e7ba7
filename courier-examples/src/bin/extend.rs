//! Example: verb shorthands and typed bodies
//!
//! Run with: cargo run --bin extend

use courier_client::{Courier, RequestConfig};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ResponseData<T> {
    code: i64,
    message: String,
    result: T,
}

#[derive(Debug, Deserialize)]
struct User {
    name: String,
    age: u32,
}

async fn get_user(client: &Courier) -> anyhow::Result<ResponseData<User>> {
    let response = client.get("/extend/user", None).await?;
    Ok(response.json()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let base_url = courier_examples::spawn_server().await?;
    let client = Courier::builder().base_url(base_url).build()?;

    println!("=== Example: Extend ===");

    let responses = [
        client.get("/extend/get", None).await?,
        client.options("/extend/options", None).await?,
        client.delete("/extend/delete", None).await?,
        client.head("/extend/head", None).await?,
        client.post("/extend/post", json!({ "msg": "post" }), None).await?,
        client.put("/extend/put", json!({ "msg": "put" }), None).await?,
        client.patch("/extend/patch", json!({ "msg": "patch" }), None).await?,
    ];
    for response in &responses {
        println!("{} {} -> {:?}", response.request.method, response.status, response.data);
    }

    let response = client
        .request(
            RequestConfig::new()
                .url("/extend/post")
                .method(courier_client::Method::POST)
                .data(json!({ "msg": "hello" })),
        )
        .await?;
    println!("{:?}", response.data);

    let user = get_user(&client).await?;
    println!(
        "{} ({}): {} is {}",
        user.code, user.message, user.result.name, user.result.age
    );

    Ok(())
}
