//! Register one endpoint and call it against an echo service.
//!
//! ```bash
//! cargo run --example echo
//! ```
//!
//! Env vars:
//! - `API_URL` (defaults to `https://httpbin.org`)
//! - `API_TOKEN` (optional, sent as a bearer token)

use api_facade::{Api, BodyCase, Interceptor, ResponseBody, endpoint};
use serde_json::{Value, json};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = env_or("API_URL", "https://httpbin.org");

    let mut builder = Api::builder(&base_url)?
        .no_system_proxy()
        .timeout(Duration::from_secs(30))
        .endpoint(endpoint("echo", "anything", |api: Api, args: Value| async move {
            api.post("/anything", &args, BodyCase::Snake).await
        }))
        .intercept(Interceptor::request(|req| {
            eprintln!("-> {} {}", req.method, req.url);
            Ok(())
        }));

    if let Some(token) = env_opt("API_TOKEN") {
        builder = builder.auth_bearer(token);
    }

    let api = builder.build()?;
    let reply = api
        .endpoint("echo", "anything")?
        .call(json!({ "userName": "ann", "favoriteColor": "teal" }))
        .await?;

    match reply {
        ResponseBody::Json(value) => println!("{value:#}"),
        other => println!("{other:?}"),
    }
    Ok(())
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
