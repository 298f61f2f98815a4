//! Basic example demonstrating buffered GET and POST requests.
//!
//! This example shows how to:
//! - Create a factory with timeouts
//! - Make a GET request that follows redirects
//! - Make a POST request with a buffered JSON body
//! - Access response status, headers and body
//!
//! Run with: `cargo run --example basic_call`

use http::Method;
use reqfactory::{Error, RequestFactory, SimpleRequestFactory};
use std::io::Write;

fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("reqfactory=debug,basic_call=info")
        .init();

    let factory = SimpleRequestFactory::builder()
        .connect_timeout_millis(5_000)
        .read_timeout_millis(10_000)
        .build()?;

    println!("=== GET Request Example ===");
    // httpbin redirects once before answering
    let mut response = factory
        .create_request_str("https://httpbin.org/redirect-to?url=/get", Method::GET)?
        .execute()?;
    println!("Status: {} {}", response.status().as_u16(), response.status_text());
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Body: {}", response.text()?);
    response.close();
    println!();

    println!("=== POST Request Example ===");
    let payload = serde_json::json!({
        "title": "My New Post",
        "body": "This is the content of my new post!",
        "userId": 1,
    });

    let mut request = factory.create_request_str("https://httpbin.org/post", Method::POST)?;
    request
        .headers_mut()
        .insert("content-type", http::HeaderValue::from_static("application/json"));
    // Nothing is sent until execute; the body is collected in memory first
    request.body()?.write_all(payload.to_string().as_bytes())?;

    let mut response = request.execute()?;
    println!("Status: {}", response.status());
    println!("Content-Length: {:?}", response.content_length());
    println!("Body: {}", response.text()?);
    response.close();

    Ok(())
}
