//! Example demonstrating a streamed upload through an interceptor chain.
//!
//! This example shows how to:
//! - Turn off body buffering and pick a chunk size
//! - Wrap a factory with stock and closure interceptors
//! - Stream a body of unknown length with chunked encoding
//! - Tell connection errors from transport errors
//!
//! Run with: `cargo run --example streaming_upload`

use http::Method;
use reqfactory::intercept::{self, Execution};
use reqfactory::interceptors::{BasicAuthInterceptor, DefaultHeadersInterceptor, LoggingInterceptor};
use reqfactory::{
    Error, ErrorKind, HttpRequest, InterceptingRequestFactory, RequestFactory, SimpleRequestFactory,
};
use std::io::Write;
use std::sync::Arc;

fn upload(factory: &dyn RequestFactory, lines: usize) -> Result<(), Error> {
    let mut request = factory.create_request_str("https://httpbin.org/anything", Method::PUT)?;
    let body = request.body()?;
    for i in 0..lines {
        writeln!(body, "line {} of a body too large to keep in memory", i)?;
    }

    let mut response = request.execute()?;
    println!("Status: {}", response.status());
    println!("Echoed: {} bytes", response.bytes()?.len());
    response.close();
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("reqfactory=debug,streaming_upload=info")
        .init();

    let streaming = SimpleRequestFactory::builder()
        .buffer_request_body(false)
        .chunk_size(4 * 1024)
        .read_timeout_millis(30_000)
        .build()?;

    let request_id = intercept::from_fn(
        |mut request: HttpRequest, body: Vec<u8>, next: Execution<'_>| {
            request.add_header("X-Request-Id", "demo-0001")?;
            next.execute(request, body)
        },
    );

    let factory = InterceptingRequestFactory::new(
        Arc::new(streaming.clone()),
        vec![
            Arc::new(LoggingInterceptor),
            Arc::new(DefaultHeadersInterceptor::new().header("User-Agent", "reqfactory-demo/0.1")?),
            Arc::new(BasicAuthInterceptor::new("demo", "secret")),
            Arc::new(request_id),
        ],
    );

    println!("=== Streaming upload ===");
    upload(&streaming, 10_000)?;
    println!();

    println!("=== Upload through interceptors ===");
    // The chain sees the whole body, so the intercepting request buffers it
    // before handing it to the streaming delegate.
    upload(&factory, 100)?;
    println!();

    println!("=== Error kinds ===");
    match upload(&streaming, 1).and_then(|_| {
        factory
            .create_request_str("http://127.0.0.1:9/", Method::GET)?
            .execute()
            .map(|_| ())
    }) {
        Ok(()) => println!("Unexpectedly reached port 9"),
        Err(e) if e.kind() == ErrorKind::Connection => println!("Connection error: {}", e),
        Err(e) => println!("Transport error: {}", e),
    }

    Ok(())
}
