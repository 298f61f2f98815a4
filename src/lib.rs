//! # reqfactory - configurable HTTP request factories
//!
//! reqfactory turns a URI and an HTTP method into a request bound to its own
//! transport connection. Factories control body buffering, chunked
//! streaming, connect/read timeouts and proxies, and any factory can be
//! wrapped in a chain of interceptors that inspect, modify or answer
//! requests before they reach the network. All I/O is blocking and built on
//! `reqwest`'s blocking client.
//!
//! ## Quick Start
//!
//! ```no_run
//! use reqfactory::{RequestFactory, SimpleRequestFactory};
//! use http::Method;
//! use std::io::Write;
//!
//! fn main() -> Result<(), reqfactory::Error> {
//!     let factory = SimpleRequestFactory::builder()
//!         .connect_timeout_millis(5_000)
//!         .read_timeout_millis(10_000)
//!         .build()?;
//!
//!     // GET: redirects are followed automatically
//!     let mut response = factory
//!         .create_request_str("https://api.example.com/users/123", Method::GET)?
//!         .execute()?;
//!     println!("{} {}", response.status(), response.text()?);
//!     response.close();
//!
//!     // POST: the body is buffered and sent with an exact Content-Length
//!     let mut request = factory.create_request_str("https://api.example.com/users", Method::POST)?;
//!     request.headers_mut().insert("content-type", "application/json".parse().unwrap());
//!     request.body()?.write_all(br#"{"name":"Alice"}"#)?;
//!     let mut response = request.execute()?;
//!     println!("Created: {}", response.status());
//!     response.close();
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Buffering vs. streaming
//!
//! By default request bodies are collected in memory and sent in one go.
//! For large uploads, turn buffering off: the body is then written straight
//! to the connection, framed by the `Content-Length` header when the caller
//! sets one and by chunked transfer encoding otherwise.
//!
//! ```no_run
//! use reqfactory::{RequestFactory, SimpleRequestFactory};
//! use http::Method;
//!
//! # fn example() -> Result<(), reqfactory::Error> {
//! let factory = SimpleRequestFactory::builder()
//!     .buffer_request_body(false)
//!     .chunk_size(8 * 1024)
//!     .build()?;
//!
//! let mut request = factory.create_request_str("https://uploads.example.com/big", Method::PUT)?;
//! let mut file = std::fs::File::open("big.bin")?;
//! std::io::copy(&mut file, request.body()?)?;
//! request.execute()?.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Interceptors
//!
//! ```no_run
//! use reqfactory::interceptors::{BasicAuthInterceptor, DefaultHeadersInterceptor, LoggingInterceptor};
//! use reqfactory::{InterceptingRequestFactory, RequestFactory, SimpleRequestFactory};
//! use http::Method;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), reqfactory::Error> {
//! let factory = InterceptingRequestFactory::new(
//!     Arc::new(SimpleRequestFactory::new()),
//!     vec![
//!         Arc::new(LoggingInterceptor),
//!         Arc::new(DefaultHeadersInterceptor::new().header("User-Agent", "my-app/1.0")?),
//!         Arc::new(BasicAuthInterceptor::new("user", "secret")),
//!     ],
//! );
//! let response = factory.create_request_str("https://api.example.com/me", Method::GET)?.execute()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Errors are either connection errors (the connection could not be opened
//! or prepared), transport errors (the exchange failed), or configuration
//! errors. See [`ErrorKind`]. Nothing is retried internally.

mod buffering;
mod config;
pub mod connection;
mod error;
mod factory;
pub mod intercept;
pub mod interceptors;
mod proxy;
mod request;
mod response;
mod streaming;

pub use buffering::BufferingRequest;
pub use config::{RequestFactoryConfig, TimeoutSetting, DEFAULT_CHUNK_SIZE, UNSET_TIMEOUT};
pub use error::{Error, ErrorKind, Result};
pub use factory::{RequestFactory, RequestFactoryBuilder, SimpleRequestFactory};
pub use intercept::{Execution, InterceptingRequestFactory, Interceptor};
pub use proxy::ProxyConfig;
pub use request::{ClientRequest, HttpRequest};
pub use response::ClientResponse;
pub use streaming::{StreamingRequest, MAX_CHUNK_SIZE};
