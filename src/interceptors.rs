//! Ready-made interceptors.

use crate::intercept::{Execution, Interceptor};
use crate::request::{parse_header, HttpRequest};
use crate::response::ClientResponse;
use crate::Result;
use base64::{engine::general_purpose, Engine as _};
use http::header::{HeaderValue, AUTHORIZATION};
use http::HeaderMap;
use std::time::Instant;

/// Adds headers to every request that does not already carry them.
///
/// # Examples
///
/// ```
/// use reqfactory::interceptors::DefaultHeadersInterceptor;
///
/// let interceptor = DefaultHeadersInterceptor::new()
///     .header("User-Agent", "my-app/1.0")
///     .unwrap()
///     .header("Accept", "application/json")
///     .unwrap();
/// assert_eq!(interceptor.headers().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultHeadersInterceptor {
    headers: HeaderMap,
}

impl DefaultHeadersInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a default header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl Interceptor for DefaultHeadersInterceptor {
    fn intercept(
        &self,
        mut request: HttpRequest,
        body: Vec<u8>,
        execution: Execution<'_>,
    ) -> Result<ClientResponse> {
        for name in self.headers.keys() {
            if request.headers.contains_key(name) {
                continue;
            }
            for value in self.headers.get_all(name) {
                request.headers.append(name.clone(), value.clone());
            }
        }
        execution.execute(request, body)
    }
}

/// Sends HTTP basic credentials with every request.
///
/// A request that already has an `Authorization` header keeps it.
#[derive(Clone)]
pub struct BasicAuthInterceptor {
    value: HeaderValue,
}

impl BasicAuthInterceptor {
    /// Creates the interceptor for `username` and `password`.
    ///
    /// # Examples
    ///
    /// ```
    /// use reqfactory::interceptors::BasicAuthInterceptor;
    ///
    /// let auth = BasicAuthInterceptor::new("Aladdin", "open sesame");
    /// assert_eq!(auth.header_value(), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    /// ```
    pub fn new(username: &str, password: &str) -> Self {
        let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
        let mut value = HeaderValue::try_from(format!("Basic {}", encoded))
            .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
        value.set_sensitive(true);
        Self { value }
    }

    /// The `Authorization` header value this interceptor sends.
    pub fn header_value(&self) -> &str {
        self.value.to_str().unwrap_or_default()
    }
}

impl std::fmt::Debug for BasicAuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthInterceptor").finish_non_exhaustive()
    }
}

impl Interceptor for BasicAuthInterceptor {
    fn intercept(
        &self,
        mut request: HttpRequest,
        body: Vec<u8>,
        execution: Execution<'_>,
    ) -> Result<ClientResponse> {
        if !request.headers.contains_key(AUTHORIZATION) {
            request.headers.insert(AUTHORIZATION, self.value.clone());
        }
        execution.execute(request, body)
    }
}

/// Logs every exchange that passes through it.
///
/// Requests are logged at `debug`, responses at `info` (`warn` for server
/// errors), failures at `warn`. Failures are still returned to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn intercept(
        &self,
        request: HttpRequest,
        body: Vec<u8>,
        execution: Execution<'_>,
    ) -> Result<ClientResponse> {
        let method = request.method.clone();
        let uri = request.uri.clone();
        let start_time = Instant::now();

        tracing::debug!(
            method = %method,
            url = %uri,
            body_len = body.len(),
            "Sending HTTP request"
        );

        match execution.execute(request, body) {
            Ok(response) => {
                let latency = start_time.elapsed();
                let status = response.status();
                if status.is_server_error() {
                    tracing::warn!(
                        status = status.as_u16(),
                        method = %method,
                        url = %uri,
                        latency_ms = latency.as_millis(),
                        "Server error (5xx)"
                    );
                } else {
                    tracing::info!(
                        status = status.as_u16(),
                        method = %method,
                        url = %uri,
                        latency_ms = latency.as_millis(),
                        "Received HTTP response"
                    );
                }
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %method,
                    url = %uri,
                    latency_ms = start_time.elapsed().as_millis(),
                    "Request failed"
                );
                Err(e)
            }
        }
    }
}
