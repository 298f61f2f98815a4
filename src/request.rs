//! Outgoing request types.

use crate::response::ClientResponse;
use crate::Result;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::io::Write;
use url::Url;

/// The head of an outgoing HTTP request: method, target and headers.
///
/// This is what interceptors see and mutate while a request travels down an
/// interceptor chain.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The absolute target URI.
    pub uri: Url,

    /// Request headers. Names are case-insensitive.
    pub headers: HeaderMap,
}

impl HttpRequest {
    /// Creates a request head with no headers.
    pub fn new(method: Method, uri: Url) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
        }
    }

    /// Adds a header to the request, keeping any existing values.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        self.add_header(name, value)?;
        Ok(self)
    }

    /// Appends a header value in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn add_header(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Returns the first value of a header as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Validates a header name and value pair.
pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

/// A request created by a [`RequestFactory`](crate::RequestFactory).
///
/// Set headers, write the body, then call [`execute`](ClientRequest::execute)
/// exactly once. Execution consumes the request, so nothing can be written
/// afterwards. Dropping an unexecuted request releases its connection.
///
/// # Examples
///
/// ```no_run
/// use reqfactory::{RequestFactory, SimpleRequestFactory};
/// use http::Method;
/// use std::io::Write;
///
/// # fn example() -> Result<(), reqfactory::Error> {
/// let factory = SimpleRequestFactory::builder().build()?;
/// let mut request = factory.create_request_str("https://api.example.com/items", Method::POST)?;
/// request.headers_mut().insert("content-type", "application/json".parse().unwrap());
/// request.body()?.write_all(br#"{"name":"widget"}"#)?;
///
/// let mut response = request.execute()?;
/// println!("{} {}", response.status(), response.text()?);
/// response.close();
/// # Ok(())
/// # }
/// ```
pub trait ClientRequest: Send {
    /// The request head.
    fn head(&self) -> &HttpRequest;

    /// Mutable access to the request headers.
    ///
    /// Changes only reach the server while [`headers_sent`](Self::headers_sent)
    /// is `false`. A streaming request sends its head when the body is
    /// opened, so set headers before the first call to [`body`](Self::body).
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Returns `true` once the head has gone out and header changes are no
    /// longer sent. Buffering requests only send on `execute`.
    fn headers_sent(&self) -> bool {
        false
    }

    /// The sink the request body is written to.
    ///
    /// For a streaming request the first call sends the head and starts the
    /// exchange.
    ///
    /// # Errors
    ///
    /// Fails if the method does not permit a body or the body stream could
    /// not be opened.
    fn body(&mut self) -> Result<&mut dyn Write>;

    /// Sends the request and returns the response once its head has arrived.
    fn execute(self: Box<Self>) -> Result<ClientResponse>;

    fn method(&self) -> &Method {
        &self.head().method
    }

    fn uri(&self) -> &Url {
        &self.head().uri
    }

    fn headers(&self) -> &HeaderMap {
        &self.head().headers
    }
}
