//! The response side of an exchange.
//!
//! A [`ClientResponse`] owns the connection it was read from until it is
//! closed or dropped. Its body is a plain [`Read`] stream that can be
//! consumed once, front to back.

use crate::Result;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, StatusCode};
use std::fmt;
use std::io::{self, Read};

/// The result of executing a [`ClientRequest`](crate::ClientRequest).
///
/// Always close the response (or let it drop) once done with it; until then
/// the underlying connection stays busy.
///
/// # Examples
///
/// Interceptors can answer without touching the network by building a
/// response themselves:
///
/// ```
/// use reqfactory::ClientResponse;
/// use http::{HeaderMap, StatusCode};
///
/// let mut response = ClientResponse::from_bytes(StatusCode::OK, HeaderMap::new(), b"cached".to_vec());
/// assert_eq!(response.status_text(), "OK");
/// assert_eq!(response.text().unwrap(), "cached");
///
/// response.close();
/// response.close(); // no-op
/// assert!(response.is_closed());
/// ```
pub struct ClientResponse {
    status: StatusCode,
    status_text: String,
    headers: HeaderMap,
    body: Box<dyn Read + Send>,
    closed: bool,
}

impl ClientResponse {
    /// Creates a response with a streaming body.
    ///
    /// The status text defaults to the canonical reason phrase.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body: Box::new(body),
            closed: false,
        }
    }

    /// Creates a response whose body is already in memory.
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self::new(status, headers, io::Cursor::new(body))
    }

    /// Overrides the status text.
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub(crate) fn from_transport(response: reqwest::blocking::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();

        tracing::info!(
            status = status.as_u16(),
            url = %response.url(),
            "Received HTTP response"
        );

        Self::new(status, headers, response)
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The status text, e.g. `"Not Found"`.
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the first value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The declared `Content-Length`, if the server sent one.
    pub fn content_length(&self) -> Option<u64> {
        self.header(CONTENT_LENGTH.as_str())?.trim().parse().ok()
    }

    /// The body stream. Empty once the response is closed.
    pub fn body(&mut self) -> &mut dyn Read {
        &mut self.body
    }

    /// Reads the rest of the body into memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if reading fails.
    pub fn bytes(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Reads the rest of the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if reading fails or the body is
    /// not valid UTF-8.
    pub fn text(&mut self) -> Result<String> {
        let bytes = self.bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// Releases the underlying connection.
    ///
    /// Unread body bytes are discarded. Closing more than once does nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.body = Box::new(io::empty());
        tracing::trace!(status = self.status.as_u16(), "Closed HTTP response");
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Debug for ClientResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.headers)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct TrackedBody {
        dropped: Arc<AtomicBool>,
    }

    impl Read for TrackedBody {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Drop for TrackedBody {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_close_releases_body_once() {
        let dropped = Arc::new(AtomicBool::new(false));
        let mut response = ClientResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            TrackedBody {
                dropped: dropped.clone(),
            },
        );

        assert!(!response.is_closed());
        response.close();
        assert!(response.is_closed());
        assert!(dropped.load(Ordering::SeqCst));

        // A second close is a no-op
        response.close();
        assert!(response.is_closed());
        assert!(response.bytes().unwrap().is_empty());
    }

    #[test]
    fn test_body_reads_sequentially() {
        let mut response =
            ClientResponse::from_bytes(StatusCode::OK, HeaderMap::new(), b"hello world".to_vec());

        let mut first = [0u8; 5];
        response.body().read_exact(&mut first).unwrap();
        assert_eq!(&first, b"hello");
        assert_eq!(response.text().unwrap(), " world");
        assert_eq!(response.text().unwrap(), "");
    }

    #[test]
    fn test_status_text_and_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        let response = ClientResponse::from_bytes(StatusCode::NOT_FOUND, headers, Vec::new());
        assert_eq!(response.status_text(), "Not Found");
        assert_eq!(response.content_length(), Some(42));

        let response = response.with_status_text("Gone Fishing");
        assert_eq!(response.status_text(), "Gone Fishing");
    }

    #[test]
    fn test_invalid_utf8_text_is_io_error() {
        let mut response =
            ClientResponse::from_bytes(StatusCode::OK, HeaderMap::new(), vec![0xff, 0xfe]);
        assert!(matches!(response.text(), Err(crate::Error::Io(_))));
    }
}
