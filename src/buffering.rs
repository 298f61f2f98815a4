//! Request variant that collects the whole body in memory.

use crate::connection::Connection;
use crate::request::{ClientRequest, HttpRequest};
use crate::response::ClientResponse;
use crate::{Error, Result};
use http::header::CONTENT_LENGTH;
use http::HeaderMap;
use reqwest::blocking::Body;
use std::io::Write;

/// A request whose body is buffered until [`execute`](ClientRequest::execute).
///
/// No network I/O happens before execution, and the body is always framed
/// with an exact `Content-Length`.
#[derive(Debug)]
pub struct BufferingRequest {
    connection: Connection,
    head: HttpRequest,
    buffer: Vec<u8>,
}

impl BufferingRequest {
    pub fn new(connection: Connection) -> Self {
        let prepared = connection.prepared();
        let head = HttpRequest::new(prepared.method().clone(), prepared.url().clone());
        Self {
            connection,
            head,
            buffer: Vec::new(),
        }
    }

    /// The bytes written so far.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }
}

impl ClientRequest for BufferingRequest {
    fn head(&self) -> &HttpRequest {
        &self.head
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.head.headers
    }

    fn body(&mut self) -> Result<&mut dyn Write> {
        Ok(&mut self.buffer)
    }

    fn execute(self: Box<Self>) -> Result<ClientResponse> {
        let BufferingRequest {
            connection,
            head,
            buffer,
        } = *self;
        let mut headers = head.headers;

        let body = if connection.prepared().do_output() {
            headers.insert(CONTENT_LENGTH, buffer.len().into());
            Some(Body::from(buffer))
        } else if buffer.is_empty() {
            None
        } else {
            return Err(Error::OutputDisabled {
                method: head.method,
            });
        };

        connection.send(headers, body)
    }
}
