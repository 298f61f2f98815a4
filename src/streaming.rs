//! Request variant that streams the body to the connection as it is written.
//!
//! Opening the body starts the exchange on a worker thread. The caller's
//! writes travel through a bounded pipe that the transport drains while
//! sending, so memory use stays flat no matter how large the body is. The
//! body cannot be resent.

use crate::connection::Connection;
use crate::request::{ClientRequest, HttpRequest};
use crate::response::ClientResponse;
use crate::{Error, Result};
use http::header::CONTENT_LENGTH;
use http::HeaderMap;
use reqwest::blocking::Body;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Writes that may be queued ahead of the transport before `write` blocks.
const PIPE_CAPACITY: usize = 16;

/// The largest chunk the transport takes from a body reader in one read.
pub const MAX_CHUNK_SIZE: usize = 8 * 1024;

/// A request whose body is streamed instead of buffered.
///
/// When the headers declare a `Content-Length` before the body is opened,
/// the body is sent with fixed-length framing and must match that length.
/// Otherwise chunked transfer encoding is used. Every chunk carries the
/// configured chunk size, except the last, whatever the sizes of the
/// individual writes. A chunk size of `0` leaves the size to the transport,
/// and sizes above [`MAX_CHUNK_SIZE`] are split by the transport.
///
/// Headers are sent when the body is opened; later header changes are
/// ignored. Dropping the request without executing it aborts the body so the
/// server never sees a truncated request as complete.
#[derive(Debug)]
pub struct StreamingRequest {
    connection: Connection,
    head: HttpRequest,
    chunk_size: usize,
    stream: Option<BodyStream>,
}

impl StreamingRequest {
    pub fn new(connection: Connection, chunk_size: usize) -> Self {
        let prepared = connection.prepared();
        let head = HttpRequest::new(prepared.method().clone(), prepared.url().clone());
        Self {
            connection,
            head,
            chunk_size,
            stream: None,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns `true` once the body has been opened and the exchange started.
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    fn start_stream(&self) -> Result<BodyStream> {
        if !self.connection.prepared().do_output() {
            return Err(Error::OutputDisabled {
                method: self.head.method.clone(),
            });
        }

        let (tx, rx) = sync_channel(PIPE_CAPACITY);
        let aborted = Arc::new(AtomicBool::new(false));
        let reader = PipeReader {
            rx,
            pending: Vec::new(),
            pos: 0,
            chunk_size: self.chunk_size,
            aborted: aborted.clone(),
        };

        let headers = self.head.headers.clone();
        let body = match declared_length(&headers) {
            Some(len) => Body::sized(reader, len),
            None => Body::new(reader),
        };

        tracing::debug!(
            method = %self.head.method,
            url = %self.head.uri,
            content_length = ?declared_length(&headers),
            chunk_size = self.chunk_size,
            "Opening streaming request body"
        );

        let connection = self.connection.clone();
        let sent_headers = headers.clone();
        let exchange = thread::Builder::new()
            .name("reqfactory-stream".to_string())
            .spawn(move || connection.send(headers, Some(body)))?;

        Ok(BodyStream {
            writer: PipeWriter { tx },
            aborted,
            sent_headers,
            exchange,
        })
    }
}

impl ClientRequest for StreamingRequest {
    fn head(&self) -> &HttpRequest {
        &self.head
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.head.headers
    }

    fn headers_sent(&self) -> bool {
        self.is_streaming()
    }

    fn body(&mut self) -> Result<&mut dyn Write> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.start_stream()?,
        };
        Ok(&mut self.stream.insert(stream).writer)
    }

    fn execute(mut self: Box<Self>) -> Result<ClientResponse> {
        match self.stream.take() {
            Some(stream) => stream.finish(&self.head.headers),
            None => {
                // The body was never opened: send the head alone.
                let headers = std::mem::take(&mut self.head.headers);
                let body = if self.connection.prepared().do_output() {
                    Some(Body::from(Vec::new()))
                } else {
                    None
                };
                self.connection.send(headers, body)
            }
        }
    }
}

impl Drop for StreamingRequest {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.abort();
        }
    }
}

/// The `Content-Length` the caller declared, if any.
fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
}

/// An exchange in progress on a worker thread.
#[derive(Debug)]
struct BodyStream {
    writer: PipeWriter,
    aborted: Arc<AtomicBool>,
    sent_headers: HeaderMap,
    exchange: JoinHandle<Result<ClientResponse>>,
}

impl BodyStream {
    fn finish(self, headers: &HeaderMap) -> Result<ClientResponse> {
        if *headers != self.sent_headers {
            tracing::warn!("Request headers changed after the body was opened; the changes were not sent");
        }

        // Closing the pipe ends the body.
        drop(self.writer);

        self.exchange
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("request body stream thread panicked").into()))
    }

    fn abort(self) {
        self.aborted.store(true, Ordering::SeqCst);
        drop(self.writer);
        tracing::debug!("Aborted unexecuted streaming request");
    }
}

/// Caller side of the body pipe.
#[derive(Debug)]
struct PipeWriter {
    tx: SyncSender<Vec<u8>>,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx.send(buf.to_vec()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::BrokenPipe,
                "the exchange ended before the request body was fully written",
            )
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Transport side of the body pipe.
///
/// Every `read` returns exactly `chunk_size` bytes, except the last one before
/// the writer closes, and the transport turns each read into one chunk on the
/// wire. With a chunk size of `0` each read hands over whatever is queued.
struct PipeReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    aborted: Arc<AtomicBool>,
}

impl PipeReader {
    fn check_aborted(&self) -> io::Result<()> {
        if self.aborted.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "request was dropped before it was executed",
            ));
        }
        Ok(())
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // With a chunk size, hold back until a full chunk is queued or the
        // writer is done. Only the last chunk may come up short.
        let wanted = match self.chunk_size {
            0 => 1,
            chunk_size => chunk_size.min(buf.len()),
        };
        while self.pending.len() - self.pos < wanted {
            match self.rx.recv() {
                Ok(data) => {
                    if self.pos > 0 {
                        self.pending.drain(..self.pos);
                        self.pos = 0;
                    }
                    self.pending.extend_from_slice(&data);
                }
                Err(_) => break,
            }
        }
        self.check_aborted()?;

        let mut len = buf.len().min(self.pending.len() - self.pos);
        if self.chunk_size > 0 {
            len = len.min(self.chunk_size);
        }
        buf[..len].copy_from_slice(&self.pending[self.pos..self.pos + len]);
        self.pos += len;
        Ok(len)
    }
}
