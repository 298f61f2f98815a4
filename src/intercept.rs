//! Interceptor chains around any [`RequestFactory`].
//!
//! An [`InterceptingRequestFactory`] hands out requests that buffer their
//! body and, on execution, walk an ordered list of [`Interceptor`]s. Each
//! interceptor receives the request head, the body and an [`Execution`]
//! pointing at the next link. Calling [`Execution::execute`] moves the
//! request along; returning without calling it short-circuits the chain.
//! Once past the last interceptor, the execution creates a real request from
//! the delegate factory and executes it.
//!
//! ```no_run
//! use reqfactory::intercept::{self, Execution, InterceptingRequestFactory};
//! use reqfactory::{HttpRequest, RequestFactory, SimpleRequestFactory};
//! use http::Method;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), reqfactory::Error> {
//! let tracing_header = intercept::from_fn(
//!     |mut request: HttpRequest, body: Vec<u8>, next: Execution<'_>| {
//!         request.add_header("X-Trace", "abc")?;
//!         next.execute(request, body)
//!     },
//! );
//!
//! let factory = InterceptingRequestFactory::new(
//!     Arc::new(SimpleRequestFactory::new()),
//!     vec![Arc::new(tracing_header)],
//! );
//! let response = factory.create_request_str("https://api.example.com/", Method::GET)?.execute()?;
//! # Ok(())
//! # }
//! ```

use crate::factory::RequestFactory;
use crate::request::{ClientRequest, HttpRequest};
use crate::response::ClientResponse;
use crate::Result;
use http::{HeaderMap, Method};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use url::Url;

/// A link in an interceptor chain.
///
/// Interceptors may change the request head or body before passing them on,
/// inspect the response on the way back, or answer on their own by not
/// calling `execution` at all. Errors from further down the chain should be
/// propagated, not swallowed.
pub trait Interceptor: Send + Sync {
    fn intercept(
        &self,
        request: HttpRequest,
        body: Vec<u8>,
        execution: Execution<'_>,
    ) -> Result<ClientResponse>;
}

/// Wraps a closure as an [`Interceptor`].
pub fn from_fn<F>(f: F) -> FnInterceptor<F>
where
    F: Fn(HttpRequest, Vec<u8>, Execution<'_>) -> Result<ClientResponse> + Send + Sync,
{
    FnInterceptor { f }
}

/// An [`Interceptor`] backed by a closure. See [`from_fn`].
#[derive(Clone)]
pub struct FnInterceptor<F> {
    f: F,
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(HttpRequest, Vec<u8>, Execution<'_>) -> Result<ClientResponse> + Send + Sync,
{
    fn intercept(
        &self,
        request: HttpRequest,
        body: Vec<u8>,
        execution: Execution<'_>,
    ) -> Result<ClientResponse> {
        (self.f)(request, body, execution)
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor").finish_non_exhaustive()
    }
}

/// The remainder of an interceptor chain.
///
/// An `Execution` is a cursor into the interceptor list. It is consumed when
/// executed, so every link runs at most once and the chain only moves
/// forward.
pub struct Execution<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    index: usize,
    delegate: &'a dyn RequestFactory,
}

impl<'a> Execution<'a> {
    /// Positions a new execution at the first interceptor.
    pub fn new(interceptors: &'a [Arc<dyn Interceptor>], delegate: &'a dyn RequestFactory) -> Self {
        Self {
            interceptors,
            index: 0,
            delegate,
        }
    }

    /// Index of the interceptor this execution will run next.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if executing goes straight to the delegate factory.
    pub fn is_terminal(&self) -> bool {
        self.index >= self.interceptors.len()
    }

    /// Runs the rest of the chain.
    pub fn execute(self, request: HttpRequest, body: Vec<u8>) -> Result<ClientResponse> {
        let interceptors = self.interceptors;
        match interceptors.get(self.index) {
            Some(interceptor) => {
                let next = Execution {
                    index: self.index + 1,
                    ..self
                };
                interceptor.intercept(request, body, next)
            }
            None => self.execute_delegate(request, body),
        }
    }

    fn execute_delegate(self, request: HttpRequest, body: Vec<u8>) -> Result<ClientResponse> {
        let HttpRequest {
            method,
            uri,
            headers,
        } = request;

        let mut delegate = self.delegate.create_request(&uri, method)?;
        let target = delegate.headers_mut();
        for (name, value) in headers.iter() {
            target.append(name.clone(), value.clone());
        }
        if !body.is_empty() {
            delegate.body()?.write_all(&body)?;
        }
        delegate.execute()
    }
}

impl fmt::Debug for Execution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("index", &self.index)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

/// A [`RequestFactory`] that runs an interceptor chain before delegating.
#[derive(Clone)]
pub struct InterceptingRequestFactory {
    delegate: Arc<dyn RequestFactory>,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl InterceptingRequestFactory {
    /// Wraps `delegate`, running `interceptors` in the given order.
    pub fn new(delegate: Arc<dyn RequestFactory>, interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            delegate,
            interceptors: interceptors.into(),
        }
    }

    /// The interceptors, in execution order.
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }
}

impl RequestFactory for InterceptingRequestFactory {
    fn create_request(&self, uri: &Url, method: Method) -> Result<Box<dyn ClientRequest>> {
        Ok(Box::new(InterceptingRequest {
            head: HttpRequest::new(method, uri.clone()),
            body: Vec::new(),
            delegate: self.delegate.clone(),
            interceptors: self.interceptors.clone(),
        }))
    }
}

impl fmt::Debug for InterceptingRequestFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptingRequestFactory")
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// A request created by an [`InterceptingRequestFactory`].
///
/// The body is buffered so every interceptor can see it in full.
pub struct InterceptingRequest {
    head: HttpRequest,
    body: Vec<u8>,
    delegate: Arc<dyn RequestFactory>,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl ClientRequest for InterceptingRequest {
    fn head(&self) -> &HttpRequest {
        &self.head
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.head.headers
    }

    fn body(&mut self) -> Result<&mut dyn Write> {
        Ok(&mut self.body)
    }

    fn execute(self: Box<Self>) -> Result<ClientResponse> {
        let InterceptingRequest {
            head,
            body,
            delegate,
            interceptors,
        } = *self;

        tracing::trace!(
            method = %head.method,
            url = %head.uri,
            interceptors = interceptors.len(),
            "Running interceptor chain"
        );

        Execution::new(&interceptors, delegate.as_ref()).execute(head, body)
    }
}

impl fmt::Debug for InterceptingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptingRequest")
            .field("head", &self.head)
            .field("body_len", &self.body.len())
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use http::StatusCode;
    use std::sync::Mutex;

    type Sent = Arc<Mutex<Vec<(HttpRequest, Vec<u8>)>>>;

    /// Records what reaches the end of the chain instead of sending it.
    struct RecordingFactory {
        sent: Sent,
        fail: bool,
    }

    struct RecordingRequest {
        head: HttpRequest,
        body: Vec<u8>,
        sent: Sent,
        fail: bool,
    }

    impl RequestFactory for RecordingFactory {
        fn create_request(&self, uri: &Url, method: Method) -> Result<Box<dyn ClientRequest>> {
            Ok(Box::new(RecordingRequest {
                head: HttpRequest::new(method, uri.clone()),
                body: Vec::new(),
                sent: self.sent.clone(),
                fail: self.fail,
            }))
        }
    }

    impl ClientRequest for RecordingRequest {
        fn head(&self) -> &HttpRequest {
            &self.head
        }

        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.head.headers
        }

        fn body(&mut self) -> Result<&mut dyn Write> {
            Ok(&mut self.body)
        }

        fn execute(self: Box<Self>) -> Result<ClientResponse> {
            if self.fail {
                return Err(Error::Timeout);
            }
            self.sent
                .lock()
                .unwrap()
                .push((self.head.clone(), self.body.clone()));
            Ok(ClientResponse::from_bytes(
                StatusCode::OK,
                self.head.headers.clone(),
                b"terminal".to_vec(),
            ))
        }
    }

    fn recording(fail: bool) -> (Arc<dyn RequestFactory>, Sent) {
        let sent: Sent = Arc::default();
        let factory = RecordingFactory {
            sent: sent.clone(),
            fail,
        };
        (Arc::new(factory), sent)
    }

    fn uri() -> Url {
        Url::parse("http://localhost/echo").unwrap()
    }

    /// Appends `name` to the `x-order` header and records what it saw.
    fn ordering(name: &'static str, seen: Arc<Mutex<Vec<String>>>) -> Arc<dyn Interceptor> {
        Arc::new(from_fn(
            move |mut request: HttpRequest, body: Vec<u8>, next: Execution<'_>| {
                let before = request.header("x-order").unwrap_or("").to_string();
                seen.lock().unwrap().push(format!("{}:{}", name, before));
                request
                    .headers
                    .insert("x-order", format!("{}{}", before, name).parse().unwrap());
                next.execute(request, body)
            },
        ))
    }

    #[test]
    fn test_interceptors_run_in_order_before_delegate() {
        let (delegate, sent) = recording(false);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let factory = InterceptingRequestFactory::new(
            delegate,
            vec![ordering("A", seen.clone()), ordering("B", seen.clone())],
        );

        let mut response = factory
            .create_request(&uri(), Method::GET)
            .unwrap()
            .execute()
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["A:", "B:A"]);
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.header("x-order"), Some("AB"));
        assert_eq!(response.header("x-order"), Some("AB"));
        assert_eq!(response.text().unwrap(), "terminal");
    }

    #[test]
    fn test_header_added_by_interceptor_reaches_the_wire() {
        let (delegate, sent) = recording(false);
        let trace = from_fn(|mut request: HttpRequest, body: Vec<u8>, next: Execution<'_>| {
            request.add_header("X-Trace", "abc")?;
            next.execute(request, body)
        });
        let factory = InterceptingRequestFactory::new(delegate, vec![Arc::new(trace)]);

        let mut request = factory.create_request(&uri(), Method::POST).unwrap();
        request
            .headers_mut()
            .insert("content-type", "text/plain".parse().unwrap());
        request.body().unwrap().write_all(b"payload").unwrap();
        request.execute().unwrap();

        let sent = sent.lock().unwrap();
        let (head, body) = &sent[0];
        assert_eq!(head.method, Method::POST);
        assert_eq!(head.header("x-trace"), Some("abc"));
        assert_eq!(head.header("content-type"), Some("text/plain"));
        assert_eq!(body, b"payload");
    }

    #[test]
    fn test_interceptor_can_replace_body() {
        let (delegate, sent) = recording(false);
        let upper = from_fn(|request: HttpRequest, body: Vec<u8>, next: Execution<'_>| {
            next.execute(request, body.to_ascii_uppercase())
        });
        let factory = InterceptingRequestFactory::new(delegate, vec![Arc::new(upper)]);

        let mut request = factory.create_request(&uri(), Method::PUT).unwrap();
        request.body().unwrap().write_all(b"quiet").unwrap();
        request.execute().unwrap();

        assert_eq!(sent.lock().unwrap()[0].1, b"QUIET");
    }

    #[test]
    fn test_short_circuit_skips_delegate_and_later_links() {
        let (delegate, sent) = recording(false);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cached = from_fn(|_request: HttpRequest, _body: Vec<u8>, next: Execution<'_>| {
            assert_eq!(next.index(), 1);
            Ok(ClientResponse::from_bytes(
                StatusCode::NOT_MODIFIED,
                HeaderMap::new(),
                Vec::new(),
            ))
        });
        let factory = InterceptingRequestFactory::new(
            delegate,
            vec![Arc::new(cached), ordering("never", seen.clone())],
        );

        let response = factory
            .create_request(&uri(), Method::GET)
            .unwrap()
            .execute()
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(seen.lock().unwrap().is_empty());
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_delegate_failure_propagates_unchanged() {
        let (delegate, _) = recording(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let factory = InterceptingRequestFactory::new(delegate, vec![ordering("A", seen.clone())]);

        let err = factory
            .create_request(&uri(), Method::GET)
            .unwrap()
            .execute()
            .unwrap_err();

        assert!(matches!(err, Error::Timeout));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_chain_delegates_directly() {
        let (delegate, sent) = recording(false);
        let factory = InterceptingRequestFactory::new(delegate.clone(), Vec::new());
        assert!(Execution::new(factory.interceptors(), delegate.as_ref()).is_terminal());

        let response = factory
            .create_request(&uri(), Method::DELETE)
            .unwrap()
            .execute()
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sent.lock().unwrap()[0].0.method, Method::DELETE);
    }

    #[test]
    fn test_empty_body_is_not_written_to_delegate() {
        let (delegate, sent) = recording(false);
        let factory = InterceptingRequestFactory::new(delegate, Vec::new());
        factory
            .create_request(&uri(), Method::GET)
            .unwrap()
            .execute()
            .unwrap();
        assert!(sent.lock().unwrap()[0].1.is_empty());
    }
}
