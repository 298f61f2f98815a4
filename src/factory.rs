//! Request factories.
//!
//! [`RequestFactory`] is the seam everything else plugs into: the
//! [`SimpleRequestFactory`] opens real connections, while wrappers such as
//! [`InterceptingRequestFactory`](crate::InterceptingRequestFactory) decorate
//! any other factory.

use crate::buffering::BufferingRequest;
use crate::config::{RequestFactoryConfig, TimeoutSetting};
use crate::connection::{self, PreparedConnection};
use crate::proxy::ProxyConfig;
use crate::request::ClientRequest;
use crate::streaming::{StreamingRequest, MAX_CHUNK_SIZE};
use crate::Result;
use http::Method;
use url::Url;

/// Creates [`ClientRequest`]s for a URI and method.
///
/// Implementations must be usable from several threads at once; every call
/// produces an independent request.
pub trait RequestFactory: Send + Sync {
    /// Creates a request bound to a fresh connection for `uri`.
    ///
    /// # Errors
    ///
    /// Returns a connection-kind [`Error`](crate::Error) if the connection
    /// cannot be opened, e.g. for an unsupported scheme or a rejected proxy.
    fn create_request(&self, uri: &Url, method: Method) -> Result<Box<dyn ClientRequest>>;

    /// Parses `uri` and creates a request for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`](crate::Error::InvalidUri) if the URI does
    /// not parse, plus everything [`create_request`](Self::create_request)
    /// can return.
    fn create_request_str(&self, uri: &str, method: Method) -> Result<Box<dyn ClientRequest>> {
        let uri = Url::parse(uri)?;
        self.create_request(&uri, method)
    }
}

/// A [`RequestFactory`] backed directly by the transport.
///
/// Each request gets its own connection, prepared from this factory's
/// [`RequestFactoryConfig`]. With `buffer_request_body` on (the default) the
/// requests are [`BufferingRequest`]s, otherwise [`StreamingRequest`]s.
///
/// # Examples
///
/// ```no_run
/// use reqfactory::{RequestFactory, SimpleRequestFactory};
/// use http::Method;
/// use std::io::Write;
///
/// # fn example() -> Result<(), reqfactory::Error> {
/// let factory = SimpleRequestFactory::builder()
///     .connect_timeout_millis(5_000)
///     .read_timeout_millis(30_000)
///     .buffer_request_body(false)
///     .chunk_size(16 * 1024)
///     .build()?;
///
/// let mut request = factory.create_request_str("https://uploads.example.com/blob", Method::PUT)?;
/// let body = request.body()?;
/// for _ in 0..1024 {
///     body.write_all(&[0u8; 1024])?;
/// }
/// let mut response = request.execute()?;
/// assert!(response.status().is_success());
/// response.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimpleRequestFactory {
    config: RequestFactoryConfig,
}

impl SimpleRequestFactory {
    /// Creates a factory with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory from a configuration snapshot.
    pub fn from_config(config: RequestFactoryConfig) -> Self {
        Self { config }
    }

    /// Creates a new `RequestFactoryBuilder`.
    pub fn builder() -> RequestFactoryBuilder {
        RequestFactoryBuilder::new()
    }

    /// The current configuration.
    pub fn config(&self) -> &RequestFactoryConfig {
        &self.config
    }

    /// Sets the proxy every connection is routed through.
    pub fn set_proxy(&mut self, proxy: Option<ProxyConfig>) {
        self.config.proxy = proxy;
    }

    /// Sets whether request bodies are buffered in memory.
    pub fn set_buffer_request_body(&mut self, buffer: bool) {
        self.config.buffer_request_body = buffer;
    }

    /// Sets the chunk size for streamed bodies of unknown length.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.config.chunk_size = chunk_size;
    }

    /// Sets the connect timeout in milliseconds (`-1` unset, `0` infinite).
    pub fn set_connect_timeout_millis(&mut self, millis: i64) {
        self.config.connect_timeout_millis = millis;
    }

    /// Sets the read timeout in milliseconds (`-1` unset, `0` infinite).
    pub fn set_read_timeout_millis(&mut self, millis: i64) {
        self.config.read_timeout_millis = millis;
    }

    /// Turns the keep-alive workaround on or off for this factory.
    pub fn set_disable_keep_alive(&mut self, disable: bool) {
        self.config.disable_keep_alive = disable;
    }

    /// Opens and prepares a connection without wrapping it in a request.
    ///
    /// # Errors
    ///
    /// Same as [`RequestFactory::create_request`].
    pub fn prepare_connection(&self, uri: &Url, method: &Method) -> Result<PreparedConnection> {
        let handle = connection::open(
            uri,
            self.config.proxy.as_ref(),
            self.config.disable_keep_alive,
        )?;
        Ok(connection::prepare(
            handle,
            method,
            self.config.connect_timeout(),
            self.config.read_timeout(),
        ))
    }
}

impl RequestFactory for SimpleRequestFactory {
    fn create_request(&self, uri: &Url, method: Method) -> Result<Box<dyn ClientRequest>> {
        let connection = self.prepare_connection(uri, &method)?.connect()?;

        tracing::debug!(
            method = %method,
            url = %uri,
            buffered = self.config.buffer_request_body,
            "Created request"
        );

        if self.config.buffer_request_body {
            Ok(Box::new(BufferingRequest::new(connection)))
        } else {
            Ok(Box::new(StreamingRequest::new(
                connection,
                self.config.chunk_size,
            )))
        }
    }
}

/// Builder for configuring and creating a [`SimpleRequestFactory`].
///
/// # Examples
///
/// ```
/// use reqfactory::SimpleRequestFactory;
///
/// # fn example() -> Result<(), reqfactory::Error> {
/// let factory = SimpleRequestFactory::builder()
///     .proxy("http://proxy.example.com:3128")?
///     .connect_timeout_millis(2_000)
///     .build()?;
/// assert!(factory.config().proxy.is_some());
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestFactoryBuilder {
    config: RequestFactoryConfig,
}

impl RequestFactoryBuilder {
    /// Creates a new `RequestFactoryBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes every connection through the proxy at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid.
    pub fn proxy(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.config.proxy = Some(ProxyConfig::new(url.as_ref())?);
        Ok(self)
    }

    /// Routes every connection through an already built proxy descriptor.
    pub fn proxy_config(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Sets whether request bodies are buffered in memory (default `true`).
    pub fn buffer_request_body(mut self, buffer: bool) -> Self {
        self.config.buffer_request_body = buffer;
        self
    }

    /// Sets the chunk size for streamed bodies (default `0`, transport chosen).
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Sets the connect timeout in milliseconds (`-1` unset, `0` infinite).
    pub fn connect_timeout_millis(mut self, millis: i64) -> Self {
        self.config.connect_timeout_millis = millis;
        self
    }

    /// Sets the read timeout in milliseconds (`-1` unset, `0` infinite).
    pub fn read_timeout_millis(mut self, millis: i64) -> Self {
        self.config.read_timeout_millis = millis;
        self
    }

    /// Disables connection reuse for this factory's connections.
    pub fn disable_keep_alive(mut self, disable: bool) -> Self {
        self.config.disable_keep_alive = disable;
        self
    }

    /// Builds the configured `SimpleRequestFactory`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured proxy is rejected by the transport.
    pub fn build(self) -> Result<SimpleRequestFactory> {
        if let Some(proxy) = &self.config.proxy {
            proxy.to_transport()?;
        }

        if let (TimeoutSetting::Bounded(connect), TimeoutSetting::Bounded(read)) =
            (self.config.connect_timeout(), self.config.read_timeout())
        {
            if read < connect {
                tracing::warn!(
                    connect_timeout_ms = connect.as_millis(),
                    read_timeout_ms = read.as_millis(),
                    "Read timeout is shorter than the connect timeout and will cut connects short"
                );
            }
        }

        if self.config.chunk_size > MAX_CHUNK_SIZE {
            tracing::warn!(
                chunk_size = self.config.chunk_size,
                max_chunk_size = MAX_CHUNK_SIZE,
                "Chunk size exceeds what the transport sends per chunk; chunks will be split"
            );
        }

        Ok(SimpleRequestFactory::from_config(self.config))
    }
}
