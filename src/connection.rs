//! Opening and preparing transport connections.
//!
//! A connection goes through three stages, each with its own type:
//!
//! 1. [`open`] resolves a URL and an optional proxy into a
//!    [`ConnectionHandle`], rejecting anything that is not an HTTP connection.
//! 2. A [`ConnectionBuilder`] applies timeouts, input/output flags and the
//!    redirect policy. Its final step fixes the method and yields an immutable
//!    [`PreparedConnection`], so a half-configured connection never escapes.
//! 3. [`PreparedConnection::connect`] builds the transport client the request
//!    variants execute against.

use crate::config::TimeoutSetting;
use crate::proxy::ProxyConfig;
use crate::response::ClientResponse;
use crate::{Error, Result};
use http::header::{HeaderValue, CONNECTION};
use http::{HeaderMap, Method};
use reqwest::blocking::{Body, Client};
use reqwest::redirect::Policy;
use url::Url;

/// A resolved, not yet prepared, connection to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    url: Url,
    proxy: Option<reqwest::Proxy>,
    proxy_url: Option<Url>,
    keep_alive: bool,
}

impl ConnectionHandle {
    /// The target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The proxy this connection is routed through, if any.
    pub fn proxy_url(&self) -> Option<&Url> {
        self.proxy_url.as_ref()
    }
}

/// Opens a connection handle for `url`.
///
/// With a proxy, the connection goes through it. Without one, the
/// transport's system defaults (including `HTTP_PROXY` style environment
/// variables) decide. `disable_keep_alive` turns off connection reuse for
/// this handle only.
///
/// # Errors
///
/// Returns [`Error::UnsupportedScheme`] for anything but `http` and `https`,
/// and [`Error::InvalidProxy`] if the proxy is rejected.
pub fn open(url: &Url, proxy: Option<&ProxyConfig>, disable_keep_alive: bool) -> Result<ConnectionHandle> {
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::UnsupportedScheme {
                scheme: other.to_string(),
            })
        }
    }

    let transport_proxy = proxy.map(ProxyConfig::to_transport).transpose()?;

    tracing::trace!(
        url = %url,
        proxy = ?proxy.map(|p| p.url.as_str()),
        keep_alive = !disable_keep_alive,
        "Opened connection handle"
    );

    Ok(ConnectionHandle {
        url: url.clone(),
        proxy: transport_proxy,
        proxy_url: proxy.map(|p| p.url.clone()),
        keep_alive: !disable_keep_alive,
    })
}

/// Prepares `handle` for `method` using the standard rules.
///
/// Timeouts are applied first, then input is enabled. Redirects are followed
/// for `GET` only, output is enabled for `POST` and `PUT` only, and the
/// method is set last.
pub fn prepare(
    handle: ConnectionHandle,
    method: &Method,
    connect_timeout: TimeoutSetting,
    read_timeout: TimeoutSetting,
) -> PreparedConnection {
    ConnectionBuilder::new(handle)
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .do_input(true)
        .follow_redirects(*method == Method::GET)
        .do_output(*method == Method::PUT || *method == Method::POST)
        .method(method.clone())
}

/// Step-by-step configuration of a [`ConnectionHandle`].
///
/// Setting the method consumes the builder, so it is always the last step.
#[derive(Debug)]
pub struct ConnectionBuilder {
    handle: ConnectionHandle,
    connect_timeout: TimeoutSetting,
    read_timeout: TimeoutSetting,
    do_input: bool,
    do_output: bool,
    follow_redirects: bool,
}

impl ConnectionBuilder {
    /// Starts preparing `handle` with system default timeouts and every flag off.
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            connect_timeout: TimeoutSetting::SystemDefault,
            read_timeout: TimeoutSetting::SystemDefault,
            do_input: false,
            do_output: false,
            follow_redirects: false,
        }
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: TimeoutSetting) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    pub fn read_timeout(mut self, timeout: TimeoutSetting) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets whether the response will be read.
    pub fn do_input(mut self, enabled: bool) -> Self {
        self.do_input = enabled;
        self
    }

    /// Sets whether redirects are followed automatically.
    pub fn follow_redirects(mut self, enabled: bool) -> Self {
        self.follow_redirects = enabled;
        self
    }

    /// Sets whether a request body may be written.
    pub fn do_output(mut self, enabled: bool) -> Self {
        self.do_output = enabled;
        self
    }

    /// Fixes the method and finishes preparation.
    pub fn method(self, method: Method) -> PreparedConnection {
        PreparedConnection {
            url: self.handle.url,
            proxy: self.handle.proxy,
            proxy_url: self.handle.proxy_url,
            keep_alive: self.handle.keep_alive,
            method,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            do_input: self.do_input,
            do_output: self.do_output,
            follow_redirects: self.follow_redirects,
        }
    }
}

/// A fully configured connection descriptor.
#[derive(Debug, Clone)]
pub struct PreparedConnection {
    url: Url,
    proxy: Option<reqwest::Proxy>,
    proxy_url: Option<Url>,
    keep_alive: bool,
    method: Method,
    connect_timeout: TimeoutSetting,
    read_timeout: TimeoutSetting,
    do_input: bool,
    do_output: bool,
    follow_redirects: bool,
}

impl PreparedConnection {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn proxy_url(&self) -> Option<&Url> {
        self.proxy_url.as_ref()
    }

    pub fn connect_timeout(&self) -> TimeoutSetting {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> TimeoutSetting {
        self.read_timeout
    }

    pub fn do_input(&self) -> bool {
        self.do_input
    }

    pub fn do_output(&self) -> bool {
        self.do_output
    }

    pub fn follows_redirects(&self) -> bool {
        self.follow_redirects
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Builds the transport client for this connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the transport refuses the configuration.
    pub fn connect(self) -> Result<Connection> {
        let policy = if self.follow_redirects {
            Policy::default()
        } else {
            Policy::none()
        };
        let mut builder = Client::builder().redirect(policy);

        builder = match self.connect_timeout {
            TimeoutSetting::SystemDefault => builder,
            TimeoutSetting::Infinite => builder.connect_timeout(None),
            TimeoutSetting::Bounded(timeout) => builder.connect_timeout(timeout),
        };
        builder = match self.read_timeout {
            TimeoutSetting::SystemDefault => builder,
            TimeoutSetting::Infinite => builder.timeout(None),
            TimeoutSetting::Bounded(timeout) => builder.timeout(timeout),
        };

        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(proxy.clone());
        }

        if !self.keep_alive {
            let mut headers = HeaderMap::new();
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            builder = builder.pool_max_idle_per_host(0).default_headers(headers);
        }

        let client = builder.build().map_err(Error::Connection)?;
        Ok(Connection {
            prepared: self,
            client,
        })
    }
}

/// A prepared connection bound to a live transport client.
#[derive(Debug, Clone)]
pub struct Connection {
    prepared: PreparedConnection,
    client: Client,
}

impl Connection {
    pub fn prepared(&self) -> &PreparedConnection {
        &self.prepared
    }

    /// Sends the request and waits for the response head.
    pub(crate) fn send(&self, headers: HeaderMap, body: Option<Body>) -> Result<ClientResponse> {
        let prepared = &self.prepared;

        tracing::debug!(
            method = %prepared.method,
            url = %prepared.url,
            streaming = body.as_ref().map(|b| b.as_bytes().is_none()).unwrap_or(false),
            "Executing HTTP request"
        );

        let mut request = self
            .client
            .request(prepared.method.clone(), prepared.url.clone())
            .headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().map_err(|e| {
            tracing::warn!(
                error = %e,
                method = %prepared.method,
                url = %prepared.url,
                "Request failed"
            );
            Error::from_transport(e)
        })?;

        Ok(ClientResponse::from_transport(response))
    }
}
