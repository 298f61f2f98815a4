//! Request factory configuration.
//!
//! [`RequestFactoryConfig`] is a plain snapshot of every knob a
//! [`SimpleRequestFactory`](crate::SimpleRequestFactory) reads when it opens
//! and prepares a connection. It can be built in code, through
//! [`SimpleRequestFactory::builder`](crate::SimpleRequestFactory::builder), or
//! deserialized from any serde format.

use crate::proxy::ProxyConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chunk size meaning "let the transport pick".
pub const DEFAULT_CHUNK_SIZE: usize = 0;

/// Timeout millis meaning "leave the system default untouched".
pub const UNSET_TIMEOUT: i64 = -1;

/// How a connect or read timeout should be applied to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutSetting {
    /// Leave the transport's own default in place.
    SystemDefault,
    /// Wait forever.
    Infinite,
    /// Fail once this much time has elapsed.
    Bounded(Duration),
}

impl TimeoutSetting {
    /// Interprets a millisecond value: negative is unset, zero is infinite.
    ///
    /// # Examples
    ///
    /// ```
    /// use reqfactory::TimeoutSetting;
    /// use std::time::Duration;
    ///
    /// assert_eq!(TimeoutSetting::from_millis(-1), TimeoutSetting::SystemDefault);
    /// assert_eq!(TimeoutSetting::from_millis(0), TimeoutSetting::Infinite);
    /// assert_eq!(
    ///     TimeoutSetting::from_millis(250),
    ///     TimeoutSetting::Bounded(Duration::from_millis(250))
    /// );
    /// ```
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            m if m < 0 => TimeoutSetting::SystemDefault,
            0 => TimeoutSetting::Infinite,
            m => TimeoutSetting::Bounded(Duration::from_millis(m as u64)),
        }
    }
}

/// Configuration snapshot for a [`SimpleRequestFactory`](crate::SimpleRequestFactory).
///
/// Missing fields take their defaults when deserializing:
///
/// ```
/// use reqfactory::RequestFactoryConfig;
///
/// let config = RequestFactoryConfig::from_json(r#"{ "buffer_request_body": false }"#).unwrap();
/// assert!(!config.buffer_request_body);
/// assert_eq!(config.chunk_size, 0);
/// assert_eq!(config.connect_timeout_millis, -1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestFactoryConfig {
    /// Proxy to route every connection through. `None` uses the system default.
    pub proxy: Option<ProxyConfig>,

    /// Whether request bodies are collected in memory before sending.
    ///
    /// Turn this off when sending large `POST` or `PUT` bodies. The factory
    /// then streams the body, using the `Content-Length` header for framing
    /// when it is set and chunked transfer encoding when it is not.
    pub buffer_request_body: bool,

    /// Maximum bytes per chunk when streaming without a known length.
    pub chunk_size: usize,

    /// Connect timeout in milliseconds. `-1` keeps the system default, `0` is infinite.
    pub connect_timeout_millis: i64,

    /// Read timeout in milliseconds. `-1` keeps the system default, `0` is infinite.
    pub read_timeout_millis: i64,

    /// Opt-in workaround for transports that mishandle reused connections.
    ///
    /// Applies only to connections opened by this factory: they are never
    /// pooled and ask the server to close after one exchange.
    pub disable_keep_alive: bool,
}

impl RequestFactoryConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the JSON does not describe a
    /// valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigurationError(format!("Invalid factory configuration: {}", e)))
    }

    /// The connect timeout as a [`TimeoutSetting`].
    pub fn connect_timeout(&self) -> TimeoutSetting {
        TimeoutSetting::from_millis(self.connect_timeout_millis)
    }

    /// The read timeout as a [`TimeoutSetting`].
    pub fn read_timeout(&self) -> TimeoutSetting {
        TimeoutSetting::from_millis(self.read_timeout_millis)
    }
}

impl Default for RequestFactoryConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            buffer_request_body: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_millis: UNSET_TIMEOUT,
            read_timeout_millis: UNSET_TIMEOUT,
            disable_keep_alive: false,
        }
    }
}
