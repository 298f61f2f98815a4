//! Error types for request creation and execution.
//!
//! Errors fall into three kinds (see [`ErrorKind`]): failures to open or
//! prepare a connection, failures while moving bytes over an established
//! exchange, and invalid configuration. Nothing in this crate retries; every
//! error is surfaced to the caller as soon as it happens.

use http::Method;

/// The broad category an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying connection could not be opened or prepared.
    Connection,
    /// The body write or the response exchange failed.
    Transport,
    /// Invalid configuration was supplied.
    Configuration,
}

/// The main error type for request factories and requests.
///
/// # Examples
///
/// ```no_run
/// use reqfactory::{Error, ErrorKind, RequestFactory, SimpleRequestFactory};
/// use http::Method;
///
/// # fn example() -> Result<(), Error> {
/// let factory = SimpleRequestFactory::builder().build()?;
///
/// match factory.create_request_str("ftp://example.com/file", Method::GET) {
///     Ok(_) => unreachable!(),
///     Err(e) => assert_eq!(e.kind(), ErrorKind::Connection),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The target URI could not be parsed.
    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// The URI names a scheme that cannot be opened as an HTTP connection.
    #[error("Unsupported URI scheme '{scheme}': only http and https connections can be opened")]
    UnsupportedScheme {
        /// The rejected scheme
        scheme: String,
    },

    /// The configured proxy was rejected by the transport.
    #[error("Invalid proxy '{url}': {reason}")]
    InvalidProxy {
        /// The proxy URL as configured
        url: String,
        /// Why the transport refused it
        reason: String,
    },

    /// The connection could not be established.
    ///
    /// Covers construction of the transport client as well as DNS and TCP
    /// connect failures reported while executing.
    #[error("Connection error: {0}")]
    Connection(#[source] reqwest::Error),

    /// A connect or read timeout elapsed.
    #[error("Request timed out")]
    Timeout,

    /// The exchange failed after the connection was established.
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Writing the request body or reading the response body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request body was supplied for a method that does not send one.
    ///
    /// Only `POST` and `PUT` connections are prepared with output enabled.
    #[error("{method} requests are prepared without output and cannot carry a body")]
    OutputDisabled {
        /// The request method
        method: Method,
    },

    /// Invalid configuration was provided, such as a malformed header.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl Error {
    /// Classifies a transport error raised while executing an exchange.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Connection(err)
        } else {
            Error::Transport(err)
        }
    }

    /// Returns the category of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use reqfactory::{Error, ErrorKind};
    ///
    /// let err = Error::UnsupportedScheme { scheme: "ftp".to_string() };
    /// assert_eq!(err.kind(), ErrorKind::Connection);
    ///
    /// assert_eq!(Error::Timeout.kind(), ErrorKind::Transport);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUri(_)
            | Error::UnsupportedScheme { .. }
            | Error::InvalidProxy { .. }
            | Error::Connection(_) => ErrorKind::Connection,
            Error::Timeout | Error::Transport(_) | Error::Io(_) | Error::OutputDisabled { .. } => {
                ErrorKind::Transport
            }
            Error::ConfigurationError(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if this error failed to open or prepare a connection.
    pub fn is_connection_error(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    /// Returns `true` if this error happened during the exchange itself.
    pub fn is_transport_error(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Returns `true` if a timeout elapsed.
    ///
    /// I/O errors from reading a response body are included when they wrap
    /// a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// A specialized `Result` type for request factories and requests.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let parse = url::Url::parse("not a uri").unwrap_err();
        assert_eq!(Error::from(parse).kind(), ErrorKind::Connection);

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        assert!(Error::from(io).is_transport_error());

        let err = Error::OutputDisabled { method: Method::GET };
        assert!(err.is_transport_error());
        assert_eq!(
            err.to_string(),
            "GET requests are prepared without output and cannot carry a body"
        );

        assert_eq!(
            Error::ConfigurationError("bad".into()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_io_timeout_is_timeout() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out");
        assert!(Error::from(io).is_timeout());
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::UnsupportedScheme { scheme: "ftp".into() }.is_timeout());
    }
}
