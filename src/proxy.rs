//! Proxy endpoint descriptor.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// A proxy that connections are routed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URL (e.g., `http://proxy.example.com:3128`)
    pub url: Url,
    /// Username for proxy basic authentication
    #[serde(default)]
    pub username: Option<String>,
    /// Password for proxy basic authentication, never serialized
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Creates a proxy descriptor from a URL string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProxy`] if the URL cannot be parsed or does not
    /// use the `http` or `https` scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use reqfactory::ProxyConfig;
    ///
    /// let proxy = ProxyConfig::new("http://proxy.example.com:3128").unwrap();
    /// assert_eq!(proxy.url.port(), Some(3128));
    ///
    /// assert!(ProxyConfig::new("gopher://proxy.example.com").is_err());
    /// ```
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidProxy {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let proxy = Self {
            url: parsed,
            username: None,
            password: None,
        };
        proxy.check_scheme()?;
        Ok(proxy)
    }

    /// Adds basic authentication credentials for the proxy.
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    fn check_scheme(&self) -> Result<()> {
        match self.url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::InvalidProxy {
                url: self.url.to_string(),
                reason: format!("unsupported proxy scheme '{}'", other),
            }),
        }
    }

    /// Converts the descriptor into the transport's proxy type.
    pub(crate) fn to_transport(&self) -> Result<reqwest::Proxy> {
        // Deserialized configs skip `new`, so the scheme is checked again here.
        self.check_scheme()?;
        let proxy = reqwest::Proxy::all(self.url.as_str()).map_err(|e| Error::InvalidProxy {
            url: self.url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(match (&self.username, &self.password) {
            (Some(user), Some(pass)) => proxy.basic_auth(user, pass),
            (Some(user), None) => proxy.basic_auth(user, ""),
            _ => proxy,
        })
    }
}
