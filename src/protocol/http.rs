// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the zone/device REST API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, ParseError, TransportError};

// ============================================================================
// HttpConfig
// ============================================================================

/// Configuration for the REST API connection.
///
/// # Examples
///
/// ```
/// use zonesync_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = HttpConfig::new("192.168.1.100");
///
/// // With all options
/// let config = HttpConfig::new("admin.local")
///     .with_port(8080)
///     .with_https()
///     .with_token("session-token")
///     .with_timeout(Duration::from_secs(5));
///
/// // From a full URL
/// let config = HttpConfig::parse("http://127.0.0.1:3000").unwrap();
/// assert_eq!(config.port(), 3000);
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    token: Option<String>,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new configuration for the specified host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Parses a base URL such as `http://host:3000` or `https://host`.
    ///
    /// A URL without a scheme is treated as plain HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidAddress`] if the host is empty or the
    /// port is not a number.
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let (use_https, rest) = if let Some(rest) = url.strip_prefix("https://") {
            (true, rest)
        } else {
            (false, url.strip_prefix("http://").unwrap_or(url))
        };
        let authority = rest.trim_end_matches('/');

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| TransportError::InvalidAddress(format!("Invalid port: {port}")))?;
                (host, port)
            }
            None if use_https => (authority, Self::DEFAULT_HTTPS_PORT),
            None => (authority, Self::DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(TransportError::InvalidAddress(format!(
                "Missing host in {url}"
            )));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            use_https,
            token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the session token sent as a bearer credential.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the session token if set.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an [`ApiClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<ApiClient, TransportError> {
        let base_url = self.base_url();

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(TransportError::Http)?;

        Ok(ApiClient {
            base_url,
            client,
            token: self.token,
        })
    }
}

// ============================================================================
// ApiClient
// ============================================================================

/// JSON client for the REST API.
///
/// Every response body is decoded as JSON. Application errors travel inside
/// successful responses (`{ "Error": ... }`), so interpreting the body is left
/// to the caller; this client only fails on transport problems, non-success
/// status codes and undecodable bodies.
///
/// # Examples
///
/// ```no_run
/// use zonesync_lib::protocol::HttpConfig;
///
/// # async fn example() -> zonesync_lib::Result<()> {
/// let api = HttpConfig::new("192.168.1.100").into_client()?;
/// let body = api.get_json("/api/zone").await?;
/// println!("{body}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Option<String>,
}

impl ApiClient {
    /// Returns the base URL of the API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL for an API path.
    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on network or status failures and
    /// [`Error::Parse`] if the body is not JSON.
    pub async fn get_json(&self, path: &str) -> Result<Value, Error> {
        let url = self.build_url(path);
        self.send("GET", &url, self.client.get(&url)).await
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, Error> {
        let url = self.build_url(path);
        self.send("POST", &url, self.client.post(&url).json(body))
            .await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, Error> {
        let url = self.build_url(path);
        self.send("PUT", &url, self.client.put(&url).json(body)).await
    }

    /// Sends a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn delete_json(&self, path: &str) -> Result<Value, Error> {
        let url = self.build_url(path);
        self.send("DELETE", &url, self.client.delete(&url)).await
    }

    async fn send(&self, method: &str, url: &str, request: RequestBuilder) -> Result<Value, Error> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        tracing::debug!(method, url = %url, "Sending HTTP request");

        let response = request.send().await.map_err(TransportError::Http)?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized.into());
        }

        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                reason: response
                    .status()
                    .canonical_reason()
                    .unwrap_or("Unknown")
                    .to_string(),
            }
            .into());
        }

        let body = response.text().await.map_err(TransportError::Http)?;

        tracing::debug!(method, body = %body, "Received HTTP response");

        serde_json::from_str(&body).map_err(|e| ParseError::Json(e).into())
    }
}
