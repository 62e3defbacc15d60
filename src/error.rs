// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `ZoneSync` library.
//!
//! Failures at the server boundary fall into two families:
//!
//! - [`RemoteError`]: the server answered, but with a structured `{ "Error": ... }` body
//! - [`TransportError`]: the request never produced a usable answer
//!
//! A user declining a confirmation prompt is not an error; see
//! [`DeleteOutcome`](crate::service::DeleteOutcome).

use std::fmt;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The server rejected the operation with a structured error.
    #[error("remote operation failed: {0}")]
    RemoteOperation(#[from] RemoteError),

    /// The request failed at the HTTP or push-channel layer.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A response could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Returns `true` if the server reported an application-level error.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteOperation(_))
    }

    /// Returns `true` if the failure happened below the application layer.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// The resource operation that produced a [`RemoteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Listing a collection.
    List,
    /// Creating a resource.
    Create,
    /// Updating a resource.
    Update,
    /// Deleting a resource.
    Delete,
    /// A read response pushed by the server.
    Push,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// Application-level error reported by the server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} {operation} rejected by server: {detail}")]
pub struct RemoteError {
    /// Resource kind, e.g. `"zone"`.
    pub kind: &'static str,
    /// The operation that was rejected.
    pub operation: Operation,
    /// The server error, serialized as JSON.
    pub detail: String,
}

/// Errors raised below the application layer (HTTP or push channel).
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// The server refused the session token.
    #[error("authentication failed")]
    Unauthorized,

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// The push channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to decoding server payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display() {
        let err = RemoteError {
            kind: "zone",
            operation: Operation::List,
            detail: "\"db down\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "zone list rejected by server: \"db down\""
        );
    }

    #[test]
    fn pushed_error_display() {
        let err = RemoteError {
            kind: "zone",
            operation: Operation::Push,
            detail: "\"db down\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "zone push rejected by server: \"db down\""
        );
    }

    #[test]
    fn error_from_remote_error() {
        let err: Error = RemoteError {
            kind: "device",
            operation: Operation::Delete,
            detail: "{}".to_string(),
        }
        .into();
        assert!(err.is_remote());
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_status_display() {
        let err = TransportError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503 - Service Unavailable");
        assert!(Error::from(err).is_transport());
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("Zones".to_string());
        assert_eq!(err.to_string(), "missing field in response: Zones");
    }
}
