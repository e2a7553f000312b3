//! Error types for the VMS HTTP client.

use thiserror::Error;

use crate::deploy::StateParseError;

/// Errors raised while talking to the VMS API.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClientError {
    /// Raised when the request never produced an HTTP response.
    #[error("transport error: {message}")]
    Transport {
        /// Message returned by the HTTP stack.
        message: String,
    },
    /// Raised when the API answers with anything other than `200 OK`.
    #[error("remote request failed: {text}")]
    Remote {
        /// Numeric HTTP status code.
        status: u16,
        /// Status line as reported by the server (for example `404 Not Found`).
        text: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("malformed response: {message}")]
    Parse {
        /// Decoder error message.
        message: String,
    },
    /// Raised when a request body cannot be encoded.
    #[error("failed to encode request: {message}")]
    Encode {
        /// Encoder error message.
        message: String,
    },
    /// Raised when a catalog path names an object that is not an app.
    #[error("object '{path}' is type '{kind}'")]
    NotAnApp {
        /// Application path requested by the caller.
        path: String,
        /// Object type reported by the catalog.
        kind: String,
    },
    /// Raised when a version or tag cannot be resolved to a version id.
    #[error("app version does not exist: '{version}' for app '{app}'")]
    VersionNotFound {
        /// Application path requested by the caller.
        app: String,
        /// Requested version id or tag; empty means "latest".
        version: String,
    },
    /// Raised when a downloaded artifact cannot be written locally.
    #[error("failed to write {path}: {message}")]
    Io {
        /// Destination path.
        path: String,
        /// Human-readable error message.
        message: String,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return Self::Parse {
                message: value.to_string(),
            };
        }
        Self::Transport {
            message: value.to_string(),
        }
    }
}

impl From<StateParseError> for ClientError {
    fn from(value: StateParseError) -> Self {
        Self::Parse {
            message: value.to_string(),
        }
    }
}
