//! # Errors
//!
//! Two families of failures can come out of a proxied call:
//!
//! - **[`ConfigurationError`]**: the contract, the arguments or the session setup are wrong.
//!   These are detected before any network I/O, are never retried and are never swallowed.
//! - **[`RemoteCallError`]**: the call reached (or tried to reach) the server and failed:
//!   transport errors, `404`, any other non-2xx status, a failed re-authentication or a payload
//!   that does not match the declared type.
//!
//! [`ProxyError`] is the union returned by [`crate::RestProxy::invoke`].
use crate::BoxError;
use crate::contract::HttpVerb;
use http::StatusCode;

/// The contract, the call arguments or the session configuration are invalid.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("'{contract}' is not a valid service contract: {reason}")]
    InvalidContract { contract: String, reason: String },

    #[error("Operation '{operation}' of '{contract}' is invalid: {reason}")]
    InvalidOperation {
        contract: String,
        operation: String,
        reason: String,
    },

    #[error("Operation '{operation}' not found in '{contract}'")]
    UnknownOperation { contract: String, operation: String },

    #[error("Operation '{operation}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        operation: String,
        expected: usize,
        actual: usize,
    },

    #[error("Operation '{0}' has no route template and its contract declares none")]
    MissingRoute(String),

    #[error("Route placeholder '{{{placeholder}}}' of operation '{operation}' has no matching route parameter")]
    UnmatchedPlaceholder {
        operation: String,
        placeholder: String,
    },

    #[error("Route template '{0}' has a '{{' without a matching '}}'")]
    UnterminatedPlaceholder(String),

    #[error("HTTP verb {0} is not supported")]
    UnsupportedVerb(HttpVerb),

    #[error("HTTP verb {0} does not accept a request body")]
    BodyNotAllowed(HttpVerb),

    #[error("Failed to serialize argument: '{0}'")]
    Serialize(#[from] serde_json::Error),

    #[error("Base uri cannot be empty")]
    EmptyBaseUri,

    #[error("Invalid uri '{uri}': '{source}'")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header '{name}'")]
    InvalidHeader { name: String },

    #[error("Failed to build the HTTP client: '{0}'")]
    ClientBuild(#[source] reqwest::Error),
}

/// A remote call failed.
///
/// `status` is absent when no HTTP response was obtained (connection refused, DNS, timeout).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct RemoteCallError {
    pub status: Option<StatusCode>,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

pub(crate) const NOT_FOUND_MESSAGE: &str = "The requested resource could not be found";
pub(crate) const GENERIC_FAILURE_MESSAGE: &str = "Error while processing the request";

impl RemoteCallError {
    pub fn new(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// A failure that happened before any response was received.
    pub fn transport(source: impl Into<BoxError>) -> Self {
        Self::new(None, GENERIC_FAILURE_MESSAGE).with_source(source)
    }

    pub fn not_found() -> Self {
        Self::new(Some(StatusCode::NOT_FOUND), NOT_FOUND_MESSAGE)
    }

    /// Builds the error for a non-2xx response from its status and raw body.
    ///
    /// The body becomes the message unless nothing but quotes and whitespace is left once
    /// the quotes are removed.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if body.replace('"', "").trim().is_empty() {
            Self::new(Some(status), GENERIC_FAILURE_MESSAGE)
        } else {
            Self::new(Some(status), body)
        }
    }

    pub fn is_transport(&self) -> bool {
        self.status.is_none()
    }
}

/// Any failure of a proxied call.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Remote(#[from] RemoteCallError),
}

impl ProxyError {
    /// The HTTP status of the failed call, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ProxyError::Remote(err) => err.status,
            ProxyError::Configuration(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ProxyError::Configuration(_))
    }
}
