//! # REST Transport
//!
//! This module contains the low-level building blocks that talk HTTP on behalf of the proxies.
//!
//! Unlike the dispatcher, the components here know nothing about contracts or return shapes:
//! they take a [`RequestDescriptor`] (verb, relative URI, optional JSON body) and hand back the
//! raw `reqwest::Response`, or a typed error.
//!
//! * **[`config`]**: serializable session settings (base URI, timeout, TLS trust).
//! * **[`session`]**: the long-lived, shareable session and its builder.
//! * **[`cookies`]**: the cookie jar merged from `Set-Cookie` headers.
//! * **[`executor`]**: request execution, status mapping and the re-authentication retry.
pub mod config;
pub mod cookies;
pub mod executor;
pub mod session;

pub use config::{SessionConfig, TlsTrust};
pub use executor::RequestExecutor;
pub use session::{ReauthCallback, Session, SessionBuilder};

use crate::contract::HttpVerb;

/// A fully resolved request, ready to be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub verb: HttpVerb,
    /// Path and query, relative to the session's base URI.
    pub uri: String,
    /// Serialized JSON body.
    pub body: Option<String>,
}
