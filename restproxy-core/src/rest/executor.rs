//! # Request Executor
//!
//! Executes a [`RequestDescriptor`] through a [`Session`].
//!
//! ## How it works
//!
//! 1. The verb is checked first: `GET`/`DELETE` must not carry a body and `HEAD`/`OPTIONS` are
//!    not supported. These are configuration errors raised before any I/O.
//! 2. The request is sent with `Accept: application/json`, the session headers and the merged
//!    cookie jar as `Cookie`. Bodies go out as `application/json`.
//! 3. `Set-Cookie` headers of the response are merged into the jar, whatever the status.
//! 4. The status is mapped: `404` is always "not found", other non-2xx statuses carry the body
//!    as message.
//! 5. On `401`, if the session has a re-authentication callback, the callback runs once and the
//!    same request is sent exactly once more. Whatever the retry yields is final.
use super::RequestDescriptor;
use super::session::Session;
use crate::contract::HttpVerb;
use crate::error::{ConfigurationError, ProxyError, RemoteCallError};
use http::header::{CONTENT_TYPE, COOKIE, HeaderValue};
use http::{Method, StatusCode};
use url::Url;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Sends requests through one session.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    session: Session,
}

impl RequestExecutor {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Executes `request`, re-authenticating and retrying once on `401`.
    ///
    /// # Returns
    ///
    /// * `Ok(Response)` - A 2xx response; its body has not been read.
    /// * `Err(ProxyError::Configuration)` - The request cannot be sent as described.
    /// * `Err(ProxyError::Remote)` - Transport failure or non-2xx status.
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> Result<reqwest::Response, ProxyError> {
        let method = method_for(request)?;
        let url = self.session.url_for(&request.uri)?;
        let body = request.body.as_deref();

        match self.send(method.clone(), url.clone(), body).await {
            Err(err) if err.status == Some(StatusCode::UNAUTHORIZED) => {
                let Some(reauthenticate) = self.session.reauthenticator() else {
                    return Err(err.into());
                };

                tracing::warn!(%method, %url, "request unauthorized, re-authenticating once");

                reauthenticate(self.session.clone()).await.map_err(|source| {
                    RemoteCallError::new(Some(StatusCode::UNAUTHORIZED), "Re-authentication failed")
                        .with_source(source)
                })?;

                Ok(self.send(method, url, body).await?)
            }
            result => Ok(result?),
        }
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&str>,
    ) -> Result<reqwest::Response, RemoteCallError> {
        tracing::debug!(%method, %url, has_body = body.is_some(), "sending request");

        let mut builder = self
            .session
            .client()
            .request(method.clone(), url.clone())
            .headers(self.session.headers());

        if let Some(cookies) = self.session.cookie_header() {
            builder = builder.header(COOKIE, cookies);
        }

        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
                .body(body.to_owned());
        }

        let response = builder.send().await.map_err(|err| {
            tracing::debug!(%method, %url, error = %err, "request failed before a response");
            RemoteCallError::transport(err)
        })?;

        self.session.merge_set_cookies(response.headers());

        let status = response.status();
        tracing::debug!(%method, %url, %status, "received response");

        if status == StatusCode::NOT_FOUND {
            return Err(RemoteCallError::not_found());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteCallError::from_status(status, &body));
        }

        Ok(response)
    }
}

/// Maps the declared verb to an HTTP method, rejecting unsupported verbs and forbidden bodies.
fn method_for(request: &RequestDescriptor) -> Result<Method, ConfigurationError> {
    let method = match request.verb {
        HttpVerb::Get => Method::GET,
        HttpVerb::Post => Method::POST,
        HttpVerb::Put => Method::PUT,
        HttpVerb::Patch => Method::PATCH,
        HttpVerb::Delete => Method::DELETE,
        verb @ (HttpVerb::Head | HttpVerb::Options) => {
            return Err(ConfigurationError::UnsupportedVerb(verb));
        }
    };

    if request.body.is_some() && !request.verb.allows_body() {
        return Err(ConfigurationError::BodyNotAllowed(request.verb));
    }

    Ok(method)
}
