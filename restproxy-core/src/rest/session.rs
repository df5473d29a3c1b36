//! # Session
//!
//! A [`Session`] is the long-lived HTTP state shared by every proxy created for one base URI:
//! the underlying `reqwest::Client`, the cookie jar, extra request headers and the optional
//! re-authentication callback.
//!
//! Sessions are cheap handles: cloning one shares the same state. The cookie jar and the headers
//! sit behind their own locks, which are never held across an `.await`, so concurrent calls
//! observe every merge atomically.
use super::config::{SessionConfig, TlsTrust};
use super::cookies::CookieJar;
use crate::BoxError;
use crate::error::ConfigurationError;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use http::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, SET_COOKIE};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Routine invoked once after a `401`, before the single retry.
///
/// It receives the session so it can refresh cookies or credential headers.
pub type ReauthCallback =
    Arc<dyn Fn(Session) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    base_uri: Url,
    timeout: Duration,
    tls: TlsTrust,
    client: reqwest::Client,
    cookies: Mutex<CookieJar>,
    headers: RwLock<HeaderMap>,
    reauthenticate: Option<ReauthCallback>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_uri", &self.inner.base_uri.as_str())
            .field("timeout", &self.inner.timeout)
            .field("tls", &self.inner.tls)
            .field("cookies", &self.inner.cookies.lock().len())
            .field("reauthenticate", &self.inner.reauthenticate.is_some())
            .finish()
    }
}

impl Session {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn base_uri(&self) -> &Url {
        &self.inner.base_uri
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn tls(&self) -> TlsTrust {
        self.inner.tls
    }

    /// A snapshot of the cookie jar.
    pub fn cookies(&self) -> CookieJar {
        self.inner.cookies.lock().clone()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.inner.cookies.lock().get(name).map(str::to_owned)
    }

    pub fn set_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.cookies.lock().set(name, value);
    }

    pub fn remove_cookie(&self, name: &str) -> Option<String> {
        self.inner.cookies.lock().remove(name)
    }

    pub fn clear_cookies(&self) {
        self.inner.cookies.lock().clear();
    }

    /// Sets a header sent with every subsequent request, e.g. `Authorization`.
    pub fn set_header(&self, name: &str, value: &str) -> Result<(), ConfigurationError> {
        let (name, value) = parse_header(name, value)?;
        self.inner.headers.write().insert(name, value);
        Ok(())
    }

    pub fn remove_header(&self, name: &str) {
        self.inner.headers.write().remove(name);
    }

    pub fn has_reauthentication(&self) -> bool {
        self.inner.reauthenticate.is_some()
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    pub(crate) fn reauthenticator(&self) -> Option<ReauthCallback> {
        self.inner.reauthenticate.clone()
    }

    pub(crate) fn headers(&self) -> HeaderMap {
        self.inner.headers.read().clone()
    }

    pub(crate) fn cookie_header(&self) -> Option<String> {
        self.inner.cookies.lock().header_value()
    }

    /// Joins a relative URI onto the base URI.
    pub(crate) fn url_for(&self, uri: &str) -> Result<Url, ConfigurationError> {
        self.inner
            .base_uri
            .join(uri)
            .map_err(|source| ConfigurationError::InvalidUri {
                uri: uri.to_string(),
                source,
            })
    }

    /// Merges the `Set-Cookie` headers of a response into the jar under a single lock.
    pub(crate) fn merge_set_cookies(&self, headers: &HeaderMap) {
        let values: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();

        if values.is_empty() {
            return;
        }

        let merged = self.inner.cookies.lock().merge_set_cookies(values);
        tracing::debug!(merged, "merged response cookies into the session");
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: SessionConfig,
    headers: Vec<(String, String)>,
    reauthenticate: Option<ReauthCallback>,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            headers: Vec::new(),
            reauthenticate: None,
        }
    }

    /// Adds a header sent with every request of the session.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Registers the routine run once after a `401` before the request is retried.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use restproxy_core::{BoxError, Session, SessionConfig};
    ///
    /// let session = Session::builder(SessionConfig::new("https://api.example.com/"))
    ///     .with_reauthentication(|session: Session| async move {
    ///         session.set_header("authorization", "Bearer refreshed")?;
    ///         Ok::<(), BoxError>(())
    ///     })
    ///     .build()
    ///     .expect("valid session");
    /// ```
    pub fn with_reauthentication<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(Session) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let reauthenticate: ReauthCallback =
            Arc::new(move |session: Session| -> BoxFuture<'static, Result<(), BoxError>> {
                callback(session).boxed()
            });
        self.reauthenticate = Some(reauthenticate);
        self
    }

    /// Builds the session and its HTTP client.
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - The ready session.
    /// * `Err(ConfigurationError)` - If the base URI is empty or invalid, a header is invalid,
    ///   or the client cannot be built.
    pub fn build(self) -> Result<Session, ConfigurationError> {
        let SessionConfig {
            base_uri,
            timeout,
            tls,
        } = self.config;

        if base_uri.trim().is_empty() {
            return Err(ConfigurationError::EmptyBaseUri);
        }

        let base_uri = Url::parse(&base_uri).map_err(|source| ConfigurationError::InvalidUri {
            uri: base_uri.clone(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let (name, value) = parse_header(name, value)?;
            headers.insert(name, value);
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .danger_accept_invalid_certs(tls == TlsTrust::AcceptAnyCertificate)
            .build()
            .map_err(ConfigurationError::ClientBuild)?;

        if tls == TlsTrust::AcceptAnyCertificate {
            tracing::warn!(base_uri = %base_uri, "session accepts any TLS certificate");
        }

        Ok(Session {
            inner: Arc::new(SessionInner {
                base_uri,
                timeout,
                tls,
                client,
                cookies: Mutex::new(CookieJar::new()),
                headers: RwLock::new(headers),
                reauthenticate: self.reauthenticate,
            }),
        })
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigurationError> {
    let invalid = || ConfigurationError::InvalidHeader {
        name: name.to_string(),
    };
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_uri_is_rejected() {
        let err = Session::builder(SessionConfig::new("  ")).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyBaseUri));
    }

    #[test]
    fn relative_base_uri_is_rejected() {
        let err = Session::builder(SessionConfig::new("api/v1"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidUri { .. }));
    }

    #[test]
    fn relative_uris_are_joined_onto_the_base() {
        let session = Session::builder(SessionConfig::new("http://localhost:8080/base/"))
            .build()
            .unwrap();

        assert_eq!(
            session.url_for("api/users/1?full=true").unwrap().as_str(),
            "http://localhost:8080/base/api/users/1?full=true"
        );
        assert_eq!(
            session.url_for("/health").unwrap().as_str(),
            "http://localhost:8080/health"
        );
    }

    #[test]
    fn clones_share_cookies_and_headers() {
        let session = Session::builder(SessionConfig::new("http://localhost/"))
            .header("x-tenant", "acme")
            .build()
            .unwrap();
        let clone = session.clone();

        clone.set_cookie("sid", "1");
        clone.set_header("authorization", "Bearer t").unwrap();

        assert_eq!(session.cookie("sid").as_deref(), Some("1"));
        let headers = session.headers();
        assert_eq!(headers["x-tenant"], "acme");
        assert_eq!(headers["authorization"], "Bearer t");
    }

    #[test]
    fn invalid_header_is_a_configuration_error() {
        let session = Session::builder(SessionConfig::new("http://localhost/"))
            .build()
            .unwrap();

        assert!(matches!(
            session.set_header("bad header", "x"),
            Err(ConfigurationError::InvalidHeader { .. })
        ));
    }
}
