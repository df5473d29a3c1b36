use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout, matching common HTTP client defaults.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// How server certificates are checked on HTTPS connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsTrust {
    /// Certificates must chain to a trusted root.
    #[default]
    Strict,
    /// Any certificate is accepted. Only meant for development servers.
    AcceptAnyCertificate,
}

/// Settings of a session, loadable from JSON.
///
/// ```json
/// { "base_uri": "https://localhost:5001/", "timeout_secs": 30, "tls": "accept_any_certificate" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub base_uri: String,
    #[serde(
        rename = "timeout_secs",
        with = "seconds",
        default = "default_timeout"
    )]
    pub timeout: Duration,
    #[serde(default)]
    pub tls: TlsTrust,
}

impl SessionConfig {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            timeout: DEFAULT_TIMEOUT,
            tls: TlsTrust::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsTrust) -> Self {
        self.tls = tls;
        self
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
