// ── Runtime connection configuration ──
//
// Describes *how* to reach the REST server. Carries credentials and
// connection tuning but never touches disk; the CLI/TUI build a
// `ControllerConfig` from their profile and hand it in.

use std::path::PathBuf;
use std::time::Duration;

use practrack_api::Credentials;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single server.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Server root, e.g. `http://localhost:8080`. `/api/` is appended.
    pub url: Url,
    /// How requests are authenticated.
    pub auth: Credentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            auth: Credentials::None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_auth(mut self, auth: Credentials) -> Self {
        self.auth = auth;
        self
    }
}
