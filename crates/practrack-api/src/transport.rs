//! HTTP client construction.
//!
//! Both the login client and the authenticated client are built here so
//! they agree on certificates, timeouts and the user agent.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::Error;

const USER_AGENT: &str = concat!("practrack/", env!("CARGO_PKG_VERSION"));

/// How server certificates are checked.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Platform trust roots.
    #[default]
    System,
    /// Additionally trust the PEM-encoded CA at this path.
    CustomCa(PathBuf),
    /// Skip verification entirely. Local dev servers only.
    DangerAcceptInvalid,
}

/// Settings every client built by this crate has in common.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Same as [`build_client`](Self::build_client), but every request also
    /// carries `headers` (the bearer token, once logged in).
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("cannot read CA bundle {}: {e}", path.display()))
                })?;
                let ca = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Tls(format!("CA bundle is not valid PEM: {e}")))?;
                builder = builder.add_root_certificate(ca);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Whole seconds, as shown in timeout errors.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}
