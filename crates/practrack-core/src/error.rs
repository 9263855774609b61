// ── Core error types ──
//
// User-facing errors from practrack-core. Consumers never match on HTTP
// details directly; the `From<practrack_api::Error>` impl translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not connected to the server")]
    ControllerDisconnected,

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Client-side validation ───────────────────────────────────────
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Problem-JSON error key, e.g. `idexists`.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attach the entity name and id to a bare 404 coming back from the API.
    pub(crate) fn with_target(self, entity_type: &str, id: impl ToString) -> Self {
        match self {
            Self::NotFound { .. } => Self::NotFound {
                entity_type: entity_type.to_owned(),
                identifier: id.to_string(),
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<practrack_api::Error> for CoreError {
    fn from(err: practrack_api::Error) -> Self {
        if err.is_not_found() {
            return Self::NotFound {
                entity_type: "resource".into(),
                identifier: String::new(),
            };
        }

        match err {
            practrack_api::Error::Authentication { message } => {
                Self::AuthenticationFailed { message }
            }
            practrack_api::Error::Forbidden { message } => Self::Api {
                message,
                code: Some("forbidden".into()),
                status: Some(403),
            },
            practrack_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    Self::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    Self::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    Self::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            practrack_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            practrack_api::Error::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            practrack_api::Error::Api {
                status,
                message,
                error_key,
            } => Self::Api {
                message,
                code: error_key,
                status: Some(status),
            },
            practrack_api::Error::MissingId { entity } => {
                Self::validation("id", format!("{entity} has no id"))
            }
            practrack_api::Error::Deserialization { message, body: _ } => {
                Self::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_404_becomes_not_found_with_target() {
        let api = practrack_api::Error::Api {
            status: 404,
            message: "Not Found".into(),
            error_key: Some("http.404".into()),
        };
        let err = CoreError::from(api).with_target("Practice", 12);
        assert_eq!(err.to_string(), "Practice not found: 12");
    }

    #[test]
    fn api_rejection_keeps_error_key() {
        let api = practrack_api::Error::Api {
            status: 400,
            message: "A new practice cannot already have an ID".into(),
            error_key: Some("idexists".into()),
        };
        match CoreError::from(api) {
            CoreError::Api { code, status, .. } => {
                assert_eq!(code.as_deref(), Some("idexists"));
                assert_eq!(status, Some(400));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
