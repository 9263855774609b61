//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use practrack_config::ConfigError;
use practrack_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(practrack::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             URL: {url}\n\
             Use --insecure (-k) for self-signed certificates."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(practrack::auth_failed),
        help(
            "Verify your credentials.\n\
             Run: practrack config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(practrack::no_credentials),
        help(
            "Configure credentials with: practrack config init\n\
             Or pass --token / set PRACTRACK_TOKEN."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} {identifier} not found")]
    #[diagnostic(
        code(practrack::not_found),
        help("Run: practrack {list_command} to see existing records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server rejected the request ({code}): {message}")]
    #[diagnostic(code(practrack::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(practrack::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(practrack::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: practrack config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(practrack::no_config),
        help(
            "Create a profile with: practrack config init\n\
             Or pass --url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(practrack::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(practrack::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(practrack::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(practrack::render))]
    Render(String),

    #[error("{0}")]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError ─────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::ControllerDisconnected => Self::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "not connected to the server".into(),
            },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                list_command: list_command(&entity_type),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Validation { field, message } => Self::Validation {
                field,
                reason: message,
            },

            CoreError::Api {
                message,
                code,
                status,
            } => Self::ApiError {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "error".into()),
                message,
            },

            CoreError::Config { message } => Self::Config { message },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

fn list_command(entity_type: &str) -> String {
    if entity_type.eq_ignore_ascii_case("practice") {
        "practices list".into()
    } else {
        "sessions list".into()
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(see: practrack config profiles)".into(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_points_at_matching_list_command() {
        let err = CliError::from(CoreError::NotFound {
            entity_type: "Practice".into(),
            identifier: "7".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(err, CliError::NotFound { ref list_command, .. } if list_command == "practices list"));
    }

    #[test]
    fn api_error_falls_back_to_status_code() {
        let err = CliError::from(CoreError::Api {
            message: "boom".into(),
            code: None,
            status: Some(500),
        });
        assert!(matches!(err, CliError::ApiError { ref code, .. } if code == "500"));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn validation_is_a_usage_error() {
        let err = CliError::from(CoreError::Validation {
            field: "Problem Name".into(),
            message: "This field is required.".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
