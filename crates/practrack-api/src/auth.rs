use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Credentials for talking to the API.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    /// Anonymous access (development servers with security disabled).
    #[default]
    None,

    /// A JWT obtained earlier, sent as `Authorization: Bearer`.
    Token(SecretString),

    /// Username and password exchanged for a JWT at `/api/authenticate`.
    Login {
        username: String,
        password: SecretString,
        remember_me: bool,
    },
}

/// Body of `POST /api/authenticate`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

impl<'a> LoginRequest<'a> {
    pub(crate) fn new(username: &'a str, password: &'a SecretString, remember_me: bool) -> Self {
        Self {
            username,
            password: password.expose_secret(),
            remember_me,
        }
    }
}

/// Response of `POST /api/authenticate`.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub id_token: String,
}
