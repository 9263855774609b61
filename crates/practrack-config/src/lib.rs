//! Shared configuration for the practrack CLI and TUI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `practrack_core::ControllerConfig`. The CLI layers
//! its flag overrides on top of this.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use practrack_core::{ControllerConfig, Credentials, TlsVerification};

/// Keyring service name for stored secrets.
pub const KEYRING_SERVICE: &str = "practrack";

/// Prefix for environment overrides (`PRACTRACK_DEFAULT_PROFILE`, ...).
pub const ENV_PREFIX: &str = "PRACTRACK_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Keyed by profile name.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then `default_profile`,
    /// then `"default"`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named server profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Server root URL, e.g. `http://localhost:8080`.
    pub url: String,

    /// `none`, `token` or `login`.
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// JWT (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable holding the JWT.
    pub token_env: Option<String>,

    /// Username for `login` auth.
    pub username: Option<String>,

    /// Password for `login` auth (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Ask the server for a long-lived token on login.
    #[serde(default)]
    pub remember_me: bool,

    /// PEM bundle trusted in addition to the system roots.
    pub ca_cert: Option<PathBuf>,

    /// Overrides `defaults.insecure`.
    pub insecure: Option<bool>,

    /// Overrides `defaults.timeout`, in seconds.
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_mode: default_auth_mode(),
            token: None,
            token_env: None,
            username: None,
            password: None,
            remember_me: false,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_auth_mode() -> String {
    "none".into()
}

// ── Files ──────────────────────────────────────────────────────────

/// `config.toml` under the platform config directory.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "practrack", "practrack").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("practrack");
    p
}

/// Reads [`config_path`], with `PRACTRACK_*` variables layered on top.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

/// Like [`load_config`], falling back to [`Config::default`] on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Writes `cfg` back to [`config_path`], creating parent directories.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str, what: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{what}"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

fn keyring_secret(profile_name: &str, what: &str) -> Option<SecretString> {
    keyring_entry(profile_name, what)
        .ok()?
        .get_password()
        .ok()
        .map(SecretString::from)
}

/// Store a JWT for `profile_name` in the system keyring.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "token")?
        .set_password(token.expose_secret())
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Store a `login` password for `profile_name` in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name, "password")?
        .set_password(password.expose_secret())
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Finds the JWT for a profile. The variable named by `token_env` is tried
/// first, then the keyring, then the plaintext `token` field.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_token_with(profile, profile_name, |name| std::env::var(name).ok())
}

/// [`resolve_token`] with an injectable environment lookup.
pub fn resolve_token_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    profile
        .token_env
        .as_deref()
        .and_then(&env)
        .map(SecretString::from)
        .or_else(|| keyring_secret(profile_name, "token"))
        .or_else(|| profile.token.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Username and password for `login` auth. The password comes from
/// `PRACTRACK_PASSWORD`, the keyring or the config file, in that order.
pub fn resolve_login(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    resolve_login_with(profile, profile_name, |name| std::env::var(name).ok())
}

/// [`resolve_login`] with an injectable environment lookup.
pub fn resolve_login_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(String, SecretString), ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| env("PRACTRACK_USERNAME"))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    let password = env("PRACTRACK_PASSWORD")
        .map(SecretString::from)
        .or_else(|| keyring_secret(profile_name, "password"))
        .or_else(|| profile.password.clone().map(SecretString::from))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    Ok((username, password))
}

/// Resolve `Credentials` from a profile's `auth_mode` field.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<Credentials, ConfigError> {
    match profile.auth_mode.as_str() {
        "none" => Ok(Credentials::None),
        "token" => Ok(Credentials::Token(resolve_token(profile, profile_name)?)),
        "login" => {
            let (username, password) = resolve_login(profile, profile_name)?;
            Ok(Credentials::Login {
                username,
                password,
                remember_me: profile.remember_me,
            })
        }
        other => Err(ConfigError::Validation {
            field: "auth_mode".into(),
            reason: format!("expected 'none', 'token', or 'login', got '{other}'"),
        }),
    }
}

/// TLS strategy for a profile: `insecure` wins, then a custom CA, then
/// the system store.
pub fn profile_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Turns a stored profile into a [`ControllerConfig`]. Command-line
/// overrides are applied by the caller afterwards.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let auth = resolve_auth(profile, profile_name)?;
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ControllerConfig {
        url,
        auth,
        tls: profile_tls(profile, defaults),
        timeout,
    })
}
