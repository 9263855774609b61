//! CLI configuration: `practrack_config` plus `GlobalOpts` overrides
//! (`--url`, `--token`, `--insecure`, `--timeout`).

use std::time::Duration;

use secrecy::SecretString;

use practrack_core::{ControllerConfig, Credentials, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use practrack_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build the `ControllerConfig` for this invocation: the active profile
/// when one exists, otherwise flags and env vars alone.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // An explicitly requested profile must exist.
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;

    let auth = global
        .token
        .as_ref()
        .map_or(Credentials::None, |t| {
            Credentials::Token(SecretString::from(t.clone()))
        });

    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ControllerConfig {
        url: parse_url(url_str)?,
        auth,
        tls,
        timeout: Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout)),
    })
}

/// Translate a `Profile` plus global flags into a `ControllerConfig`.
/// Flags win over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    let url = parse_url(global.url.as_deref().unwrap_or(&profile.url))?;

    let auth = match global.token {
        Some(ref token) => Credentials::Token(SecretString::from(token.clone())),
        None => practrack_config::resolve_auth(profile, profile_name)?,
    };

    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        practrack_config::profile_tls(profile, defaults)
    };

    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(defaults.timeout);

    Ok(ControllerConfig {
        url,
        auth,
        tls,
        timeout: Duration::from_secs(timeout),
    })
}

pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

fn parse_url(raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
