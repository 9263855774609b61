//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use secrecy::{ExposeSecret, SecretString};

use practrack_core::{Controller, ControllerConfig, TlsVerification};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const AUTH_MODES: &[&str] = &["none", "token", "login"];

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
    }
    cfg
}

fn secret_prompt(label: &str) -> Result<SecretString, CliError> {
    let value = rpassword::prompt_password(format!("{label}: ")).map_err(CliError::Io)?;
    if value.is_empty() {
        return Err(CliError::Validation {
            field: label.to_lowercase(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(SecretString::from(value))
}

/// Ask where a secret should live. `true` means the keyring.
fn prefer_keyring(what: &str) -> Result<bool, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {what}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    Ok(selection == 0)
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    CliError::ProfileNotFound {
        name,
        available: config::available_profiles(cfg),
    }
}

fn parse_flag<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            let mut cfg = config::load_config_or_default();

            eprintln!("practrack setup\n");

            let url: String = Input::new()
                .with_prompt("Server URL")
                .default("http://localhost:8080".into())
                .interact_text()
                .map_err(prompt_err)?;
            url.parse::<url::Url>().map_err(|_| CliError::Validation {
                field: "url".into(),
                reason: format!("invalid URL: {url}"),
            })?;

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let mode = Select::new()
                .with_prompt("Authentication")
                .items(&[
                    "None (security disabled)",
                    "Token (paste a JWT)",
                    "Login (username + password)",
                ])
                .default(2)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(url);
            profile.auth_mode = AUTH_MODES.get(mode).copied().unwrap_or("none").into();

            match profile.auth_mode.as_str() {
                "token" => {
                    let token = secret_prompt("Token")?;
                    if prefer_keyring("token")? {
                        practrack_config::store_token(&profile_name, &token)?;
                        eprintln!("   ✓ token stored in system keyring");
                    } else {
                        profile.token = Some(token.expose_secret().to_owned());
                    }
                }
                "login" => {
                    let username: String = Input::new()
                        .with_prompt("Username")
                        .interact_text()
                        .map_err(prompt_err)?;
                    let password = secret_prompt("Password")?;
                    profile.username = Some(username);
                    profile.remember_me = Confirm::new()
                        .with_prompt("Ask the server for a long-lived token?")
                        .default(false)
                        .interact()
                        .map_err(prompt_err)?;
                    if prefer_keyring("password")? {
                        practrack_config::store_password(&profile_name, &password)?;
                        eprintln!("   ✓ password stored in system keyring");
                    } else {
                        profile.password = Some(password.expose_secret().to_owned());
                    }
                }
                _ => {}
            }

            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.profiles.len() == 1 || cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Test it: practrack sessions list --profile {profile_name}");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_default(),
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));

            match key.as_str() {
                "url" => {
                    value.parse::<url::Url>().map_err(|_| CliError::Validation {
                        field: "url".into(),
                        reason: format!("invalid URL: {value}"),
                    })?;
                    profile.url = value;
                }
                "auth_mode" | "auth-mode" => {
                    if !AUTH_MODES.contains(&value.as_str()) {
                        return Err(CliError::Validation {
                            field: "auth_mode".into(),
                            reason: "must be 'none', 'token', or 'login'".into(),
                        });
                    }
                    profile.auth_mode = value;
                }
                "token_env" | "token-env" => profile.token_env = Some(value),
                "username" => profile.username = Some(value),
                "remember_me" | "remember-me" => {
                    profile.remember_me = parse_flag(&key, &value, "'true' or 'false'")?;
                }
                "insecure" => {
                    profile.insecure = Some(parse_flag(&key, &value, "'true' or 'false'")?);
                }
                "timeout" => {
                    profile.timeout = Some(parse_flag(&key, &value, "a number (seconds)")?);
                }
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: url, auth_mode, \
                             token_env, username, remember_me, insecure, timeout, ca_cert"
                        ),
                    });
                }
            }

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let Some(prof) = cfg.profiles.get(&profile_name).cloned() else {
                return Err(profile_not_found(&cfg, profile_name));
            };

            let token = if prof.auth_mode == "login" {
                let username = prof.username.clone().ok_or_else(|| CliError::NoCredentials {
                    profile: profile_name.clone(),
                })?;
                let password = secret_prompt("Password")?;
                let url = prof.url.parse().map_err(|_| CliError::Validation {
                    field: "url".into(),
                    reason: format!("invalid URL: {}", prof.url),
                })?;
                let mut server = ControllerConfig::new(url);
                server.tls = if global.insecure {
                    TlsVerification::DangerAcceptInvalid
                } else {
                    practrack_config::profile_tls(&prof, &cfg.defaults)
                };
                Controller::login(&server, &username, &password, prof.remember_me).await?
            } else {
                secret_prompt("Token")?
            };

            practrack_config::store_token(&profile_name, &token)?;
            if let Some(entry) = cfg.profiles.get_mut(&profile_name) {
                entry.auth_mode = "token".into();
            }
            config::save_config(&cfg)?;

            eprintln!("✓ Token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: practrack config init");
                return Ok(());
            }
            let default = cfg.profile_name(None);
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            for name in names {
                let marker = if name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}
