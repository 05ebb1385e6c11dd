//! Shared configuration for loopdash.
//!
//! TOML profiles layered with `LOOPDASH_` environment variables, macaroon
//! resolution, and translation into `loopdash_api::TransportConfig` plus
//! `loopdash_core::StoreConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use loopdash_api::{TlsMode, TransportConfig};
use loopdash_core::{RECENT_SWAP_WINDOW, StoreConfig};

/// REST gateway address of a daemon running with default flags.
pub const DEFAULT_URL: &str = "https://localhost:8081";

const ENV_PREFIX: &str = "LOOPDASH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}'")]
    NoProfile { profile: String },

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

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named explicitly.
    pub default_profile: Option<String>,

    /// Global defaults, overridable per profile.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named daemon profiles.
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

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_url() -> String {
    DEFAULT_URL.into()
}

/// A named daemon profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// REST gateway base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Path to a binary macaroon file (e.g. `~/.loop/mainnet/loop.macaroon`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macaroon_path: Option<PathBuf>,

    /// Hex-encoded macaroon. Takes precedence over `macaroon_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macaroon_hex: Option<String>,

    /// The daemon's TLS certificate, trusted as a root CA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_cert_path: Option<PathBuf>,

    /// Skip certificate verification entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: default_url(),
            macaroon_path: None,
            macaroon_hex: None,
            tls_cert_path: None,
            insecure: None,
            poll_interval_ms: None,
            timeout_secs: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "loopdash", "loopdash").map_or_else(
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
    p.push("loopdash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, then apply `LOOPDASH_` environment overrides.
///
/// Nested keys use a double underscore: `LOOPDASH_DEFAULTS__POLL_INTERVAL_MS`.
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Everything needed to build a client and a store for one daemon.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub name: String,
    pub url: Url,
    pub transport: TransportConfig,
    pub store: StoreConfig,
}

/// Pick a profile by name (or the configured default) and resolve it.
pub fn resolve_profile(cfg: &Config, name: Option<&str>) -> Result<ResolvedProfile, ConfigError> {
    let name = name
        .or(cfg.default_profile.as_deref())
        .unwrap_or("default");
    let profile = cfg
        .profiles
        .get(name)
        .ok_or_else(|| ConfigError::NoProfile {
            profile: name.into(),
        })?;
    profile_to_resolved(profile, name, &cfg.defaults)
}

/// Validate a profile and translate it, falling back to `defaults` for
/// unset tuning values.
pub fn profile_to_resolved(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ResolvedProfile, ConfigError> {
    let url: Url = profile
        .url
        .parse()
        .map_err(|_| ConfigError::validation("url", format!("invalid URL: {}", profile.url)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::validation(
            "url",
            format!("expected http or https, got '{}'", url.scheme()),
        ));
    }

    let poll_interval_ms = profile.poll_interval_ms.unwrap_or(defaults.poll_interval_ms);
    if poll_interval_ms == 0 {
        return Err(ConfigError::validation(
            "poll_interval_ms",
            "must be greater than zero",
        ));
    }

    let timeout_secs = profile.timeout_secs.unwrap_or(defaults.timeout_secs);
    if timeout_secs == 0 {
        return Err(ConfigError::validation(
            "timeout_secs",
            "must be greater than zero",
        ));
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref cert) = profile.tls_cert_path {
        TlsMode::CustomCa(cert.clone())
    } else {
        TlsMode::DangerAcceptInvalid // the daemon generates a self-signed cert
    };

    let macaroon = resolve_macaroon(profile)?;
    debug!(
        profile = profile_name,
        url = %url,
        macaroon = macaroon.is_some(),
        "resolved profile"
    );

    Ok(ResolvedProfile {
        name: profile_name.into(),
        url,
        transport: TransportConfig {
            tls,
            timeout: Duration::from_secs(timeout_secs),
            macaroon,
        },
        store: StoreConfig {
            poll_interval: Duration::from_millis(poll_interval_ms),
            recent_window: RECENT_SWAP_WINDOW,
        },
    })
}

/// Hex macaroon from the profile, or read from `macaroon_path`.
/// `None` when neither is set.
pub fn resolve_macaroon(profile: &Profile) -> Result<Option<SecretString>, ConfigError> {
    if let Some(ref encoded) = profile.macaroon_hex {
        let encoded = encoded.trim();
        if hex::decode(encoded).is_err() {
            return Err(ConfigError::validation("macaroon_hex", "not valid hex"));
        }
        return Ok(Some(SecretString::from(encoded.to_owned())));
    }

    if let Some(ref path) = profile.macaroon_path {
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(ConfigError::validation(
                "macaroon_path",
                format!("{} is empty", path.display()),
            ));
        }
        return Ok(Some(SecretString::from(hex::encode(bytes))));
    }

    Ok(None)
}
