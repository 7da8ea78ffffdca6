//! Configuration for the wakelight agent.
//!
//! One TOML file layered under `WAKELIGHT_*` environment overrides,
//! shared-secret resolution (flag, env, keyring, plaintext), validation,
//! and translation to `wakelight_core::SessionConfig`.

use std::net::SocketAddr;
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
use url::Url;

use wakelight_api::TransportConfig;
use wakelight_core::{DeviceIdentity, LedSettings, MacAddress, ReconnectConfig, SessionConfig};

/// Keyring service name secrets are stored under.
pub const KEYRING_SERVICE: &str = "wakelight";

/// Prefix of environment overrides (`WAKELIGHT_SERVER__URL`, ...).
pub const ENV_PREFIX: &str = "WAKELIGHT_";

/// Shown instead of secret values.
pub const MASK: &str = "****";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no shared secret configured for device '{device}'")]
    NoSecret { device: String },

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

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub reconnect: ReconnectSection,
    #[serde(default)]
    pub transport: TransportSection,
    #[serde(default)]
    pub led: LedSection,
    #[serde(default)]
    pub wol: WolSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    /// WebSocket endpoint (`ws://` or `wss://`).
    #[serde(default = "default_url")]
    pub url: String,

    /// Environment variable holding the shared secret.
    #[serde(default = "default_secret_env")]
    pub secret_env: Option<String>,

    /// Shared secret (plaintext, prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            secret_env: default_secret_env(),
            secret: None,
        }
    }
}

fn default_url() -> String {
    "ws://127.0.0.1:8080/ws".into()
}
#[allow(clippy::unnecessary_wraps)]
fn default_secret_env() -> Option<String> {
    Some("WAKELIGHT_SECRET".into())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSection {
    /// Auth token prefix.
    #[serde(default = "default_device_name")]
    pub name: String,

    /// MAC reported in the auth frame. All zeroes when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            mac: None,
        }
    }
}

fn default_device_name() -> String {
    "esp32".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconnectSection {
    #[serde(default = "default_min_backoff_ms")]
    pub min_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            min_backoff_ms: default_min_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

fn default_min_backoff_ms() -> u64 {
    2_000
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_tick_ms() -> u64 {
    1_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportSection {
    /// Largest fragment handed to the session, in bytes.
    #[serde(default = "default_rx_buffer_size")]
    pub rx_buffer_size: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            rx_buffer_size: default_rx_buffer_size(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_rx_buffer_size() -> usize {
    1024
}
fn default_connect_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedSection {
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,
    /// Allocation limit of the simulated strip driver.
    #[serde(default = "default_max_pixels")]
    pub max_pixels: usize,
}

impl Default for LedSection {
    fn default() -> Self {
        Self {
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
            max_pixels: default_max_pixels(),
        }
    }
}

fn default_enqueue_timeout_ms() -> u64 {
    100
}
fn default_max_pixels() -> usize {
    1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WolSection {
    #[serde(default = "default_broadcast")]
    pub broadcast: String,
}

impl Default for WolSection {
    fn default() -> Self {
        Self {
            broadcast: default_broadcast(),
        }
    }
}

fn default_broadcast() -> String {
    wakelight_api::wol::DEFAULT_BROADCAST.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "wakelight", "wakelight").map_or_else(
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
    p.push("wakelight");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` plus environment. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secret resolution ───────────────────────────────────────────────

fn keyring_account(device_name: &str) -> String {
    format!("{device_name}/secret")
}

/// Resolve the shared secret: `--secret` flag, `secret_env` variable,
/// system keyring, then plaintext in the file.
pub fn resolve_secret(cfg: &Config, flag: Option<&str>) -> Result<SecretString, ConfigError> {
    // 1. CLI flag
    if let Some(secret) = flag {
        return Ok(SecretString::from(secret.to_owned()));
    }

    // 2. Named env var
    if let Some(ref env_name) = cfg.server.secret_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Ok(SecretString::from(val));
            }
        }
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(&cfg.device.name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref secret) = cfg.server.secret {
        return Ok(SecretString::from(secret.clone()));
    }

    Err(ConfigError::NoSecret {
        device: cfg.device.name.clone(),
    })
}

/// Store `secret` in the system keyring for `device_name`.
pub fn store_secret(device_name: &str, secret: &str) -> Result<(), ConfigError> {
    if secret.is_empty() {
        return Err(invalid("secret", "value cannot be empty"));
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(device_name))
        .map_err(|e| ConfigError::Keyring(format!("failed to access keyring: {e}")))?;
    entry
        .set_password(secret)
        .map_err(|e| ConfigError::Keyring(format!("failed to store secret: {e}")))
}

// ── Validation and translation ──────────────────────────────────────

impl Config {
    /// The same config with secret values replaced by [`MASK`].
    pub fn masked(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.server.secret.is_some() {
            cfg.server.secret = Some(MASK.into());
        }
        cfg
    }

    pub fn server_url(&self) -> Result<Url, ConfigError> {
        let url: Url = self
            .server
            .url
            .parse()
            .map_err(|e| invalid("server.url", format!("'{}': {e}", self.server.url)))?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(invalid(
                "server.url",
                format!("scheme must be ws or wss, got '{other}'"),
            )),
        }
    }

    pub fn device_mac(&self) -> Result<Option<MacAddress>, ConfigError> {
        self.device
            .mac
            .as_deref()
            .map(|mac| mac.parse().map_err(|e| invalid("device.mac", format!("{e}"))))
            .transpose()
    }

    pub fn wol_target(&self) -> Result<SocketAddr, ConfigError> {
        self.wol.broadcast.parse().map_err(|e| {
            invalid(
                "wol.broadcast",
                format!("'{}': {e}", self.wol.broadcast),
            )
        })
    }

    /// Check every value the session depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server_url()?;
        self.device_mac()?;
        self.wol_target()?;

        if self.device.name.is_empty() {
            return Err(invalid("device.name", "must not be empty"));
        }
        let reconnect = &self.reconnect;
        if reconnect.min_backoff_ms == 0 {
            return Err(invalid("reconnect.min_backoff_ms", "must be positive"));
        }
        if reconnect.min_backoff_ms > reconnect.max_backoff_ms {
            return Err(invalid(
                "reconnect.max_backoff_ms",
                format!(
                    "must be at least min_backoff_ms ({})",
                    reconnect.min_backoff_ms
                ),
            ));
        }
        if reconnect.tick_ms == 0 {
            return Err(invalid("reconnect.tick_ms", "must be positive"));
        }
        if self.transport.rx_buffer_size == 0 {
            return Err(invalid("transport.rx_buffer_size", "must be positive"));
        }
        if self.transport.connect_timeout_secs == 0 {
            return Err(invalid("transport.connect_timeout_secs", "must be positive"));
        }
        Ok(())
    }

    /// Build the runtime session config. `url` overrides `server.url`.
    pub fn to_session_config(
        &self,
        secret: SecretString,
        url: Option<&str>,
    ) -> Result<SessionConfig, ConfigError> {
        let mut cfg = self.clone();
        if let Some(url) = url {
            cfg.server.url = url.to_owned();
        }
        cfg.validate()?;

        let mut session = SessionConfig::new(cfg.server_url()?, secret);
        session.device = DeviceIdentity {
            name: cfg.device.name.clone(),
            mac: cfg.device_mac()?,
        };
        session.reconnect = ReconnectConfig {
            min_backoff: Duration::from_millis(cfg.reconnect.min_backoff_ms),
            max_backoff: Duration::from_millis(cfg.reconnect.max_backoff_ms),
            tick: Duration::from_millis(cfg.reconnect.tick_ms),
        };
        session.transport = TransportConfig {
            rx_buffer_size: cfg.transport.rx_buffer_size,
            connect_timeout: Duration::from_secs(cfg.transport.connect_timeout_secs),
        };
        session.led = LedSettings {
            enqueue_timeout: Duration::from_millis(cfg.led.enqueue_timeout_ms),
            max_pixels: cfg.led.max_pixels,
        };
        session.wol_target = cfg.wol_target()?;
        Ok(session)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
