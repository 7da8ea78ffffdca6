//! CLI error types with miette diagnostics.
//!
//! Maps config and core errors into user-facing errors with help text and
//! a stable exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use wakelight_config::ConfigError;
use wakelight_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(
        code(wakelight::validation),
        help("Fix the value in the config file, or override it with a flag or WAKELIGHT_* variable.")
    )]
    Validation { field: String, reason: String },

    #[error("Could not load configuration: {message}")]
    #[diagnostic(
        code(wakelight::config),
        help("Check the file printed by: wakelight config path")
    )]
    Config { message: String },

    #[error("Config file already exists: {}", path.display())]
    #[diagnostic(
        code(wakelight::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: PathBuf },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No shared secret configured for device '{device}'")]
    #[diagnostic(
        code(wakelight::no_secret),
        help(
            "Store one with: wakelight config set-secret\n\
             Or set WAKELIGHT_SECRET, or pass --secret."
        )
    )]
    NoSecret { device: String },

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(wakelight::keyring),
        help("No usable system keyring. Set WAKELIGHT_SECRET or server.secret instead.")
    )]
    Keyring { message: String },

    // ── Network ──────────────────────────────────────────────────────
    #[error("Failed to send magic packet to {mac}")]
    #[diagnostic(
        code(wakelight::wake_failed),
        help("Check the broadcast address and that this host may send broadcasts.\n{reason}")
    )]
    WakeFailed { mac: String, reason: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("LED worker did not stop within {secs}s")]
    #[diagnostic(code(wakelight::shutdown_timeout))]
    ShutdownTimeout { secs: u64 },

    #[error("{message}")]
    #[diagnostic(code(wakelight::runtime))]
    Runtime { message: String },

    #[error(transparent)]
    #[diagnostic(code(wakelight::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::Config { .. } | Self::ConfigExists { .. } => {
                exit_code::USAGE
            }
            Self::NoSecret { .. } | Self::Keyring { .. } => exit_code::AUTH,
            Self::WakeFailed { .. } => exit_code::CONNECTION,
            Self::ShutdownTimeout { .. } => exit_code::TIMEOUT,
            Self::Runtime { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoSecret { device } => CliError::NoSecret { device },
            ConfigError::Keyring(message) => CliError::Keyring { message },
            ConfigError::Io(e) => CliError::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => {
                CliError::Config {
                    message: other.to_string(),
                }
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "server.url".into(),
                reason: message,
            },
            CoreError::InvalidMac(e) => CliError::Validation {
                field: "mac".into(),
                reason: e.to_string(),
            },
            other => CliError::Runtime {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_their_exit_class() {
        let missing = CliError::from(ConfigError::NoSecret {
            device: "esp32".into(),
        });
        assert_eq!(missing.exit_code(), exit_code::AUTH);

        let invalid = CliError::from(ConfigError::Validation {
            field: "server.url".into(),
            reason: "scheme must be ws or wss".into(),
        });
        assert_eq!(invalid.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn core_config_error_is_a_usage_error() {
        let err = CliError::from(CoreError::Config {
            message: "Unsupported URL scheme 'http'".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(
            err.to_string(),
            "Invalid server.url: Unsupported URL scheme 'http'"
        );
    }

    #[test]
    fn other_core_errors_are_general() {
        let err = CliError::from(CoreError::Internal("session task panicked".into()));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
