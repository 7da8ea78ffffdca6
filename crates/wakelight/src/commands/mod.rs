//! Subcommand handlers.

pub mod config_cmd;
pub mod run;
pub mod wake;

use std::path::PathBuf;

use wakelight_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// `--config` if given, else the platform default.
fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(wakelight_config::config_path)
}

/// Load the layered config. A missing file yields defaults.
fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    tracing::debug!(path = %path.display(), "Loading config");
    Ok(wakelight_config::load_config_from(&path)?)
}
