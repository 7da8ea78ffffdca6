//! `wakelight config`: inspect and initialise configuration.

use wakelight_config::{Config, ConfigError};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = super::config_path(global);

    match &args.command {
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = super::load_config(global)?;
            let rendered = toml::to_string_pretty(&cfg.masked()).map_err(ConfigError::from)?;
            print!("{rendered}");
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !*force {
                return Err(CliError::ConfigExists { path });
            }
            wakelight_config::save_config_to(&Config::default(), &path)?;
            eprintln!("Wrote default config to {}", path.display());
            Ok(())
        }

        ConfigCommand::SetSecret => {
            let cfg = super::load_config(global)?;
            let device = cfg.device.name;

            let secret = rpassword::prompt_password(format!("Shared secret for '{device}': "))?;
            wakelight_config::store_secret(&device, &secret)?;

            eprintln!("Secret stored in system keyring for device '{device}'");
            Ok(())
        }
    }
}
