mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts, LogFormat};
use crate::error::CliError;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `run` is a long-lived service, so it logs its lifecycle by default.
    let base_level = if matches!(cli.command, Command::Run(_)) { 2 } else { 1 };
    init_tracing(&cli.global, base_level);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(global: &GlobalOpts, base_level: usize) {
    let level = if global.quiet {
        LEVELS[0]
    } else {
        let index = base_level.saturating_add(usize::from(global.verbose));
        LEVELS[index.min(LEVELS.len() - 1)]
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match global.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run(args) => commands::run::handle(&args, &cli.global).await,
        Command::Wake(args) => commands::wake::handle(&args, &cli.global),
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "wakelight", &mut std::io::stdout());
            Ok(())
        }
    }
}
