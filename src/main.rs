//! Model Explorer - Main Entry Point
//!
//! Interactive dashboard by default, plus one-shot and inspection commands.

use clap::Parser;
use model_explorer::cli::{cmd_info, cmd_interactive, cmd_models, cmd_run, resolve_config, Cli, Commands, RunArgs};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "model_explorer=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { data, target, test_size, model, params, scaling, seed, json }) => {
            let config = resolve_config(cli.config.as_deref(), data.or(cli.data).as_deref())?;
            cmd_run(config, RunArgs { target, test_size, model, params, scaling, seed, json })?;
        }
        Some(Commands::Info { data }) => {
            let config = resolve_config(cli.config.as_deref(), data.or(cli.data).as_deref())?;
            cmd_info(config)?;
        }
        Some(Commands::Models) => {
            cmd_models()?;
        }
        None => {
            // Default: interactive dashboard
            let config = resolve_config(cli.config.as_deref(), cli.data.as_deref())?;
            cmd_interactive(config)?;
        }
    }

    Ok(())
}
