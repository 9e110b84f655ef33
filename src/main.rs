// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;
use wheelhouse::WheelhouseConfig;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::BundleOverrides;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "wheelhouse", &mut std::io::stdout());
        return Ok(());
    }

    let config = WheelhouseConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            request,
            policy,
            wheel_dir,
            output_dir,
            download_workers,
            python_version,
            env_name,
            quiet,
        } => {
            let overrides = BundleOverrides {
                wheel_dir,
                output_dir,
                download_workers,
                python_version,
                env_name,
            };
            commands::cmd_resolve(config, &request, &policy, overrides, quiet, cli.json)
        }
        Commands::Plan { request, policy } => commands::cmd_plan(config, &request, &policy, cli.json),
        Commands::Show { package, fallback } => commands::cmd_show(config, &package, fallback, cli.json),
        Commands::Completions { .. } => Ok(()),
    }
}
