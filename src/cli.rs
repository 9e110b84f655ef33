// src/cli.rs
//! CLI definitions for wheelhouse
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use wheelhouse::FallbackPolicy;

#[derive(Parser)]
#[command(name = "wheelhouse")]
#[command(author = "Wheelhouse Contributors")]
#[command(version)]
#[command(about = "Resolve Python packages into an offline wheel bundle", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/wheelhouse/config.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve packages, download their wheels and write install scripts
    Resolve {
        #[command(flatten)]
        request: RequestArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Directory wheels are downloaded into
        #[arg(short, long)]
        wheel_dir: Option<PathBuf>,

        /// Directory requirements.txt, manifest.json and scripts are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Concurrent downloads
        #[arg(long)]
        download_workers: Option<usize>,

        /// Python version for the conda environment in the install scripts
        #[arg(long)]
        python_version: Option<String>,

        /// Conda environment created by the install scripts
        #[arg(long)]
        env_name: Option<String>,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show what would be downloaded, without downloading anything
    Plan {
        #[command(flatten)]
        request: RequestArgs,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show the resolved metadata of a single package
    Show {
        /// Package request, e.g. `numpy` or `numpy<2`
        package: String,

        /// Behavior when no release satisfies the constraint
        #[arg(long)]
        fallback: Option<FallbackPolicy>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Where package requests come from
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Package requests, e.g. `requests`, `numpy==1.26.4`, `flask>=3.0`
    pub packages: Vec<String>,

    /// Read additional requests from a requirements-style file
    #[arg(short = 'r', long = "requirement", value_name = "FILE")]
    pub requirement_files: Vec<PathBuf>,
}

/// Resolution overrides shared by `resolve` and `plan`
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Behavior when no release satisfies a constraint
    #[arg(long)]
    pub fallback: Option<FallbackPolicy>,

    /// Do not append the critical packages after the requested ones
    #[arg(long)]
    pub no_critical: bool,

    /// Levels expanded below a critical dependency
    #[arg(long)]
    pub critical_depth: Option<usize>,

    /// Roots resolved concurrently
    #[arg(long)]
    pub workers: Option<usize>,
}
