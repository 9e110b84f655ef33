// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: package requests
fn packages_arg() -> Arg {
    Arg::new("packages")
        .num_args(0..)
        .help("Package requests, e.g. requests, numpy==1.26.4, flask>=3.0")
}

/// Common argument: requirements file
fn requirement_arg() -> Arg {
    Arg::new("requirement")
        .short('r')
        .long("requirement")
        .value_name("FILE")
        .action(ArgAction::Append)
        .help("Read additional requests from a requirements-style file")
}

fn fallback_arg() -> Arg {
    Arg::new("fallback")
        .long("fallback")
        .value_parser(["strict", "latest"])
        .help("Behavior when no release satisfies a constraint")
}

fn policy_args() -> [Arg; 4] {
    [
        fallback_arg(),
        Arg::new("no_critical")
            .long("no-critical")
            .action(ArgAction::SetTrue)
            .help("Do not append the critical packages after the requested ones"),
        Arg::new("critical_depth")
            .long("critical-depth")
            .help("Levels expanded below a critical dependency"),
        Arg::new("workers")
            .long("workers")
            .help("Roots resolved concurrently"),
    ]
}

fn build_cli() -> Command {
    Command::new("wheelhouse")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Wheelhouse Contributors")
        .about("Resolve Python packages into an offline wheel bundle")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .help("Configuration file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve packages, download their wheels and write install scripts")
                .arg(packages_arg())
                .arg(requirement_arg())
                .args(policy_args())
                .arg(Arg::new("wheel_dir").short('w').long("wheel-dir").help("Directory wheels are downloaded into"))
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory the manifest and install scripts are written to"),
                )
                .arg(Arg::new("download_workers").long("download-workers").help("Concurrent downloads"))
                .arg(Arg::new("python_version").long("python-version").help("Python version for the conda environment"))
                .arg(Arg::new("env_name").long("env-name").help("Conda environment created by the install scripts"))
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Hide the progress bar"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Show what would be downloaded, without downloading anything")
                .arg(packages_arg())
                .arg(requirement_arg())
                .args(policy_args()),
        )
        .subcommand(
            Command::new("show")
                .about("Show the resolved metadata of a single package")
                .arg(Arg::new("package").required(true).help("Package request"))
                .arg(fallback_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("wheelhouse.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
