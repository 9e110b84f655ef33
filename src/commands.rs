// src/commands.rs
//! Command handlers for the wheelhouse CLI

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;
use wheelhouse::{
    parse_entry, CliProgress, FallbackPolicy, LogProgress, ProgressTracker, Resolution, SilentProgress,
    Wheelhouse, WheelhouseConfig,
};

use crate::cli::{PolicyArgs, RequestArgs};

/// Output-affecting overrides for `resolve`
#[derive(Debug, Default)]
pub struct BundleOverrides {
    pub wheel_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub download_workers: Option<usize>,
    pub python_version: Option<String>,
    pub env_name: Option<String>,
}

/// Collect request strings from arguments and requirement files
pub fn collect_requests(args: &RequestArgs) -> Result<Vec<String>> {
    let mut requests = args.packages.clone();
    for path in &args.requirement_files {
        requests.extend(read_requirement_file(path)?);
    }
    if requests.is_empty() {
        anyhow::bail!("No packages given (pass package names or -r FILE)");
    }
    Ok(requests)
}

/// One request per line; blank lines, comments and pip options are skipped
fn read_requirement_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read requirements file: {}", path.display()))?;
    Ok(content
        .lines()
        .map(|line| line.split(" #").next().unwrap_or(line).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .map(str::to_string)
        .collect())
}

fn apply_policy(config: &mut WheelhouseConfig, policy: &PolicyArgs) {
    if let Some(fallback) = policy.fallback {
        config.registry.fallback = fallback;
    }
    if policy.no_critical {
        config.resolver.force_include_critical = false;
    }
    if let Some(depth) = policy.critical_depth {
        config.resolver.critical_depth = depth;
    }
    if let Some(workers) = policy.workers {
        config.resolver.workers = workers;
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_resolution(resolution: &Resolution) {
    for raw in &resolution.rejected {
        println!("  [rejected]   {}", raw);
    }
    for request in &resolution.unresolved {
        println!("  [unresolved] {}", request);
    }
}

/// Resolve, download and write the offline bundle
pub fn cmd_resolve(
    mut config: WheelhouseConfig,
    request: &RequestArgs,
    policy: &PolicyArgs,
    overrides: BundleOverrides,
    quiet: bool,
    json: bool,
) -> Result<()> {
    apply_policy(&mut config, policy);
    if let Some(dir) = overrides.wheel_dir {
        config.download.wheel_dir = dir;
    }
    if let Some(dir) = overrides.output_dir {
        config.manifest.output_dir = dir;
    }
    if let Some(workers) = overrides.download_workers {
        config.download.workers = workers;
    }
    if overrides.python_version.is_some() {
        config.manifest.python_version = overrides.python_version;
    }
    if overrides.env_name.is_some() {
        config.manifest.env_name = overrides.env_name;
    }

    let requests = collect_requests(request)?;
    let wheelhouse = Wheelhouse::from_config(config)?;

    let resolution = wheelhouse.plan(&requests);
    let total = resolution.artifacts.len() as u64;
    let progress: Box<dyn ProgressTracker> = if quiet || json {
        Box::new(SilentProgress::new())
    } else if std::io::stderr().is_terminal() {
        Box::new(CliProgress::new("Downloading wheels", total))
    } else {
        Box::new(LogProgress::new("download", total))
    };

    let outcome = wheelhouse.bundle(resolution, progress.as_ref())?;

    if json {
        return print_json(&outcome.records);
    }

    println!("Resolved {} wheel(s):", outcome.records.len());
    for record in &outcome.records {
        match record.file {
            Some(ref file) => println!("  {} {}  {}", record.name, record.version, file.display()),
            None => println!("  {} {}  [download failed]", record.name, record.version),
        }
    }
    print_resolution(&outcome.resolution);

    println!();
    println!("Wrote {}", outcome.files.requirements.display());
    println!("Wrote {}", outcome.files.manifest.display());
    println!("Wrote {}", outcome.files.install_sh.display());
    println!("Wrote {}", outcome.files.install_bat.display());

    let failed = outcome.failed_downloads();
    if failed > 0 {
        println!("\n{} download(s) failed; rerun to retry them", failed);
    }
    Ok(())
}

/// Resolve only; nothing is downloaded or written
pub fn cmd_plan(
    mut config: WheelhouseConfig,
    request: &RequestArgs,
    policy: &PolicyArgs,
    json: bool,
) -> Result<()> {
    apply_policy(&mut config, policy);
    let requests = collect_requests(request)?;
    let wheelhouse = Wheelhouse::from_config(config)?;

    let resolution = wheelhouse.plan(&requests);
    info!("Planned {} artifacts", resolution.artifacts.len());

    if json {
        return print_json(&resolution);
    }

    if resolution.artifacts.is_empty() {
        println!("Nothing to download.");
    } else {
        println!("Would download {} wheel(s):", resolution.artifacts.len());
        for artifact in &resolution.artifacts {
            println!("  {}=={}  {}", artifact.name, artifact.version, artifact.url);
        }
    }
    print_resolution(&resolution);
    Ok(())
}

/// Show resolved metadata for one package request
pub fn cmd_show(
    mut config: WheelhouseConfig,
    package: &str,
    fallback: Option<FallbackPolicy>,
    json: bool,
) -> Result<()> {
    if let Some(fallback) = fallback {
        config.registry.fallback = fallback;
    }
    let request = parse_entry(package);
    let wheelhouse = Wheelhouse::from_config(config)?;

    let meta = wheelhouse
        .fetcher()
        .fetch(&request.name, request.constraint.as_deref())
        .with_context(|| format!("No release of '{}' found", request))?;

    if json {
        return print_json(meta.as_ref());
    }

    println!("Name:     {}", meta.name);
    println!("Version:  {}", meta.version);
    match meta.wheel {
        Some(ref wheel) => {
            println!("Wheel:    {}", wheel.filename);
            println!("URL:      {}", wheel.url);
        }
        None => println!("Wheel:    (none published)"),
    }
    if meta.requires_dist.is_empty() {
        println!("Requires: (none)");
    } else {
        println!("Requires:");
        for req in &meta.requires_dist {
            println!("  {}", req);
        }
    }
    Ok(())
}
