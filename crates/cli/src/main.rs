//! markcheck CLI
//!
//! Inspects fixture files and manages the baseline snapshots written by
//! fixture tests.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use markcheck_core::config::Config;
use markcheck_fixture::{default_file_name, Fixture, FixtureParser, OptionRegistry};
use markcheck_verify::BaselineStore;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "markcheck")]
#[command(about = "Fixture inspection and baseline management for markcheck")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse fixture files and print their files, markers, ranges and options
    Parse {
        /// Fixture files or glob patterns
        #[arg(required = true)]
        files: Vec<String>,

        /// Print the parsed fixtures as JSON
        #[arg(long)]
        json: bool,
    },
    /// List local baselines that differ from their reference
    Pending,
    /// Copy every pending local baseline over its reference
    Accept,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Parse { files, json }) => parse_fixtures(&config, &files, json),
        Some(Commands::Pending) => list_pending(&config),
        Some(Commands::Accept) => accept_pending(&config),
        None => {
            println!("Run 'markcheck parse <FILE>' to inspect a fixture, or --help for more options");
            Ok(())
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!("markcheck={level}"))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Expands each argument as a glob pattern; plain paths match themselves
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        let matches: Vec<PathBuf> = glob::glob(input)
            .map_err(|e| anyhow!("Invalid glob pattern '{input}': {e}"))?
            .flatten()
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            return Err(anyhow!("No fixture files match '{input}'"));
        }
        paths.extend(matches);
    }
    Ok(paths)
}

fn test_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fixture".to_string())
}

fn print_summary(path: &Path, fixture: &Fixture) {
    println!("{}", path.display());
    for file in fixture.files() {
        println!("  file {} ({} bytes)", file.path, file.content.len());
    }
    for marker in fixture.markers() {
        println!("  marker {} at {}:{}", marker.label(), marker.file, marker.offset);
    }
    for range in fixture.ranges() {
        println!(
            "  range {} at {}:{}",
            range.name.as_deref().unwrap_or("<anonymous>"),
            range.file,
            range.range
        );
    }
    for (key, value) in &fixture.options().global {
        println!("  option {key} = {value}");
    }
    for link in &fixture.options().symlinks {
        println!("  link {} -> {}", link.target, link.link);
    }
}

fn parse_fixtures(config: &Config, inputs: &[String], json: bool) -> Result<()> {
    let registry = OptionRegistry::builtin().with_extra(&config.fixtures.extra_options);
    let parser = FixtureParser::new(registry);

    let mut parsed = Vec::new();
    let mut failures = 0usize;
    for path in expand_inputs(inputs)? {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = test_name(&path);
        let default_name = default_file_name(&name, &config.fixtures.default_extension);
        debug!(fixture = %path.display(), "Parsing fixture");

        match parser.parse(&name, &content, &default_name) {
            Ok(fixture) => parsed.push((path, fixture)),
            Err(e) => {
                error!("{}: {e}", path.display());
                failures += 1;
            }
        }
    }

    if json {
        let fixtures: Vec<&Fixture> = parsed.iter().map(|(_, f)| f).collect();
        println!("{}", serde_json::to_string_pretty(&fixtures)?);
    } else {
        for (path, fixture) in &parsed {
            print_summary(path, fixture);
        }
    }

    if failures > 0 {
        return Err(anyhow!("{failures} fixture(s) failed to parse"));
    }
    Ok(())
}

fn list_pending(config: &Config) -> Result<()> {
    let store = BaselineStore::from_config(&config.baselines);
    let pending = store.pending()?;
    if pending.is_empty() {
        info!("No pending baselines");
        return Ok(());
    }
    for baseline in &pending {
        if baseline.delete {
            println!("{} (delete)", baseline.name);
        } else {
            println!("{}", baseline.name);
        }
    }
    Ok(())
}

fn accept_pending(config: &Config) -> Result<()> {
    let store = BaselineStore::from_config(&config.baselines);
    let accepted = store.accept_all()?;
    for baseline in &accepted {
        println!("accepted {}", baseline.name);
    }
    info!("Accepted {} baseline(s)", accepted.len());
    Ok(())
}
