use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cciu::check::{CheckOptions, Checker};
use cciu::config::{Config, KeepLevel, OutputFormat};
use cciu::image::Normalizer;
use cciu::logging::{self, LogOptions};
use cciu::output::create_reporter;
use cciu::registry::DockerRegistry;

/// Reads references from stdin
const STDIN_MARKER: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "cciu")]
#[command(version, about = "Check container image references for newer tags")]
struct Cli {
    /// Image references like alpine:3.12 or quay.io/org/app:1.2-label; "-" reads them from stdin
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<String>,

    /// Ignore alpha, beta and rc tags
    #[arg(long, alias = "exclude-beta-tags")]
    exclude_prerelease: bool,

    /// Only compare tags with exactly the requested label
    #[arg(long)]
    strict_labels: bool,

    /// Skip references whose tag is no semantic version without fetching
    #[arg(long)]
    skip_non_semver: bool,

    /// Only consider tags of the same major or major.minor line
    #[arg(long, value_name = "major|minor")]
    keep: Option<String>,

    /// Treat partial versions like 8.4 as ranges when judging equality
    #[arg(long)]
    partial_equal: bool,

    /// Ignore tags whose major version exceeds the requested one by more than this
    #[arg(long, value_name = "N")]
    max_major_gap: Option<u64>,

    /// Print a JSON document
    #[arg(long)]
    json: bool,

    /// Print an indented JSON document
    #[arg(long)]
    json_pretty: bool,

    /// Use ^ = v instead of ▲ = ▼
    #[arg(long)]
    simple_markers: bool,

    /// Print run statistics
    #[arg(long)]
    stats: bool,

    /// Print all matching tags, not only the newest
    #[arg(long)]
    show_old: bool,

    /// Concurrent fetches per registry, 0 means unbounded
    #[arg(long, value_name = "N")]
    limit_per_registry: Option<usize>,

    /// Timeout per repository fetch in seconds, 0 means none
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Registry credential file
    #[arg(long, value_name = "PATH")]
    auth_file: Option<PathBuf>,

    /// Registry for references without one
    #[arg(long, value_name = "HOST")]
    default_registry: Option<String>,

    /// Configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level or filter directive, RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// Override configuration values with the given flags
    fn apply(&self, config: &mut Config) -> anyhow::Result<()> {
        let check = &mut config.check;
        check.exclude_prerelease |= self.exclude_prerelease;
        check.strict_labels |= self.strict_labels;
        check.skip_non_semver |= self.skip_non_semver;
        check.partial_equal |= self.partial_equal;
        if let Some(keep) = &self.keep {
            keep.parse::<KeepLevel>()?;
            check.keep = keep.clone();
        }
        if let Some(gap) = self.max_major_gap {
            check.max_major_gap = gap;
        }

        let fetch = &mut config.fetch;
        if let Some(limit) = self.limit_per_registry {
            fetch.limit_per_registry = limit;
        }
        if let Some(timeout) = self.timeout {
            fetch.timeout_secs = timeout;
        }
        if let Some(path) = &self.auth_file {
            fetch.auth_file = Some(path.clone());
        }

        let output = &mut config.output;
        if self.json_pretty {
            output.format = OutputFormat::JsonPretty;
        } else if self.json {
            output.format = OutputFormat::Json;
        }
        output.simple_markers |= self.simple_markers;
        output.show_stats |= self.stats;
        output.show_old |= self.show_old;

        if let Some(registry) = &self.default_registry {
            config.normalize.default_registry = registry.clone();
        }
        Ok(())
    }

    fn log_options(&self) -> LogOptions {
        LogOptions {
            level: self.log_level.clone(),
            file: self.log_file.clone(),
            json: self.log_json,
        }
    }
}

/// Expand the stdin marker into the references read from `input`, skipping
/// blank lines and `#` comments. The marker is expanded once.
fn read_references<R: BufRead>(args: &[String], input: R) -> io::Result<Vec<String>> {
    let mut input = Some(input);
    let mut references = Vec::with_capacity(args.len());

    for arg in args {
        if arg != STDIN_MARKER {
            references.push(arg.clone());
            continue;
        }
        let Some(reader) = input.take() else {
            continue;
        };
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                references.push(line.to_string());
            }
        }
    }

    Ok(references)
}

async fn run(config: Config, references: Vec<String>) -> anyhow::Result<()> {
    let timeout = (config.fetch.timeout_secs > 0).then(|| Duration::from_secs(config.fetch.timeout_secs));
    let registry = DockerRegistry::new(timeout, config.fetch.auth_file.clone())
        .context("failed to create registry client")?;

    let checker = Checker::new(
        Arc::new(registry),
        Normalizer::from_config(&config.normalize),
        CheckOptions::from_config(&config),
    );

    let mut reporter = create_reporter(&config.output, Box::new(io::stdout()));
    let stats = checker.run(&references, reporter.as_mut()).await;
    info!(
        "Checked {} of {} references in {:?}",
        stats.checked, stats.asked, stats.duration
    );

    reporter.flush(&stats).context("failed to write report")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.log_options())?;

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config)?;

    let references =
        read_references(&cli.images, io::stdin().lock()).context("failed to read references")?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config, references))
}
