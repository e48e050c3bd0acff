//! Strata - layered module-dependency checker
//! Command-line interface for checking import graphs against architecture rules

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use strata_core::config::CONFIG_FILE_NAMES;
use strata_core::report::EXIT_OK;
use strata_core::{
    create_config, load_edges, Config, DependencyGraph, EdgeSet, ImportExtractor, Report,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status for configuration and I/O failures
const EXIT_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author = "Strata Contributors")]
#[command(version)]
#[command(about = "Strata - layered module-dependency checker", long_about = None)]
struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the import graph against the configured rules
    Check {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Fail on circular dependencies regardless of the config
        #[arg(long, conflicts_with = "allow_cycles")]
        forbid_cycles: bool,

        /// Ignore circular dependencies regardless of the config
        #[arg(long)]
        allow_cycles: bool,
    },

    /// Print the module dependency graph in Graphviz DOT format
    Graph {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write a starter strata.toml in the current directory
    Init {
        /// Source root to scan for top-level packages
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,

        /// Overwrite an existing strata.toml
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Rule file (default: strata.toml or tach.toml, searched upwards)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pre-computed edge list (.json, or text with one `a -> b` per line)
    #[arg(long, value_name = "FILE", conflicts_with = "source")]
    edges: Option<PathBuf>,

    /// Project root to scan (default: the config file's directory)
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            input,
            format,
            forbid_cycles,
            allow_cycles,
        } => check_command(&input, format, cycle_override(forbid_cycles, allow_cycles)),

        Commands::Graph { input } => graph_command(&input),

        Commands::Init { source, force } => std::env::current_dir()
            .context("cannot determine the current directory")
            .and_then(|dir| init_command(&dir, source.as_deref(), force)),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(EXIT_ERROR);
        }
    }
}

/// Logs go to stderr so `--format json` output stays machine-readable
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| "strata=warn".into()),
        1 => "strata=debug".into(),
        _ => "strata=trace".into(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cycle_override(forbid: bool, allow: bool) -> Option<bool> {
    match (forbid, allow) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

// ============================================================================
// Input loading
// ============================================================================

/// Load the rule file and return it with the project root it applies to
fn load_config(path: Option<&Path>) -> anyhow::Result<(Config, PathBuf)> {
    match path {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let root = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            Ok((config, root))
        }
        None => {
            let current_dir =
                std::env::current_dir().context("cannot determine the current directory")?;
            Ok(Config::find_and_load(&current_dir)?)
        }
    }
}

fn load_input_edges(input: &InputArgs, config: &Config, root: &Path) -> anyhow::Result<EdgeSet> {
    if let Some(path) = &input.edges {
        return load_edges(path)
            .with_context(|| format!("failed to read edge list {}", path.display()));
    }

    let project_root = input.source.as_deref().unwrap_or(root);
    let extractor = ImportExtractor::from_config(config, project_root)?;
    extractor
        .extract()
        .with_context(|| format!("failed to scan {}", project_root.display()))
}

// ============================================================================
// Commands
// ============================================================================

fn check_command(input: &InputArgs, format: Format, cycles: Option<bool>) -> anyhow::Result<i32> {
    let (config, root) = load_config(input.config.as_deref())?;
    let edges = load_input_edges(input, &config, &root)?;

    let report = strata_core::check(&config, &edges, cycles)?;

    match format {
        Format::Json => println!("{}", report.to_json()),
        Format::Text => print_report(&report),
    }

    Ok(report.exit_code())
}

fn print_report(report: &Report) {
    for violation in report.errors() {
        println!(
            "{} {} {}",
            "error".red().bold(),
            format!("[{}]", violation.kind.code()).dimmed(),
            violation.message
        );
        println!("  {} {} -> {}", "-->".blue(), violation.importer, violation.imported);
    }

    for violation in report.warnings() {
        println!(
            "{} {} {}",
            "warning".yellow().bold(),
            format!("[{}]", violation.kind.code()).dimmed(),
            violation.message
        );
        println!("  {} {} -> {}", "-->".blue(), violation.importer, violation.imported);
    }

    if !report.violations.is_empty() {
        println!();
    }

    let summary = &report.summary;
    let status = if report.passed {
        "    Finished".green().bold()
    } else {
        "      Failed".red().bold()
    };
    println!(
        "{} {} module(s), {} edge(s): {} error(s), {} warning(s)",
        status, summary.modules, summary.edges, summary.errors, summary.warnings
    );
}

fn graph_command(input: &InputArgs) -> anyhow::Result<i32> {
    let (config, root) = load_config(input.config.as_deref())?;
    let edges = load_input_edges(input, &config, &root)?;
    let rules = config.to_rules()?;

    let graph = DependencyGraph::from_edges(&rules, &edges);
    tracing::debug!(nodes = graph.node_count(), edges = graph.edge_count(), "graph built");
    print!("{}", graph.to_dot());

    Ok(EXIT_OK)
}

fn init_command(dir: &Path, source: Option<&Path>, force: bool) -> anyhow::Result<i32> {
    let config_path = dir.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "{} already exists in this directory (use --force to overwrite)",
            CONFIG_FILE_NAMES[0]
        );
    }

    let source_root = source
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());

    println!(
        "{} rules in '{}'",
        "Initializing".green().bold(),
        dir.display().to_string().cyan()
    );

    let extractor = ImportExtractor::new(dir, std::slice::from_ref(&source_root), &[])?;
    let packages = extractor
        .discover_packages()
        .with_context(|| format!("failed to scan {}", dir.join(&source_root).display()))?;

    let mut config = create_config(&packages);
    config.source_roots = vec![source_root];

    fs::write(&config_path, config.to_string()?)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!("{} {}", "   Created".green().bold(), CONFIG_FILE_NAMES[0].cyan());
    for package in &packages {
        println!("  {} {}", "+".green(), package.as_str().cyan());
    }
    if packages.is_empty() {
        println!("  {}", "no packages found; add [[modules]] entries by hand".yellow());
    }
    println!();
    println!("{}", "Assign layers, then run 'strata check'.".bold());

    Ok(EXIT_OK)
}
