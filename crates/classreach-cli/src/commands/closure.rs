//! `classreach closure`: walk the dependency closure of seed classes.

use anyhow::{Context, Result};
use clap::Args;
use classreach_core::{
    ClassPathLocator, ClosureReport, Config, DependencyWalker, SearchPath, CONFIG_FILE_NAME,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct ClosureArgs {
    /// Seed classes, as dotted names (com.acme.Main)
    #[arg(required = true)]
    pub seeds: Vec<String>,

    /// Configuration file (defaults to ./classreach.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Search path, separated like PATH; replaces the configured entries
    #[arg(long)]
    pub classpath: Option<String>,

    /// Only accept classes with this prefix (repeatable)
    #[arg(long)]
    pub include: Vec<String>,

    /// Never accept classes with this prefix (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Stop accepting after this many classes
    #[arg(long)]
    pub max_modules: Option<usize>,

    /// Prefix of platform classes to ignore (repeatable; replaces the default "java.")
    #[arg(long = "platform-prefix")]
    pub platform_prefixes: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: &ClosureArgs) -> Result<()> {
    let stdout = std::io::stdout();
    run(args, &mut stdout.lock())
}

pub fn run(args: &ClosureArgs, out: &mut impl Write) -> Result<()> {
    let config = load_config(args)?;

    let search_path = match &args.classpath {
        Some(classpath) => SearchPath::parse(classpath),
        None => config.search_path(),
    };
    if search_path.is_empty() {
        warn!("search path is empty, no class can be located");
    }

    let walker =
        DependencyWalker::with_extractor(ClassPathLocator::new(search_path), config.extractor());
    let mut acceptor = config.acceptor();
    walker
        .traverse(args.seeds.iter().map(String::as_str), &mut acceptor)
        .context("dependency traversal failed")?;

    let report = ClosureReport::from(&acceptor);
    info!(
        modules = report.modules.len(),
        roots = report.roots.len(),
        "closure computed"
    );

    if args.json {
        writeln!(out, "{}", report.to_json()?)?;
    } else {
        print_report(&report, out)?;
    }
    Ok(())
}

/// Load the configuration and apply command-line overrides
fn load_config(args: &ClosureArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let default = Path::new(CONFIG_FILE_NAME);
            if default.is_file() {
                Config::from_file(default)
                    .with_context(|| format!("failed to load {CONFIG_FILE_NAME}"))?
            } else {
                Config::default()
            }
        }
    };

    if !args.include.is_empty() {
        config.filter.include = args.include.clone();
    }
    if !args.exclude.is_empty() {
        config.filter.exclude = args.exclude.clone();
    }
    if !args.platform_prefixes.is_empty() {
        config.filter.platform_prefixes = args.platform_prefixes.clone();
    }
    if args.max_modules.is_some() {
        config.filter.max_modules = args.max_modules;
    }
    config.validate()?;
    Ok(config)
}

fn print_report(report: &ClosureReport, out: &mut impl Write) -> Result<()> {
    for module in &report.modules {
        writeln!(out, "{}", module.name)?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{} classes from {} packaging root(s):",
        report.modules.len(),
        report.roots.len()
    )?;
    for root in &report.roots {
        writeln!(out, "  {} ({})", root.url, root.modules.len())?;
    }
    Ok(())
}
