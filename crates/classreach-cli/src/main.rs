//! classreach command-line tool
//!
//! Computes which compiled classes (and which directories and archives
//! holding them) a set of seed classes transitively depends on.

mod commands;
mod logging;

use clap::{Parser, Subcommand};
use commands::{closure::ClosureArgs, refs::RefsArgs};

#[derive(Parser)]
#[command(name = "classreach")]
#[command(about = "Transitive class-file dependency closure", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter, e.g. "debug" or "classreach_core=trace" (RUST_LOG wins)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the dependency closure of one or more seed classes
    Closure(ClosureArgs),

    /// List the classes a single class file refers to
    Refs(RefsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log.as_deref());

    match cli.command {
        Commands::Closure(args) => commands::closure::execute(&args),
        Commands::Refs(args) => commands::refs::execute(&args),
    }
}
