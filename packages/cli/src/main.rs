mod commands;
mod config;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use commands::{numbering, options, render, NumberingArgs, OptionsArgs, RenderArgs};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Optclause CLI - render contract documents with optional clauses
#[derive(Parser, Debug)]
#[command(name = "optclause")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to optclause.config.json in the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a document for the given option states
    Render(RenderArgs),

    /// Print paragraph numbering
    Numbering(NumberingArgs),

    /// List the options a document reads
    Options(OptionsArgs),
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = Config::resolve(&cwd, cli.config.as_deref())?;

    match cli.command {
        Command::Render(args) => render(args, &config),
        Command::Numbering(args) => numbering(args, &config),
        Command::Options(args) => options(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
