//! Folio CLI - front-matter blog post loader and static page builder.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Front-matter blog post loader and static page builder")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to folio.toml config file
    #[arg(short, long, default_value = "folio.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build HTML pages from every post
    Build {
        /// Output directory (defaults to config or "public")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load every post and report malformed ones
    Check,

    /// Print a parsed post as JSON
    Inspect {
        /// Post to parse
        file: PathBuf,
    },

    /// Create a new post skeleton
    New {
        /// File name of the post, without extension
        slug: String,

        /// Post title (defaults to the slug)
        #[arg(short, long)]
        title: Option<String>,

        /// Tag to add, may be repeated
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Build { output } => {
            commands::build::run(&cli.config, output)?;
        }
        Commands::Check => {
            commands::check::run(&cli.config)?;
        }
        Commands::Inspect { file } => {
            commands::inspect::run(&file)?;
        }
        Commands::New { slug, title, tags } => {
            commands::new::run(&cli.config, &slug, title, tags)?;
        }
    }

    Ok(())
}
