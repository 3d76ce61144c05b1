//! Command-line host for Nacht
//!
//! Animates a mesh through the state manager, or builds a single object
//! from a JSON params file and prints it.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nacht_demo::{describe, session, DemoConfig};

#[derive(Parser)]
#[command(name = "nacht")]
#[command(about = "Nacht - declarative scene reconciliation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "nacht.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate a mesh and print it every frame
    Run {
        /// Number of frames (overrides config)
        #[arg(short, long)]
        frames: Option<u32>,

        /// Milliseconds between frames (overrides config)
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },

    /// Build an object from a JSON params file and print it
    Build {
        /// JSON params file, or `-` for stdin
        params: PathBuf,
    },
}

fn load_config(path: &Path) -> Result<DemoConfig> {
    let mut config = DemoConfig::load_from_file(path)?;
    config.merge_with_env()?;
    Ok(config)
}

fn read_params(path: &Path) -> Result<serde_json::Value> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading params from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading params from {}", path.display()))?
    };
    serde_json::from_str(&text).context("params are not valid JSON")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize unified logging system
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let mut config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run {
            frames,
            interval_ms,
        } => {
            if let Some(frames) = frames {
                config.frames = frames;
            }
            if let Some(interval_ms) = interval_ms {
                config.interval_ms = interval_ms;
            }
            config.validate()?;

            let report = session::run(&config, |frame, mesh| {
                println!("frame {frame:>4}: {mesh}");
            })
            .await?;

            println!(
                "{} frames, {} patches, object built {} time(s)",
                report.frames, report.patches_applied, report.generation
            );
            for err in &report.errors {
                tracing::warn!(error = %err, "animation error");
            }
        }

        Commands::Build { params } => {
            config.validate()?;
            let manager = session::manager(&config)?;
            let entity = session::build(&manager, read_params(&params)?)?;

            entity.with_object(|object| match object {
                Some(object) => print!("{}", describe(object)),
                None => println!("(no object)"),
            });
            println!("{}", serde_json::to_string_pretty(&entity.state().into_value())?);
        }
    }

    Ok(())
}
