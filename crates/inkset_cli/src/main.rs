//! Inkset CLI
//!
//! Lays out a JSON options document and prints its boxes or renders it to SVG.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use inkset_cli::{InksetConfig, SvgWriter};
use inkset_text::{measure_text, render_text, ApproximateFonts, FontProvider, TextOptions};

#[derive(Parser, Debug)]
#[command(name = "inkset")]
#[command(about = "Lay out styled multi-paragraph text into boxes and SVG")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./inkset.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra font directory, may be repeated
    #[arg(long = "font-dir", global = true)]
    font_dirs: Vec<PathBuf>,

    /// Skip the fonts installed on the system
    #[arg(long, global = true)]
    no_system_fonts: bool,

    /// Use fixed approximate metrics instead of real fonts
    #[arg(long, global = true)]
    approximate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the layout boxes of an options document as JSON
    Measure {
        /// Options JSON file, or `-` for stdin
        input: PathBuf,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Render an options document to SVG
    Render {
        /// Options JSON file, or `-` for stdin
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "inkset=debug,inkset_text=debug"
    } else {
        "inkset=info,inkset_text=warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn read_options(input: &Path) -> Result<TextOptions> {
    let json = if input.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read options from stdin")?;
        buffer
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?
    };
    TextOptions::from_json(&json).with_context(|| format!("Invalid options in {}", input.display()))
}

fn fonts(cli: &Cli) -> Result<Arc<dyn FontProvider>> {
    if cli.approximate {
        return Ok(Arc::new(ApproximateFonts));
    }
    let mut config = InksetConfig::load(cli.config.as_deref())?;
    config.fonts.dirs.extend(cli.font_dirs.iter().cloned());
    if cli.no_system_fonts {
        config.fonts.load_system = false;
    }
    Ok(Arc::new(config.font_registry()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let fonts = fonts(&cli)?;

    match &cli.command {
        Command::Measure { input, pretty } => {
            let options = read_options(input)?;
            let measurement = measure_text(options, fonts);
            let json = if *pretty {
                serde_json::to_string_pretty(&measurement)?
            } else {
                serde_json::to_string(&measurement)?
            };
            println!("{}", json);
        }
        Command::Render { input, output } => {
            let options = read_options(input)?;
            let rendering = render_text(options, fonts).context("Failed to render text")?;
            let view = rendering.measurement.view_box;
            let svg = SvgWriter::new(view.width, view.height).write(rendering.surface.commands());
            match output {
                Some(path) => {
                    fs::write(path, svg)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("wrote {}x{} SVG to {}", view.width, view.height, path.display());
                }
                None => print!("{}", svg),
            }
        }
    }
    Ok(())
}
