//! LUSID command-line converter
//!
//! Usage:
//!   lusid adm <INPUT.xml> -o <scene.json>        - ADM XML → LUSID scene
//!   lusid transcode <scene.json> -o <render.json> - LUSID scene → sonoPleth
//!   lusid inspect <scene.json>                   - Summary and diagnostics
//!   lusid pipeline <INPUT.xml> --out-dir <dir>   - ADM → scene → sonoPleth

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lusid_adm::LfeDetection;

use crate::config::LusidConfig;

#[derive(Parser)]
#[command(name = "lusid", version, about = "LUSID scene converter")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write compact (non-indented) JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert ADM XML to a LUSID scene
    Adm {
        /// ADM XML or conformance report
        input: PathBuf,

        /// Output scene file
        #[arg(short, long)]
        output: PathBuf,

        /// Channel activity report (JSON)
        #[arg(long)]
        contains_audio: Option<PathBuf>,

        /// LFE detection strategy (positional or label)
        #[arg(long)]
        lfe: Option<LfeDetection>,
    },
    /// Convert a LUSID scene to sonoPleth render instructions
    Transcode {
        /// Input scene file
        input: PathBuf,

        /// Output render instructions file
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the metadata sidecar here
        #[arg(long)]
        sidecar: Option<PathBuf>,

        /// Output sample rate when the scene has none
        #[arg(long)]
        sample_rate: Option<u32>,
    },
    /// Print a scene summary and its diagnostics
    Inspect {
        /// Input scene file
        input: PathBuf,
    },
    /// ADM XML → scene → render instructions in one directory
    Pipeline {
        /// ADM XML or conformance report
        input: PathBuf,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Channel activity report (JSON)
        #[arg(long)]
        contains_audio: Option<PathBuf>,

        /// LFE detection strategy (positional or label)
        #[arg(long)]
        lfe: Option<LfeDetection>,

        /// Output sample rate when the scene has none
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Skip the metadata sidecar
        #[arg(long)]
        no_sidecar: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => LusidConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LusidConfig::default(),
    };
    if cli.compact {
        config.output.pretty = false;
    }
    let pretty = config.output.pretty;

    match cli.command {
        Commands::Adm {
            input,
            output,
            contains_audio,
            lfe,
        } => {
            if let Some(lfe) = lfe {
                config.adm.lfe_detection = lfe;
            }
            log::info!("LFE detection: {}", config.adm.lfe_detection);
            commands::adm_to_scene(&input, &output, contains_audio.as_deref(), &config.adm, pretty)?;
        }
        Commands::Transcode {
            input,
            output,
            sidecar,
            sample_rate,
        } => {
            if let Some(rate) = sample_rate {
                config.transcode.output_sample_rate = rate;
            }
            config.validate()?;
            commands::transcode_file(&input, &output, sidecar.as_deref(), &config.transcode, pretty)?;
        }
        Commands::Inspect { input } => {
            print!("{}", commands::inspect(&input)?);
        }
        Commands::Pipeline {
            input,
            out_dir,
            contains_audio,
            lfe,
            sample_rate,
            no_sidecar,
        } => {
            if let Some(lfe) = lfe {
                config.adm.lfe_detection = lfe;
            }
            if let Some(rate) = sample_rate {
                config.transcode.output_sample_rate = rate;
            }
            if no_sidecar {
                config.output.write_sidecar = false;
            }
            config.validate()?;

            let outputs = commands::pipeline(
                &input,
                &out_dir,
                contains_audio.as_deref(),
                &config.adm,
                &config.transcode,
                config.output.write_sidecar,
                pretty,
            )?;
            log::info!(
                "Pipeline complete: {} → {}{}",
                outputs.scene.display(),
                outputs.render.display(),
                outputs
                    .sidecar
                    .map(|p| format!(" (+ {})", p.display()))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}
