//! plate – command-line client for plate-server.
//!
//! Reads a local photo, submits it for a menu-ready transform and prints (or
//! downloads) the result.

mod client;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plate_core::{OutputFormat, Quality};

use crate::client::{PlateClient, TransformOptions};

#[derive(Debug, Parser)]
#[command(name = "plate", version, about = "Turn food photos into menu-ready images")]
struct Cli {
    /// Base URL of the plate-server instance.
    #[arg(long, env = "PLATE_SERVER", default_value = "http://localhost:3000", global = true)]
    server: String,

    /// Give up after this many seconds (default: wait for the server).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log verbosity passed to the tracing filter.
    #[arg(long, default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a photo and request a transformed version.
    Transform {
        /// Photo to upload.
        image: PathBuf,

        /// Instruction for the generator (server default when omitted).
        #[arg(long)]
        prompt: Option<String>,

        /// low | medium | high
        #[arg(long)]
        quality: Option<Quality>,

        /// jpeg | png | webp
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Also download the result to this path.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check that the server is up.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&cli.log)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = PlateClient::new(&cli.server, cli.timeout_secs.map(Duration::from_secs))?;

    match cli.command {
        Command::Transform { image, prompt, quality, format, output } => {
            eprintln!("Transforming {} ...", image.display());
            let resp = client
                .transform_file(&image, TransformOptions { prompt, quality, format })
                .await
                .with_context(|| format!("transform of {} failed", image.display()))?;

            let m = &resp.metadata;
            println!("{}", resp.url);
            eprintln!(
                "  {} -> {} bytes, {} / {} quality, {} ms",
                m.original_size, m.transformed_size, m.format, m.quality, m.processing_time_ms
            );

            if let Some(dest) = output {
                let n = client
                    .download(&resp.url, &dest)
                    .await
                    .with_context(|| format!("failed to download {}", resp.url))?;
                eprintln!("  saved {n} bytes to {}", dest.display());
            }
        }
        Command::Health => {
            let body = client.health().await.context("health check failed")?;
            println!("{body}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_transform_options() {
        let cli = Cli::try_parse_from([
            "plate", "transform", "dish.jpg", "--quality", "medium", "--format", "webp", "-o", "out.webp",
        ])
        .unwrap();
        match cli.command {
            Command::Transform { image, quality, format, output, prompt } => {
                assert_eq!(image, PathBuf::from("dish.jpg"));
                assert_eq!(quality, Some(Quality::Medium));
                assert_eq!(format, Some(OutputFormat::Webp));
                assert_eq!(output, Some(PathBuf::from("out.webp")));
                assert!(prompt.is_none());
            }
            Command::Health => panic!("expected transform"),
        }
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["plate", "transform", "dish.jpg", "--format", "bmp"]).is_err());
    }
}
