use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use rust_pan_zoom::config::Configuration;
use rust_pan_zoom::platform::file_picker;
use rust_pan_zoom::render::{loader, viewer};

#[derive(Debug, Parser)]
#[command(
    name = "pan-zoom",
    version,
    about = "Ken Burns style pan and zoom over a single image"
)]
struct Args {
    /// Image to show; a file dialog is opened when omitted
    #[arg(value_name = "IMAGE")]
    image: Option<PathBuf>,
    /// Path to YAML config
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("rust_pan_zoom={level}").parse()?)
        .add_directive(format!("pan_zoom={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        image,
        config,
        verbose,
    } = Args::parse();
    init_tracing(verbose).context("failed to initialise logging")?;

    let cfg = match config {
        Some(path) => {
            let cfg = Configuration::from_yaml_file(&path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
                .validated()
                .context("invalid configuration values")?;
            tracing::info!("Loaded configuration from {}:\n{:#?}", path.display(), cfg);
            cfg
        }
        None => {
            tracing::debug!("no configuration file given; using defaults");
            Configuration::default()
        }
    };

    let image = match image {
        Some(path) => path,
        None => match file_picker::pick_image() {
            Some(path) => path,
            None => {
                tracing::info!("no image selected; exiting");
                return Ok(());
            }
        },
    };
    if !file_picker::has_image_extension(&image) {
        tracing::warn!(path = %image.display(), "unrecognised image extension; trying anyway");
    }

    let image_size = loader::image_size(&image)
        .with_context(|| format!("failed to read image size of {}", image.display()))?;
    tracing::info!(
        path = %image.display(),
        width = image_size.width,
        height = image_size.height,
        "image chosen"
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    // Runs on the main thread and returns when the window closes or cancellation occurs
    let result = viewer::run_windowed(image, image_size, cfg, cancel.clone()).context("viewer failed");
    cancel.cancel();
    result
}
