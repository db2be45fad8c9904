//! Command-line front end for the photo registry.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use eyre::{OptionExt, WrapErr};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use photo_registry::{ArcCamera, Config, ImportCamera, PhotoRegistry};

/// Capture, list and delete photos.
#[derive(Debug, Parser)]
#[command(name = "photos", version)]
struct Cli {
    /// TOML configuration file. Without one, photos are kept under `./photos`.
    #[arg(short, long, env = "PHOTOS_CONFIG")]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List photos, newest first.
    List,

    /// Capture a photo by importing an image file.
    Capture {
        /// Image to import.
        image: Utf8PathBuf,
    },

    /// Delete the photo at a position in the list.
    Delete {
        /// Position, as shown by `list`.
        position: usize,
    },

    /// Delete the photo stored at a file path.
    Remove {
        /// File path, as shown by `list`.
        file_path: String,
    },

    /// Write a photo's image bytes to a file.
    Export {
        /// Position, as shown by `list`.
        position: usize,

        /// Destination file.
        output: Utf8PathBuf,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_error::ErrorLayer::default())
        .init();
}

fn load_config(path: Option<&Utf8Path>) -> eyre::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::local(Utf8Path::new("photos")));
    };

    let contents =
        std::fs::read_to_string(path).wrap_err_with(|| format!("read config file {path}"))?;
    toml_edit::de::from_str(&contents).wrap_err_with(|| format!("parse config file {path}"))
}

fn print_photos(registry: &PhotoRegistry) {
    for (position, photo) in registry.iter().enumerate() {
        println!(
            "{position}\t{}\t{}",
            photo.file_path(),
            photo.display_path().unwrap_or("-")
        );
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let camera: ArcCamera = match &cli.command {
        Command::Capture { image } => Arc::new(ImportCamera::new(image.clone())),
        _ => Arc::new(ImportCamera::empty()),
    };

    let mut registry = config
        .build(camera)
        .await
        .wrap_err("set up photo registry")?;
    registry.hydrate().await.wrap_err("load saved photos")?;

    match cli.command {
        Command::List => print_photos(&registry),
        Command::Capture { .. } => match registry.capture().await.wrap_err("capture photo")? {
            Some(photo) => println!("{}", photo.file_path()),
            None => tracing::info!("Nothing captured"),
        },
        Command::Delete { position } => {
            let photo = registry
                .get(position)
                .cloned()
                .ok_or_eyre("no photo at that position")?;
            registry
                .delete(&photo, position)
                .await
                .wrap_err_with(|| format!("delete {}", photo.file_path()))?;
            print_photos(&registry);
        }
        Command::Remove { file_path } => {
            registry
                .remove(&file_path)
                .await
                .wrap_err_with(|| format!("delete {file_path}"))?;
            print_photos(&registry);
        }
        Command::Export { position, output } => {
            let photo = registry
                .get(position)
                .ok_or_eyre("no photo at that position")?;
            let bytes = registry
                .displayable_bytes(photo)
                .await
                .wrap_err_with(|| format!("load {}", photo.file_path()))?;
            tokio::fs::write(&output, &bytes)
                .await
                .wrap_err_with(|| format!("write {output}"))?;
            tracing::info!(size = bytes.len(), "Exported to {output}");
        }
    }

    Ok(())
}
