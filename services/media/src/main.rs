use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod cropper;
mod uploader;

use crate::{
    cropper::{Aspect, CropRect, EncodedBlob},
    uploader::{RecordKind, UploadRequest, Uploader},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Crop images and upload them to the site", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crop an image and write the JPEG to disk
    Crop {
        /// Source image
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the cropped JPEG
        #[arg(short, long)]
        output: PathBuf,

        /// Record kind whose aspect ratio is used for automatic selection
        #[arg(long, value_enum, default_value_t = RecordKind::Project)]
        kind: RecordKind,

        #[command(flatten)]
        crop: CropArgs,
    },

    /// Create or update a project or client, optionally with a cropped image
    Upload {
        #[arg(long, value_enum)]
        kind: RecordKind,

        /// Update this record instead of creating one
        #[arg(long)]
        id: Option<Uuid>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Client designation, ignored for projects
        #[arg(long)]
        designation: Option<String>,

        /// Source image, cropped before upload
        #[arg(long)]
        image: Option<PathBuf>,

        #[command(flatten)]
        crop: CropArgs,

        #[arg(long, env = "AUTH_URL", default_value = "http://localhost:3000")]
        auth_url: String,

        #[arg(long, env = "API_URL", default_value = "http://localhost:3001")]
        api_url: String,

        #[arg(long, env = "ADMIN_USER", default_value = "admin")]
        username: String,

        #[arg(long, env = "ADMIN_PASS", hide_env_values = true)]
        password: String,
    },
}

/// Crop rectangle, either explicit or selected from zoom and pan
#[derive(Args, Debug, Clone)]
struct CropArgs {
    /// Left edge of the crop in source pixels
    #[arg(long, requires_all = ["y", "width", "height"])]
    x: Option<u32>,

    #[arg(long, requires = "x")]
    y: Option<u32>,

    #[arg(long, requires = "x")]
    width: Option<u32>,

    #[arg(long, requires = "x")]
    height: Option<u32>,

    /// Zoom used to select the crop when no rectangle is given
    #[arg(long, default_value_t = 1.0)]
    zoom: f32,

    /// Horizontal offset of the selection centre in source pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_x: f32,

    /// Vertical offset of the selection centre in source pixels
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pan_y: f32,

    /// Aspect ratio as W:H, defaults to the record kind's
    #[arg(long)]
    aspect: Option<Aspect>,
}

impl CropArgs {
    fn rect(&self, source: &[u8], kind: RecordKind) -> Result<CropRect> {
        if let (Some(x), Some(y), Some(width), Some(height)) =
            (self.x, self.y, self.width, self.height)
        {
            return Ok(CropRect::new(x, y, width, height));
        }

        let (width, height) = cropper::source_dimensions(source)?;
        let aspect = self.aspect.unwrap_or_else(|| kind.aspect());
        Ok(CropRect::select(
            width,
            height,
            aspect,
            self.zoom,
            (self.pan_x, self.pan_y),
        )?)
    }
}

/// Read and crop a source image off the async runtime
async fn crop_file(path: &Path, args: CropArgs, kind: RecordKind) -> Result<EncodedBlob> {
    let source = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    tokio::task::spawn_blocking(move || -> Result<EncodedBlob> {
        let rect = args.rect(&source, kind)?;
        info!("Cropping {} at zoom {}", rect, args.zoom);
        Ok(cropper::crop(&source, rect, args.zoom)?)
    })
    .await?
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Crop {
            input,
            output,
            kind,
            crop,
        } => {
            let blob = crop_file(&input, crop, kind).await?;
            tokio::fs::write(&output, &blob.bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Wrote {}x{} crop to {}",
                blob.width,
                blob.height,
                output.display()
            );
        }
        Command::Upload {
            kind,
            id,
            name,
            description,
            designation,
            image,
            crop,
            auth_url,
            api_url,
            username,
            password,
        } => {
            let image = match image {
                Some(path) => Some(crop_file(&path, crop, kind).await?),
                None => None,
            };

            let uploader = Uploader::new(auth_url, api_url)?;
            uploader.login(&username, &password).await?;

            let record = uploader
                .upload(
                    kind,
                    UploadRequest {
                        id,
                        name,
                        description,
                        designation,
                        image,
                    },
                )
                .await?;

            println!("{}", record.id);
            info!("{} available at {}", record.name, record.image);
        }
    }

    Ok(())
}
