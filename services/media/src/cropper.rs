//! Crop engine
//!
//! Turns a picked image into the fixed-size JPEG that gets uploaded. The
//! rectangle is always expressed in source pixels; zoom only matters while a
//! rectangle is being chosen with [`CropRect::select`].

use image::{GenericImageView, RgbImage, codecs::jpeg::JpegEncoder, io::Reader as ImageReader};
use std::{fmt, io::Cursor, str::FromStr};
use thiserror::Error;
use tracing::debug;

/// JPEG quality used for every encoded crop
pub const JPEG_QUALITY: u8 = 90;

/// Content type of every encoded crop
pub const ENCODED_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum CropError {
    #[error("Failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode cropped image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Crop rectangle is empty")]
    EmptyRect,

    #[error("Crop rectangle {rect} exceeds source bounds {width}x{height}")]
    OutOfBounds { rect: CropRect, width: u32, height: u32 },

    #[error("Zoom must be a finite value of at least 1, got {0}")]
    InvalidZoom(f32),

    #[error("Invalid aspect ratio: {0}")]
    InvalidAspect(String),
}

/// A rectangle in source pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Width to height ratio of a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aspect {
    width: u32,
    height: u32,
}

impl Aspect {
    /// Project cards are 450 by 350
    pub const PROJECT: Aspect = Aspect {
        width: 450,
        height: 350,
    };

    /// Client avatars are square
    pub const CLIENT: Aspect = Aspect {
        width: 1,
        height: 1,
    };

    pub fn new(width: u32, height: u32) -> Result<Self, CropError> {
        if width == 0 || height == 0 {
            return Err(CropError::InvalidAspect(format!("{}:{}", width, height)));
        }
        Ok(Self { width, height })
    }

    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl FromStr for Aspect {
    type Err = CropError;

    /// Parse `W:H`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CropError::InvalidAspect(s.to_string());
        let (width, height) = s.split_once(':').ok_or_else(invalid)?;
        let width = width.trim().parse().map_err(|_| invalid())?;
        let height = height.trim().parse().map_err(|_| invalid())?;
        Aspect::new(width, height)
    }
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle an interactive cropper shows for the given view
    ///
    /// At zoom 1 this is the largest rectangle of `aspect` that fits the
    /// source, centred. Zooming in shrinks it around the same centre, and
    /// `pan` moves that centre by source pixels. The result is clamped so it
    /// never leaves the source.
    pub fn select(
        source_width: u32,
        source_height: u32,
        aspect: Aspect,
        zoom: f32,
        pan: (f32, f32),
    ) -> Result<Self, CropError> {
        if source_width == 0 || source_height == 0 {
            return Err(CropError::EmptyRect);
        }
        check_zoom(zoom)?;

        let (src_w, src_h) = (source_width as f64, source_height as f64);
        let ratio = aspect.ratio();
        let (base_w, base_h) = if src_w / src_h > ratio {
            (src_h * ratio, src_h)
        } else {
            (src_w, src_w / ratio)
        };

        let zoom = zoom as f64;
        let width = ((base_w / zoom).round() as u32).clamp(1, source_width);
        let height = ((base_h / zoom).round() as u32).clamp(1, source_height);

        let left = src_w / 2.0 + pan.0 as f64 - width as f64 / 2.0;
        let top = src_h / 2.0 + pan.1 as f64 - height as f64 / 2.0;
        let x = left.round().clamp(0.0, (source_width - width) as f64) as u32;
        let y = top.round().clamp(0.0, (source_height - height) as f64) as u32;

        Ok(Self::new(x, y, width, height))
    }

    fn check_within(&self, width: u32, height: u32) -> Result<(), CropError> {
        if self.width == 0 || self.height == 0 {
            return Err(CropError::EmptyRect);
        }

        let fits = |start: u32, len: u32, bound: u32| {
            start.checked_add(len).is_some_and(|end| end <= bound)
        };
        if !fits(self.x, self.width, width) || !fits(self.y, self.height, height) {
            return Err(CropError::OutOfBounds {
                rect: *self,
                width,
                height,
            });
        }

        Ok(())
    }
}

/// An encoded crop ready for upload
#[derive(Debug, Clone)]
pub struct EncodedBlob {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Source dimensions, read from the image header without a full decode
pub fn source_dimensions(source: &[u8]) -> Result<(u32, u32), CropError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| CropError::Decode(e.into()))?
        .into_dimensions()
        .map_err(CropError::Decode)
}

/// Crop `rect` out of `source` and encode it as JPEG
///
/// The output is exactly `rect.width` by `rect.height`. `zoom` does not
/// affect the result; it is only checked so that a zoom [`CropRect::select`]
/// would refuse is refused here too.
pub fn crop(source: &[u8], rect: CropRect, zoom: f32) -> Result<EncodedBlob, CropError> {
    // Same domain as `select`.
    check_zoom(zoom)?;
    let pixels = crop_pixels(source, rect)?;

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode_image(&pixels)
        .map_err(CropError::Encode)?;
    debug!("Encoded {} crop into {} bytes", rect, bytes.len());

    Ok(EncodedBlob {
        bytes,
        content_type: ENCODED_CONTENT_TYPE,
        width: pixels.width(),
        height: pixels.height(),
    })
}

/// The raw pixels of `rect`, before encoding
pub fn crop_pixels(source: &[u8], rect: CropRect) -> Result<RgbImage, CropError> {
    let image = image::load_from_memory(source).map_err(CropError::Decode)?;
    let (width, height) = image.dimensions();
    rect.check_within(width, height)?;

    Ok(image
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .to_rgb8())
}

fn check_zoom(zoom: f32) -> Result<(), CropError> {
    if !zoom.is_finite() || zoom < 1.0 {
        return Err(CropError::InvalidZoom(zoom));
    }
    Ok(())
}
