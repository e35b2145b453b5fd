//! Thumbnail derivation and the `_thumb` naming convention.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};
use thiserror::Error;

use crate::config::ThumbnailConfig;

/// Suffix inserted before the extension of a thumbnail filename.
pub const THUMBNAIL_SUFFIX: &str = "_thumb";

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image has zero width or height")]
    EmptyImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_dimension: 100,
            jpeg_quality: 85,
        }
    }
}

impl From<&ThumbnailConfig> for ThumbnailOptions {
    fn from(config: &ThumbnailConfig) -> Self {
        Self {
            max_dimension: config.max_dimension.max(1),
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

/// Dimensions after scaling so the longer edge equals `max_dimension`.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let scale = |edge: u32, longer: u32| -> u32 {
        let scaled = (f64::from(edge) * f64::from(max_dimension) / f64::from(longer)).round();
        (scaled as u32).max(1)
    };
    if width >= height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}

/// Decode `data`, downscale it and re-encode it.
///
/// The output is PNG when `mime_type` mentions png and JPEG otherwise.
pub fn derive(
    data: &[u8],
    mime_type: &str,
    options: &ThumbnailOptions,
) -> Result<Vec<u8>, ThumbnailError> {
    let source = image::load_from_memory(data).map_err(ThumbnailError::Decode)?;
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(ThumbnailError::EmptyImage);
    }

    let (w, h) = scaled_dimensions(width, height, options.max_dimension);
    let thumb = source.resize_exact(w, h, FilterType::Lanczos3);

    let mut buf = Vec::new();
    if mime_type.to_ascii_lowercase().contains("png") {
        thumb
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(ThumbnailError::Encode)?;
    } else {
        JpegEncoder::new_with_quality(&mut buf, options.jpeg_quality)
            .encode_image(&thumb.to_rgb8())
            .map_err(ThumbnailError::Encode)?;
    }
    Ok(buf)
}

fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) => filename.split_at(pos),
        None => (filename, ""),
    }
}

/// `foo.png` becomes `foo_thumb.png`; `foo` becomes `foo_thumb`.
pub fn thumbnail_name(filename: &str) -> String {
    let (stem, ext) = split_extension(filename);
    format!("{stem}{THUMBNAIL_SUFFIX}{ext}")
}

pub fn is_thumbnail(filename: &str) -> bool {
    let (stem, _) = split_extension(filename);
    stem.ends_with(THUMBNAIL_SUFFIX)
}

/// Inverse of [`thumbnail_name`]. Returns `None` for non-thumbnail names.
pub fn strip_thumbnail_suffix(filename: &str) -> Option<String> {
    let (stem, ext) = split_extension(filename);
    stem.strip_suffix(THUMBNAIL_SUFFIX)
        .map(|original| format!("{original}{ext}"))
}
