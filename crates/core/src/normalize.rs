//! Turns caller-supplied [`ImageSource`]s into inline [`WirePart`]s.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use tracing::debug;

use crate::genview_core::SdkError;
use crate::genview_types::image::{Bitmap, ImageSource, PixelLayout, WirePart};

/// Longest side a bitmap is allowed to keep before it is downsampled.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Normalize one source.
///
/// Files are read whole and sent as PNG; encoded bytes pass through with
/// their declared mime type; bitmaps are encoded to PNG after an optional
/// Lanczos downsample that keeps the aspect ratio.
pub async fn normalize(
    source: &ImageSource,
    max_dimension: Option<u32>,
) -> Result<WirePart, SdkError> {
    match source {
        ImageSource::FromPath(path) => {
            let data = tokio::fs::read(path).await?;
            debug!(
                target: "genview::normalize",
                path = %path.display(),
                bytes = data.len(),
                "read image file"
            );
            Ok(WirePart::png(data))
        }
        ImageSource::FromBytes { data, mime_type } => {
            if mime_type.trim().is_empty() {
                return Err(SdkError::invalid_argument(
                    "image bytes were supplied without a mime type",
                ));
            }
            if data.is_empty() {
                return Err(SdkError::invalid_argument("image bytes are empty"));
            }
            Ok(WirePart::new(data.clone(), mime_type.clone()))
        }
        ImageSource::FromBitmap(bitmap) => encode_bitmap(bitmap, max_dimension),
    }
}

/// Normalize every source in order, stopping at the first failure.
pub async fn normalize_all(
    sources: &[ImageSource],
    max_dimension: Option<u32>,
) -> Result<Vec<WirePart>, SdkError> {
    let mut parts = Vec::with_capacity(sources.len());
    for source in sources {
        parts.push(normalize(source, max_dimension).await?);
    }
    Ok(parts)
}

fn encode_bitmap(bitmap: &Bitmap, max_dimension: Option<u32>) -> Result<WirePart, SdkError> {
    if max_dimension == Some(0) {
        return Err(SdkError::invalid_argument("max_dimension must be positive"));
    }
    let img = bitmap_to_image(bitmap)?;
    let img = match max_dimension {
        Some(max) if img.width() > max || img.height() > max => {
            let resized = img.resize(max, max, FilterType::Lanczos3);
            debug!(
                target: "genview::normalize",
                from_width = img.width(),
                from_height = img.height(),
                to_width = resized.width(),
                to_height = resized.height(),
                "downsampled bitmap"
            );
            resized
        }
        _ => img,
    };

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(WirePart::png(buf.into_inner()))
}

fn bitmap_to_image(bitmap: &Bitmap) -> Result<DynamicImage, SdkError> {
    if bitmap.width == 0 || bitmap.height == 0 {
        return Err(SdkError::invalid_argument(format!(
            "bitmap has zero size ({}x{})",
            bitmap.width, bitmap.height
        )));
    }
    if bitmap.pixels.len() != bitmap.expected_len() {
        return Err(SdkError::invalid_argument(format!(
            "bitmap buffer holds {} bytes, expected {} for {}x{} {:?}",
            bitmap.pixels.len(),
            bitmap.expected_len(),
            bitmap.width,
            bitmap.height,
            bitmap.layout
        )));
    }

    let (w, h, pixels) = (bitmap.width, bitmap.height, bitmap.pixels.clone());
    let img = match bitmap.layout {
        PixelLayout::Luma8 => GrayImage::from_raw(w, h, pixels).map(DynamicImage::ImageLuma8),
        PixelLayout::Rgb8 => RgbImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgb8),
        PixelLayout::Rgba8 => RgbaImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgba8),
    };
    img.ok_or_else(|| SdkError::invalid_argument("bitmap buffer does not match its dimensions"))
}
