use bytes::Bytes;
use std::path::PathBuf;

/// Mime type used for every encoded or file-backed image part.
pub const PNG_MIME_TYPE: &str = "image/png";

/// Channel layout of a raw [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Luma8,
    Rgb8,
    Rgba8,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Luma8 => 1,
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 => 4,
        }
    }
}

/// Uncompressed 8-bit pixels in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, layout: PixelLayout, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    /// Number of bytes a well-formed buffer of this shape holds.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.layout.channels()
    }
}

/// A reference image as handed over by the caller.
///
/// Sources are never mutated; normalization produces a fresh [`WirePart`].
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// File on local disk, sent as PNG.
    FromPath(PathBuf),
    /// Already-encoded image bytes with their declared mime type.
    FromBytes { data: Bytes, mime_type: String },
    /// Raw pixels, encoded to PNG during normalization.
    FromBitmap(Bitmap),
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ImageSource::FromPath(path.into())
    }

    pub fn from_bytes(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        ImageSource::FromBytes {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn from_bitmap(bitmap: Bitmap) -> Self {
        ImageSource::FromBitmap(bitmap)
    }
}

/// Canonical inline image representation sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePart {
    pub data: Bytes,
    pub mime_type: String,
}

impl WirePart {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn png(data: impl Into<Bytes>) -> Self {
        Self::new(data, PNG_MIME_TYPE)
    }
}
