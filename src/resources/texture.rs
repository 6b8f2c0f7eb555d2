use wgpu::TextureFormat;

use crate::errors::{Error, Result};
use crate::resources::sampler::SamplerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

impl ColorSpace {
    /// Upload format for decoded RGBA8 images in this color space.
    #[inline]
    #[must_use]
    pub fn rgba8_format(self) -> TextureFormat {
        match self {
            ColorSpace::Srgb => TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => TextureFormat::Rgba8Unorm,
        }
    }
}

// ============================================================================
// Raw pixel buffers
// ============================================================================

/// Pixels already laid out for upload.
///
/// The format fixes both the channel layout and the component datatype.
/// Rows are tightly packed and in upload order; raw buffers are never
/// resized or flipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl RawBuffer {
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Shorthand for a linear `Rgba8Unorm` buffer.
    #[must_use]
    pub fn rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::new(data, width, height, TextureFormat::Rgba8Unorm)
    }

    /// Bytes per tightly packed row, or `None` for formats without a single
    /// copyable aspect (combined depth-stencil).
    #[must_use]
    pub fn bytes_per_row(&self) -> Option<u32> {
        let block_size = self.format.block_copy_size(None)?;
        let (block_w, _) = self.format.block_dimensions();
        Some(self.width.div_ceil(block_w) * block_size)
    }

    #[must_use]
    pub fn expected_len(&self) -> Option<usize> {
        let (_, block_h) = self.format.block_dimensions();
        let rows = self.height.div_ceil(block_h) as usize;
        Some(self.bytes_per_row()? as usize * rows)
    }

    /// Checks dimensions and length against the format.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidRequest(format!(
                "raw buffer has zero extent ({}x{})",
                self.width, self.height
            )));
        }
        let Some(expected) = self.expected_len() else {
            return Err(Error::InvalidRequest(format!(
                "format {:?} cannot be uploaded from a raw buffer",
                self.format
            )));
        };
        if self.data.len() != expected {
            return Err(Error::InvalidRequest(format!(
                "raw buffer of {}x{} {:?} needs {expected} bytes, got {}",
                self.width,
                self.height,
                self.format,
                self.data.len()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Where the pixels of a request come from.
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Upload-ready pixels; staged without an async hop.
    Raw(RawBuffer),
    /// Path or URL resolved through the manager's asset reader.
    Uri(String),
    /// Encoded image bytes (PNG, JPEG, ...) already in memory.
    Encoded(Vec<u8>),
}

impl TextureSource {
    #[inline]
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// A request to load a texture into a keyed slot.
#[derive(Debug, Clone)]
pub struct TextureRequest {
    pub source: TextureSource,
    /// Falls back to the manager's default sampler when `None`.
    pub sampler: Option<SamplerConfig>,
    /// Only used for decoded images.
    pub color_space: ColorSpace,
    /// Flip decoded images vertically before upload.
    pub flip_y: bool,
    pub label: Option<String>,
}

impl TextureRequest {
    #[must_use]
    pub fn new(source: TextureSource) -> Self {
        Self {
            source,
            sampler: None,
            color_space: ColorSpace::default(),
            flip_y: false,
            label: None,
        }
    }

    #[must_use]
    pub fn raw(buffer: RawBuffer) -> Self {
        Self::new(TextureSource::Raw(buffer))
    }

    #[must_use]
    pub fn uri(uri: impl Into<String>) -> Self {
        Self::new(TextureSource::Uri(uri.into()))
    }

    #[must_use]
    pub fn encoded(bytes: Vec<u8>) -> Self {
        Self::new(TextureSource::Encoded(bytes))
    }

    #[must_use]
    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = Some(sampler);
        self
    }

    #[must_use]
    pub fn with_color_space(mut self, color_space: ColorSpace) -> Self {
        self.color_space = color_space;
        self
    }

    #[must_use]
    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
