use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use image::imageops;

use super::pot::{self, PotDecision};
use super::queue::{LoadedEntry, TextureData};
use crate::backend::{GpuBackend, GpuCapabilities, TextureUpload, full_mip_count};
use crate::errors::Result;

/// Non-fatal findings raised while realizing a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A raw buffer needs power-of-two dimensions for its sampler but cannot
    /// be resized; wrap and mipmap sampling may render incorrectly.
    NonPowerOfTwoRawBuffer {
        key: String,
        width: u32,
        height: u32,
    },
    /// The sampler asks for mipmaps but the format cannot be blitted into
    /// a mip chain; the texture gets a single level.
    MipmapsUnsupported {
        key: String,
        format: wgpu::TextureFormat,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPowerOfTwoRawBuffer { key, width, height } => write!(
                f,
                "texture '{key}' is a {width}x{height} raw buffer; its sampler needs \
                 power-of-two dimensions, uploading without resize"
            ),
            Self::MipmapsUnsupported { key, format } => write!(
                f,
                "texture '{key}' has format {format:?}, which cannot be mipmapped; \
                 uploading a single mip level"
            ),
        }
    }
}

/// Outcome of one realization.
#[derive(Debug)]
pub struct Realized<T> {
    pub texture: T,
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    pub diagnostics: Vec<Diagnostic>,
}

/// Turns loaded entries into GPU textures.
///
/// Never retires anything: whether a previous handle may be destroyed is
/// only known to the manager's table.
pub struct TextureFactory<B: GpuBackend> {
    backend: Arc<B>,
    label_prefix: Cow<'static, str>,
}

impl<B: GpuBackend> TextureFactory<B> {
    pub fn new(backend: Arc<B>, label_prefix: Cow<'static, str>) -> Self {
        Self {
            backend,
            label_prefix,
        }
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn realize(
        &self,
        entry: LoadedEntry,
        capabilities: &GpuCapabilities,
    ) -> Result<Realized<B::Texture>> {
        let LoadedEntry {
            key,
            data,
            sampler,
            format,
            flip_y,
            label,
            ..
        } = entry;

        let (src_w, src_h) = data.dimensions();
        let decision = pot::decide(
            &sampler,
            src_w,
            src_h,
            matches!(data, TextureData::Raw(_)),
            capabilities,
        );

        let mut diagnostics = Vec::new();
        let (pixels, format, width, height) = match data {
            TextureData::Raw(buffer) => {
                if let PotDecision::WarnRaw { width, height } = decision {
                    let diagnostic = Diagnostic::NonPowerOfTwoRawBuffer {
                        key: key.clone(),
                        width,
                        height,
                    };
                    log::warn!("{diagnostic}");
                    diagnostics.push(diagnostic);
                }
                (buffer.data, buffer.format, buffer.width, buffer.height)
            }
            TextureData::Image(mut image) => {
                if flip_y {
                    imageops::flip_vertical_in_place(&mut image);
                }
                if let PotDecision::Resize { width, height } = decision {
                    log::debug!(
                        "Resizing '{key}' from {src_w}x{src_h} to {width}x{height} for sampling"
                    );
                    image = pot::resize_to_next_power_of_two(image);
                }
                let (width, height) = image.dimensions();
                (image.into_raw(), format, width, height)
            }
        };

        let mut generate_mipmap = sampler.min_filter.generates_mipmaps();
        if generate_mipmap && !self.backend.supports_mipmaps(format) {
            let diagnostic = Diagnostic::MipmapsUnsupported {
                key: key.clone(),
                format,
            };
            log::warn!("{diagnostic}");
            diagnostics.push(diagnostic);
            generate_mipmap = false;
        }

        let mip_level_count = if generate_mipmap {
            full_mip_count(width, height)
        } else {
            1
        };

        let full_label = format!("{}{label}", self.label_prefix);
        let texture = self.backend.create_texture(&TextureUpload {
            label: &full_label,
            width,
            height,
            format,
            mip_level_count,
            sampler: &sampler,
            data: &pixels,
        })?;

        if generate_mipmap && let Err(err) = self.backend.generate_mipmaps(&texture) {
            self.backend.destroy_texture(texture);
            return Err(err);
        }

        log::debug!("Realized '{key}' as {width}x{height} ({mip_level_count} mip levels)");

        Ok(Realized {
            texture,
            width,
            height,
            mip_level_count,
            diagnostics,
        })
    }
}
