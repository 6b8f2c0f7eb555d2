//! GPU backend seam.
//!
//! The manager never touches GPU objects directly. Everything it needs from
//! the GPU layer goes through [`GpuBackend`]: allocate and upload, build mip
//! levels, destroy, and report capabilities.
//!
//! [`WgpuBackend`] is the production implementation.

pub mod mipmap;
pub mod wgpu_backend;

pub use mipmap::MipmapGenerator;
pub use wgpu_backend::{GpuTexture, WgpuBackend};

use crate::errors::Result;
use crate::resources::SamplerConfig;

/// Capability flags that influence texture creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuCapabilities {
    /// Non-power-of-two textures support repeat wrapping and mipmaps
    /// without restriction.
    pub non_power_of_two: bool,
    /// Largest width or height accepted for a 2D texture.
    pub max_texture_dimension: u32,
}

impl Default for GpuCapabilities {
    fn default() -> Self {
        Self {
            non_power_of_two: true,
            max_texture_dimension: 8192,
        }
    }
}

/// Everything the backend needs to allocate one 2D texture and upload its
/// first mip level.
#[derive(Debug, Clone, Copy)]
pub struct TextureUpload<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    /// 1 when no mip chain is wanted.
    pub mip_level_count: u32,
    pub sampler: &'a SamplerConfig,
    /// Tightly packed level-0 pixels.
    pub data: &'a [u8],
}

/// The GPU resource API consumed by the texture manager.
///
/// `Texture` is a cheap, cloneable handle. Clones handed out by
/// [`TextureManager::get`](crate::TextureManager::get) refer to the same GPU
/// object; [`destroy_texture`](Self::destroy_texture) releases that object
/// for all of them.
pub trait GpuBackend: Send + Sync + 'static {
    type Texture: Clone + Send + Sync + 'static;

    fn capabilities(&self) -> GpuCapabilities;

    /// Whether [`generate_mipmaps`](Self::generate_mipmaps) can fill a mip
    /// chain for `format`. Defaults to the formats every device supports.
    fn supports_mipmaps(&self, format: wgpu::TextureFormat) -> bool {
        is_mipmappable(format, wgpu::Features::empty())
    }

    fn create_texture(&self, upload: &TextureUpload<'_>) -> Result<Self::Texture>;

    /// Fills mip levels 1.. from level 0.
    fn generate_mipmaps(&self, texture: &Self::Texture) -> Result<()>;

    fn destroy_texture(&self, texture: Self::Texture);
}

/// Mip levels are built by filtered render-pass blits, so the format must
/// be renderable and filterable.
#[must_use]
pub fn is_mipmappable(format: wgpu::TextureFormat, device_features: wgpu::Features) -> bool {
    let features = format.guaranteed_format_features(device_features);
    features
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        && features
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
}

/// Full mip chain length for a 2D texture of the given size.
#[inline]
#[must_use]
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}
