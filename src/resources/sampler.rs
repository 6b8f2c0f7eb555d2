use wgpu::{AddressMode, FilterMode, MipmapFilterMode};

/// Minification filter, including the four mipmap-bearing modes.
///
/// `wgpu` splits minification into a texel filter and a mipmap filter; the
/// combined form is kept here because whether mip levels exist at all is
/// decided by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    #[default]
    LinearMipmapLinear,
}

impl MinFilter {
    /// Returns `true` for the filters that sample between mip levels.
    #[inline]
    #[must_use]
    pub fn generates_mipmaps(self) -> bool {
        matches!(
            self,
            Self::NearestMipmapNearest
                | Self::LinearMipmapNearest
                | Self::NearestMipmapLinear
                | Self::LinearMipmapLinear
        )
    }

    #[inline]
    #[must_use]
    pub fn filter_mode(self) -> FilterMode {
        match self {
            Self::Nearest | Self::NearestMipmapNearest | Self::NearestMipmapLinear => {
                FilterMode::Nearest
            }
            Self::Linear | Self::LinearMipmapNearest | Self::LinearMipmapLinear => {
                FilterMode::Linear
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn mipmap_filter(self) -> MipmapFilterMode {
        match self {
            Self::NearestMipmapLinear | Self::LinearMipmapLinear => MipmapFilterMode::Linear,
            _ => MipmapFilterMode::Nearest,
        }
    }
}

/// Sampling configuration attached to a texture request.
///
/// Wrap modes and the minification filter feed the power-of-two policy;
/// the whole struct is also the key of the backend's sampler cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerConfig {
    pub wrap_u: AddressMode,
    pub wrap_v: AddressMode,
    pub min_filter: MinFilter,
    pub mag_filter: FilterMode,
    // 1 = off
    pub anisotropy_clamp: u16,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            wrap_u: AddressMode::Repeat,
            wrap_v: AddressMode::Repeat,
            min_filter: MinFilter::LinearMipmapLinear,
            mag_filter: FilterMode::Linear,
            anisotropy_clamp: 1,
        }
    }
}

impl SamplerConfig {
    /// Nearest filtering, clamped on both axes, no mip levels.
    #[must_use]
    pub fn nearest() -> Self {
        Self {
            wrap_u: AddressMode::ClampToEdge,
            wrap_v: AddressMode::ClampToEdge,
            min_filter: MinFilter::Nearest,
            mag_filter: FilterMode::Nearest,
            anisotropy_clamp: 1,
        }
    }

    #[must_use]
    pub fn with_wrap(mut self, wrap_u: AddressMode, wrap_v: AddressMode) -> Self {
        self.wrap_u = wrap_u;
        self.wrap_v = wrap_v;
        self
    }

    #[must_use]
    pub fn with_min_filter(mut self, min_filter: MinFilter) -> Self {
        self.min_filter = min_filter;
        self
    }

    #[must_use]
    pub fn with_mag_filter(mut self, mag_filter: FilterMode) -> Self {
        self.mag_filter = mag_filter;
        self
    }

    /// Returns `true` if either axis wraps with repeat or mirrored repeat.
    #[inline]
    #[must_use]
    pub fn repeats(&self) -> bool {
        [self.wrap_u, self.wrap_v]
            .iter()
            .any(|mode| matches!(mode, AddressMode::Repeat | AddressMode::MirrorRepeat))
    }

    #[must_use]
    pub fn to_descriptor<'a>(&self, label: Option<&'a str>) -> wgpu::SamplerDescriptor<'a> {
        wgpu::SamplerDescriptor {
            label,
            address_mode_u: self.wrap_u,
            address_mode_v: self.wrap_v,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter.filter_mode(),
            mipmap_filter: self.min_filter.mipmap_filter(),
            anisotropy_clamp: self.anisotropy_clamp,
            ..Default::default()
        }
    }
}
