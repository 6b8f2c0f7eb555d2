//! Power-of-two policy.
//!
//! Repeat wrapping and mipmapping are only legal on power-of-two textures
//! unless the GPU lifts that restriction. Decoded images are resized to
//! satisfy it; raw buffers cannot be resized safely and only produce a
//! diagnostic.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::backend::GpuCapabilities;
use crate::resources::SamplerConfig;

/// Returns `true` if the sampler needs power-of-two dimensions: a
/// mipmap-bearing minification filter, or repeat / mirrored-repeat on
/// either axis.
#[inline]
#[must_use]
pub fn requires_power_of_two(sampler: &SamplerConfig) -> bool {
    sampler.min_filter.generates_mipmaps() || sampler.repeats()
}

/// Zero is not a power of two.
#[inline]
#[must_use]
pub fn is_power_of_two(dim: u32) -> bool {
    dim.is_power_of_two()
}

/// Smallest power of two that is `>= dim` (1 for 0).
#[inline]
#[must_use]
pub fn next_power_of_two(dim: u32) -> u32 {
    dim.max(1).next_power_of_two()
}

/// What the factory must do with a source before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotDecision {
    /// Upload at the source size.
    Keep,
    /// Resize a decoded image to these power-of-two dimensions.
    Resize { width: u32, height: u32 },
    /// A raw buffer needs power-of-two dimensions it does not have; it is
    /// uploaded as is and the caller is warned.
    WarnRaw { width: u32, height: u32 },
}

#[must_use]
pub fn decide(
    sampler: &SamplerConfig,
    width: u32,
    height: u32,
    is_raw: bool,
    capabilities: &GpuCapabilities,
) -> PotDecision {
    if capabilities.non_power_of_two || !requires_power_of_two(sampler) {
        return PotDecision::Keep;
    }
    if is_power_of_two(width) && is_power_of_two(height) {
        return PotDecision::Keep;
    }
    if is_raw {
        PotDecision::WarnRaw { width, height }
    } else {
        PotDecision::Resize {
            width: next_power_of_two(width),
            height: next_power_of_two(height),
        }
    }
}

/// Stretches the image over the next power-of-two canvas on each axis.
///
/// UVs in `[0, 1]` keep addressing the whole source, so the origin texel
/// stays at the origin. Images that are already power-of-two sized come
/// back untouched.
#[must_use]
pub fn resize_to_next_power_of_two(image: RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let (new_w, new_h) = (next_power_of_two(width), next_power_of_two(height));
    if (new_w, new_h) == (width, height) {
        return image;
    }
    imageops::resize(&image, new_w, new_h, FilterType::Triangle)
}
