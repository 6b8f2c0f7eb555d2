//! `wgpu` implementation of [`GpuBackend`].
//!
//! - `GpuTexture`: physical texture plus its default view and a cached sampler
//! - `WgpuBackend`: owns device/queue, the sampler cache and the mip generator

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{GpuBackend, GpuCapabilities, MipmapGenerator, TextureUpload, is_mipmappable};
use crate::errors::{Error, Result};
use crate::resources::SamplerConfig;

static NEXT_GPU_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug)]
pub struct GpuTextureInner {
    pub id: u64,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: wgpu::Extent3d,
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
}

/// Shared handle to a realized texture.
#[derive(Debug, Clone)]
pub struct GpuTexture(Arc<GpuTextureInner>);

impl GpuTexture {
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.size.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.size.height
    }
}

impl PartialEq for GpuTexture {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for GpuTexture {}

impl Deref for GpuTexture {
    type Target = GpuTextureInner;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Captures every wgpu error raised between `start` and `finish`, so that
/// failures come back as [`Error::Gpu`] instead of reaching the device's
/// uncaptured-error handler.
///
/// Scopes are per thread; `finish` must run on the thread that started it.
struct ErrorScope {
    // Innermost first, so a scope dropped without `finish` pops in order.
    internal: wgpu::ErrorScopeGuard,
    out_of_memory: wgpu::ErrorScopeGuard,
    validation: wgpu::ErrorScopeGuard,
}

impl ErrorScope {
    fn start(device: &wgpu::Device) -> Self {
        let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let out_of_memory = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let internal = device.push_error_scope(wgpu::ErrorFilter::Internal);
        Self {
            internal,
            out_of_memory,
            validation,
        }
    }

    fn finish(self, context: &str) -> Result<()> {
        let internal = pollster::block_on(self.internal.pop());
        let out_of_memory = pollster::block_on(self.out_of_memory.pop());
        let validation = pollster::block_on(self.validation.pop());
        match internal.or(out_of_memory).or(validation) {
            Some(err) => Err(Error::Gpu(format!("{context}: {err}"))),
            None => Ok(()),
        }
    }
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    capabilities: GpuCapabilities,
    samplers: Mutex<FxHashMap<SamplerConfig, wgpu::Sampler>>,
    mipmaps: Mutex<MipmapGenerator>,
}

impl WgpuBackend {
    #[must_use]
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        downlevel: &wgpu::DownlevelCapabilities,
    ) -> Self {
        let capabilities = GpuCapabilities {
            non_power_of_two: downlevel
                .flags
                .contains(wgpu::DownlevelFlags::NON_POWER_OF_TWO_MIPMAPPED_TEXTURES),
            max_texture_dimension: device.limits().max_texture_dimension_2d,
        };
        let mipmaps = Mutex::new(MipmapGenerator::new(&device));
        Self {
            device,
            queue,
            capabilities,
            samplers: Mutex::new(FxHashMap::default()),
            mipmaps,
        }
    }

    /// Requests an adapter and device without a surface.
    pub async fn request_headless(power_preference: wgpu::PowerPreference) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Gpu(format!("Failed to request adapter: {e}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Texture Manager Device"),
                ..Default::default()
            })
            .await
            .map_err(|e| Error::Gpu(format!("Failed to create device: {e}")))?;

        Ok(Self::new(device, queue, &adapter.get_downlevel_capabilities()))
    }

    /// Blocking variant of [`request_headless`](Self::request_headless).
    pub fn request_headless_blocking(power_preference: wgpu::PowerPreference) -> Result<Self> {
        pollster::block_on(Self::request_headless(power_preference))
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// 1x1 solid-color texture, suitable as the manager's shared default.
    ///
    /// The caller owns it; the manager never destroys it.
    pub fn create_placeholder(&self, color: [u8; 4]) -> Result<GpuTexture> {
        let sampler = SamplerConfig::nearest();
        self.create_texture(&TextureUpload {
            label: "Default Texture",
            width: 1,
            height: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            mip_level_count: 1,
            sampler: &sampler,
            data: &color,
        })
    }

    fn get_or_create_sampler(&self, config: &SamplerConfig, label: &str) -> wgpu::Sampler {
        self.samplers
            .lock()
            .entry(*config)
            .or_insert_with(|| self.device.create_sampler(&config.to_descriptor(Some(label))))
            .clone()
    }
}

impl GpuBackend for WgpuBackend {
    type Texture = GpuTexture;

    fn capabilities(&self) -> GpuCapabilities {
        self.capabilities
    }

    fn supports_mipmaps(&self, format: wgpu::TextureFormat) -> bool {
        is_mipmappable(format, self.device.features())
    }

    fn create_texture(&self, upload: &TextureUpload<'_>) -> Result<GpuTexture> {
        let max = self.capabilities.max_texture_dimension;
        if upload.width == 0 || upload.height == 0 || upload.width > max || upload.height > max {
            return Err(Error::Gpu(format!(
                "cannot allocate {}x{} texture '{}' (limit {max})",
                upload.width, upload.height, upload.label
            )));
        }
        let block_size = upload.format.block_copy_size(None).ok_or_else(|| {
            Error::Gpu(format!("format {:?} is not copyable", upload.format))
        })?;
        let (block_w, block_h) = upload.format.block_dimensions();

        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if upload.mip_level_count > 1 {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let size = wgpu::Extent3d {
            width: upload.width,
            height: upload.height,
            depth_or_array_layers: 1,
        };

        let scope = ErrorScope::start(&self.device);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(upload.label),
            size,
            mip_level_count: upload.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: upload.format,
            usage,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(upload.width.div_ceil(block_w) * block_size),
                rows_per_image: Some(upload.height.div_ceil(block_h)),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(upload.label),
            format: Some(upload.format),
            dimension: Some(wgpu::TextureViewDimension::D2),
            ..Default::default()
        });
        let sampler = self.get_or_create_sampler(upload.sampler, upload.label);

        if let Err(err) = scope.finish(&format!("creating texture '{}'", upload.label)) {
            texture.destroy();
            return Err(err);
        }

        Ok(GpuTexture(Arc::new(GpuTextureInner {
            id: NEXT_GPU_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
            texture,
            view,
            sampler,
            size,
            format: upload.format,
            mip_level_count: upload.mip_level_count,
        })))
    }

    fn generate_mipmaps(&self, texture: &GpuTexture) -> Result<()> {
        if texture.mip_level_count < 2 {
            return Ok(());
        }
        if !self.supports_mipmaps(texture.format) {
            return Err(Error::Gpu(format!(
                "cannot generate mipmaps for {:?} textures",
                texture.format
            )));
        }

        let scope = ErrorScope::start(&self.device);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Mipmap Gen"),
            });
        self.mipmaps
            .lock()
            .generate(&self.device, &mut encoder, &texture.texture);
        self.queue.submit(Some(encoder.finish()));
        scope.finish("generating mipmaps")
    }

    fn destroy_texture(&self, texture: GpuTexture) {
        texture.texture.destroy();
    }
}
