//! Shared fixtures: a recording GPU backend and a reader whose fetches
//! complete only when a test releases them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use tokio::sync::Notify;

use myth_textures::backend::TextureUpload;
use myth_textures::{
    AssetReader, Error, GpuBackend, GpuCapabilities, MemoryAssetReader, Result, SamplerConfig,
    TextureManager, TextureManagerSettings,
};

// ============================================================================
// Mock GPU backend
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTexture {
    pub id: u64,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
    pub sampler: SamplerConfig,
    pub pixels: Arc<Vec<u8>>,
}

impl MockTexture {
    /// RGBA8 texel at (x, y) of level 0.
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

type CreateHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct MockBackend {
    capabilities: GpuCapabilities,
    next_id: AtomicU64,
    created: Mutex<Vec<MockTexture>>,
    destroyed: Mutex<Vec<u64>>,
    mipmapped: Mutex<Vec<u64>>,
    fail_next_create: AtomicBool,
    on_next_create: Mutex<Option<CreateHook>>,
}

pub const DEFAULT_TEXTURE_ID: u64 = 0;

impl MockBackend {
    pub fn new() -> Self {
        Self::with_capabilities(GpuCapabilities::default())
    }

    /// A GPU without unconditional non-power-of-two support.
    pub fn pot_only() -> Self {
        Self::with_capabilities(GpuCapabilities {
            non_power_of_two: false,
            ..Default::default()
        })
    }

    pub fn with_capabilities(capabilities: GpuCapabilities) -> Self {
        Self {
            capabilities,
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// The shared default texture; never goes through `create_texture`.
    pub fn placeholder(&self) -> MockTexture {
        MockTexture {
            id: DEFAULT_TEXTURE_ID,
            label: "default".into(),
            width: 1,
            height: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            mip_level_count: 1,
            sampler: SamplerConfig::nearest(),
            pixels: Arc::new(vec![255; 4]),
        }
    }

    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Runs `hook` inside the next `create_texture` call, before allocating.
    pub fn on_next_create(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_next_create.lock() = Some(Box::new(hook));
    }

    pub fn created(&self) -> Vec<MockTexture> {
        self.created.lock().clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn destroyed(&self) -> Vec<u64> {
        self.destroyed.lock().clone()
    }

    pub fn destroy_count(&self, id: u64) -> usize {
        self.destroyed.lock().iter().filter(|&&d| d == id).count()
    }

    pub fn mipmapped(&self) -> Vec<u64> {
        self.mipmapped.lock().clone()
    }

    /// Created and not yet destroyed.
    pub fn live_ids(&self) -> Vec<u64> {
        let destroyed = self.destroyed.lock();
        self.created
            .lock()
            .iter()
            .map(|t| t.id)
            .filter(|id| !destroyed.contains(id))
            .collect()
    }
}

impl GpuBackend for MockBackend {
    type Texture = MockTexture;

    fn capabilities(&self) -> GpuCapabilities {
        self.capabilities
    }

    fn create_texture(&self, upload: &TextureUpload<'_>) -> Result<MockTexture> {
        let hook = self.on_next_create.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(Error::Gpu("out of memory".into()));
        }
        let texture = MockTexture {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            label: upload.label.to_string(),
            width: upload.width,
            height: upload.height,
            format: upload.format,
            mip_level_count: upload.mip_level_count,
            sampler: *upload.sampler,
            pixels: Arc::new(upload.data.to_vec()),
        };
        self.created.lock().push(texture.clone());
        Ok(texture)
    }

    fn generate_mipmaps(&self, texture: &MockTexture) -> Result<()> {
        self.mipmapped.lock().push(texture.id);
        Ok(())
    }

    fn destroy_texture(&self, texture: MockTexture) {
        assert_ne!(
            texture.id, DEFAULT_TEXTURE_ID,
            "the shared default texture must never be destroyed"
        );
        self.destroyed.lock().push(texture.id);
    }
}

// ============================================================================
// Gated reader
// ============================================================================

/// Serves registered bytes; URIs with a gate wait until it is released.
#[derive(Debug, Clone, Default)]
pub struct GatedReader {
    files: MemoryAssetReader,
    gates: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
}

impl GatedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uri: &str, bytes: Vec<u8>) {
        self.files.insert(uri, bytes);
    }

    /// Holds fetches of `uri` until [`Notify::notify_one`] is called on the
    /// returned gate.
    pub fn gate(&self, uri: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(uri.to_string(), Arc::clone(&gate));
        gate
    }
}

impl AssetReader for GatedReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let gate = self.gates.lock().get(uri).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.files.read_bytes(uri).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    png_bytes(&RgbaImage::from_pixel(width, height, Rgba(color)))
}

pub type TestManager = TextureManager<MockBackend, GatedReader>;

pub fn manager_with(
    backend: MockBackend,
    settings: TextureManagerSettings,
) -> (Arc<MockBackend>, GatedReader, TestManager, MockTexture) {
    init_logger();
    let backend = Arc::new(backend);
    let reader = GatedReader::new();
    let default = backend.placeholder();
    let manager =
        TextureManager::with_reader(Arc::clone(&backend), reader.clone(), default.clone(), settings);
    (backend, reader, manager, default)
}

pub fn manager() -> (Arc<MockBackend>, GatedReader, TestManager, MockTexture) {
    manager_with(MockBackend::new(), TextureManagerSettings::default())
}
