//! Asynchronous GPU texture manager.
//!
//! Texture requests are identified by string keys. Each one is resolved in
//! the background (fetched and decoded, or taken as an upload-ready raw
//! buffer) and realized on the GPU once per frame by
//! [`TextureManager::commit`]. Power-of-two constraints from the sampler
//! are enforced at creation time. Superseded textures are destroyed in the
//! same step that installs their replacement, and the shared default
//! texture is never destroyed.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use myth_textures::{RawBuffer, SamplerConfig, TextureManager, TextureRequest, WgpuBackend};
//!
//! let backend = Arc::new(WgpuBackend::request_headless_blocking(Default::default())?);
//! let default = backend.create_placeholder([255, 255, 255, 255])?;
//! let mut textures = TextureManager::new(backend, default.clone());
//!
//! textures.request_load(
//!     "ground",
//!     TextureRequest::raw(RawBuffer::rgba8(4, 4, vec![128; 64]))
//!         .with_sampler(SamplerConfig::nearest()),
//! )?;
//! let _ = textures.request_load("sky", TextureRequest::uri("textures/sky.png"));
//!
//! // Once per frame:
//! textures.commit(frame_index, &default)?;
//! let ground = textures.get("ground")?;
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod assets;
pub mod backend;
pub mod errors;
pub mod resources;
pub mod texture;

pub use assets::{AssetReader, AssetReaderVariant, FileAssetReader, MemoryAssetReader};
pub use backend::{GpuBackend, GpuCapabilities, GpuTexture, TextureUpload, WgpuBackend};
pub use errors::{AssetError, Error, Result};
pub use resources::{ColorSpace, MinFilter, RawBuffer, SamplerConfig, TextureRequest, TextureSource};
pub use texture::{
    CommitReport, Diagnostic, FrameToken, PendingLoad, StalenessPolicy, TextureManager,
    TextureManagerSettings, TextureStatus,
};
