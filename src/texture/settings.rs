//! Texture Manager Settings
//!
//! ```rust,ignore
//! use myth_textures::{TextureManagerSettings, StalenessPolicy};
//!
//! // Default: newest request wins, ambient or shared asset runtime
//! let settings = TextureManagerSettings::default();
//!
//! // Plain queue-order semantics on an explicit runtime
//! let settings = TextureManagerSettings {
//!     staleness: StalenessPolicy::ArrivalOrder,
//!     runtime: Some(runtime.handle().clone()),
//!     ..Default::default()
//! };
//! ```

use std::borrow::Cow;
use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};

use crate::resources::SamplerConfig;

/// How commits treat loads for a key that has since been requested again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessPolicy {
    /// Each request takes a per-key sequence number. Completions older than
    /// the key's latest request are discarded at commit without being
    /// realized, and stale failures never force the default.
    ///
    /// The most recently *requested* source always wins, whatever order the
    /// fetches finish in.
    #[default]
    RequestOrder,

    /// Every completion is realized and installed in queue arrival order;
    /// the last one to *arrive* wins.
    ArrivalOrder,
}

/// Configuration for a [`TextureManager`](crate::TextureManager).
#[derive(Debug, Clone)]
pub struct TextureManagerSettings {
    pub staleness: StalenessPolicy,

    /// Runtime for async source resolution. When `None`, the ambient tokio
    /// runtime is used, or a shared asset runtime if there is none.
    pub runtime: Option<Handle>,

    /// Sampler for requests that do not carry one.
    pub default_sampler: SamplerConfig,

    /// Prepended to every GPU debug label.
    pub label_prefix: Cow<'static, str>,
}

impl Default for TextureManagerSettings {
    fn default() -> Self {
        Self {
            staleness: StalenessPolicy::default(),
            runtime: None,
            default_sampler: SamplerConfig::default(),
            label_prefix: Cow::Borrowed("Texture "),
        }
    }
}

impl TextureManagerSettings {
    /// Runtime handle that async loads are spawned on.
    #[must_use]
    pub fn runtime_handle(&self) -> Handle {
        if let Some(handle) = &self.runtime {
            return handle.clone();
        }
        Handle::try_current().unwrap_or_else(|_| asset_runtime().handle().clone())
    }
}

fn asset_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .thread_name("texture-loader")
            .enable_all()
            .build()
            .expect("Failed to create asset loader runtime")
    })
}
