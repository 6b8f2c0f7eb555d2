//! Texture Manager
//!
//! Owns the key → texture table and the three timelines that feed it:
//!
//! - `request_load` stages raw buffers at once and spawns async resolution
//!   for everything else
//! - completions append to the [`LoadQueue`]; failures install the shared
//!   default straight away
//! - `commit`, once per frame, drains the queue, realizes each entry and
//!   swaps it into the table, destroying whatever it replaces
//!
//! Slots holding the default are tagged, so the default is never destroyed.

use std::collections::VecDeque;
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::factory::{Diagnostic, TextureFactory};
use super::queue::{LoadQueue, LoadSender, LoadedEntry, TextureData};
use super::settings::{StalenessPolicy, TextureManagerSettings};
use super::table::{TextureSlot, TextureStatus, TextureTable};
use crate::assets::{AssetReader, AssetReaderVariant, decode_image_async};
use crate::backend::GpuBackend;
use crate::errors::{Error, Result};
use crate::resources::{TextureRequest, TextureSource};

/// Monotonically increasing frame identifier supplied by the frame driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameToken(pub u64);

impl From<u64> for FrameToken {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// What one `commit` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub frame: FrameToken,
    /// The token matched the previous commit; nothing was done.
    pub skipped: bool,
    pub realized: usize,
    /// Owned textures destroyed because something replaced them.
    pub retired: usize,
    /// Entries dropped unrealized because a newer request exists.
    pub discarded_stale: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CommitReport {
    fn new(frame: FrameToken) -> Self {
        Self {
            frame,
            skipped: false,
            realized: 0,
            retired: 0,
            discarded_stale: 0,
            diagnostics: Vec::new(),
        }
    }

    fn skipped(frame: FrameToken) -> Self {
        Self {
            skipped: true,
            ..Self::new(frame)
        }
    }
}

/// Handle to an in-flight load.
///
/// Dropping it does not cancel the load.
#[derive(Debug)]
#[must_use = "drop the PendingLoad explicitly if the completion is not awaited"]
pub struct PendingLoad {
    task: Option<JoinHandle<()>>,
}

impl PendingLoad {
    fn ready() -> Self {
        Self { task: None }
    }

    /// `true` once the completion has landed in the queue or the table.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits until the completion has landed in the queue or the table.
    pub async fn finished(self) -> Result<()> {
        if let Some(task) = self.task {
            task.await?;
        }
        Ok(())
    }
}

enum AsyncSource {
    Uri(String),
    Encoded(Vec<u8>),
}

type SharedTable<T> = Arc<Mutex<TextureTable<T>>>;

pub struct TextureManager<B: GpuBackend, R: AssetReader = AssetReaderVariant> {
    backend: Arc<B>,
    reader: Arc<R>,
    factory: TextureFactory<B>,
    queue: LoadQueue,
    table: SharedTable<B::Texture>,
    // Entries left over by a commit that failed part-way.
    carry: VecDeque<LoadedEntry>,
    last_frame: Option<FrameToken>,
    settings: TextureManagerSettings,
    runtime: Handle,
}

impl<B: GpuBackend> TextureManager<B> {
    /// Manager reading files relative to the working directory.
    pub fn new(backend: Arc<B>, default_texture: B::Texture) -> Self {
        Self::with_reader(
            backend,
            AssetReaderVariant::default(),
            default_texture,
            TextureManagerSettings::default(),
        )
    }
}

impl<B: GpuBackend, R: AssetReader> TextureManager<B, R> {
    /// `default_texture` stands in for failed keys until the first
    /// `commit` supplies the frame's default.
    pub fn with_reader(
        backend: Arc<B>,
        reader: R,
        default_texture: B::Texture,
        settings: TextureManagerSettings,
    ) -> Self {
        let factory = TextureFactory::new(Arc::clone(&backend), settings.label_prefix.clone());
        let runtime = settings.runtime_handle();
        Self {
            backend,
            reader: Arc::new(reader),
            factory,
            queue: LoadQueue::new(),
            table: Arc::new(Mutex::new(TextureTable::new(default_texture))),
            carry: VecDeque::new(),
            last_frame: None,
            settings,
            runtime,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &TextureManagerSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.table.lock().is_destroyed() {
            Err(Error::Destroyed)
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Starts loading `request` into the slot for `key`.
    ///
    /// Raw buffers are queued immediately and show up after the next
    /// `commit`. Other sources resolve asynchronously; if resolution fails,
    /// the key falls back to the default texture without waiting for a
    /// commit. Resolution failures are never returned from here.
    pub fn request_load(
        &self,
        key: impl Into<String>,
        request: TextureRequest,
    ) -> Result<PendingLoad> {
        self.ensure_alive()?;
        let key = key.into();
        let TextureRequest {
            source,
            sampler,
            color_space,
            flip_y,
            label,
        } = request;
        let sampler = sampler.unwrap_or(self.settings.default_sampler);

        let source = match source {
            TextureSource::Raw(buffer) => {
                buffer.validate()?;
                let seq = {
                    let mut table = self.table.lock();
                    if table.is_destroyed() {
                        return Err(Error::Destroyed);
                    }
                    table.issue(&key)
                };
                log::debug!("Staging raw buffer for '{key}' (seq {seq})");
                self.queue.enqueue(LoadedEntry {
                    label: label.unwrap_or_else(|| key.clone()),
                    key,
                    seq,
                    format: buffer.format,
                    data: TextureData::Raw(buffer),
                    sampler,
                    flip_y: false,
                });
                return Ok(PendingLoad::ready());
            }
            TextureSource::Uri(uri) => AsyncSource::Uri(uri),
            TextureSource::Encoded(bytes) => AsyncSource::Encoded(bytes),
        };

        let seq = {
            let mut table = self.table.lock();
            if table.is_destroyed() {
                return Err(Error::Destroyed);
            }
            table.issue(&key)
        };
        let label = label.unwrap_or_else(|| match &source {
            AsyncSource::Uri(uri) => AssetReaderVariant::source_filename(uri).to_string(),
            AsyncSource::Encoded(_) => key.clone(),
        });
        log::debug!("Resolving '{key}' (seq {seq}) from {label}");

        let reader = Arc::clone(&self.reader);
        let backend = Arc::clone(&self.backend);
        let table = Arc::clone(&self.table);
        let sender = self.queue.sender();
        let staleness = self.settings.staleness;
        let format = color_space.rgba8_format();

        let task = self.runtime.spawn(async move {
            match resolve(reader.as_ref(), source, label.clone()).await {
                Ok(image) => {
                    let entry = LoadedEntry {
                        key,
                        seq,
                        data: TextureData::Image(image),
                        sampler,
                        format,
                        flip_y,
                        label,
                    };
                    stage_completion(&*table, &sender, entry);
                }
                Err(err) => {
                    log::warn!("Failed to load texture '{key}': {err}; using default");
                    fall_back_to_default(&*table, backend.as_ref(), &key, seq, staleness);
                }
            }
        });

        Ok(PendingLoad { task: Some(task) })
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Current texture for `key`. `None` until something was committed or a
    /// load failed.
    ///
    /// The returned handle is valid until the next `commit` or `destroy`;
    /// look it up again after either.
    pub fn get(&self, key: &str) -> Result<Option<B::Texture>> {
        let table = self.table.lock();
        if table.is_destroyed() {
            return Err(Error::Destroyed);
        }
        Ok(table.get(key))
    }

    pub fn status(&self, key: &str) -> Result<TextureStatus> {
        let table = self.table.lock();
        if table.is_destroyed() {
            return Err(Error::Destroyed);
        }
        Ok(table.status(key))
    }

    /// Number of keys with an installed texture (owned or default).
    pub fn len(&self) -> Result<usize> {
        self.ensure_alive()?;
        Ok(self.table.lock().len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Keys with an installed texture, in no particular order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let table = self.table.lock();
        if table.is_destroyed() {
            return Err(Error::Destroyed);
        }
        Ok(table.keys().map(str::to_string).collect())
    }

    /// Completed loads waiting for the next `commit`.
    pub fn pending_len(&self) -> Result<usize> {
        self.ensure_alive()?;
        Ok(self.queue.len() + self.carry.len())
    }

    // ========================================================================
    // Frame commit
    // ========================================================================

    /// Realizes every completed load and installs it.
    ///
    /// A repeated `frame` is a no-op. GPU failures abort the cycle: the
    /// failing entry is dropped (its key keeps its previous texture) and the
    /// entries after it are retried on the next commit.
    pub fn commit(
        &mut self,
        frame: impl Into<FrameToken>,
        default_texture: &B::Texture,
    ) -> Result<CommitReport> {
        let frame = frame.into();
        let request_order = self.settings.staleness == StalenessPolicy::RequestOrder;
        let mut report = CommitReport::new(frame);

        // The table lock is only held for bookkeeping; realization runs
        // without it so completions and lookups are never blocked on uploads.
        let mut pending = {
            let mut table = self.table.lock();
            if table.is_destroyed() {
                return Err(Error::Destroyed);
            }
            if self.last_frame == Some(frame) {
                return Ok(CommitReport::skipped(frame));
            }
            self.last_frame = Some(frame);
            table.set_default(default_texture.clone());

            let mut pending = std::mem::take(&mut self.carry);
            pending.extend(self.queue.drain_all());
            if request_order {
                let before = pending.len();
                pending.retain(|entry| {
                    let current = table.is_current(&entry.key, entry.seq);
                    if !current {
                        log::debug!("Discarding stale load for '{}' (seq {})", entry.key, entry.seq);
                    }
                    current
                });
                report.discarded_stale = before - pending.len();
            }
            pending
        };

        let capabilities = self.backend.capabilities();
        while let Some(entry) = pending.pop_front() {
            let key = entry.key.clone();
            let seq = entry.seq;
            let realized = match self.factory.realize(entry, &capabilities) {
                Ok(realized) => realized,
                Err(err) => {
                    log::error!("Failed to realize texture '{key}': {err}");
                    self.carry = pending;
                    return Err(err);
                }
            };
            report.diagnostics.extend(realized.diagnostics);

            let mut table = self.table.lock();
            if request_order && !table.is_current(&key, seq) {
                log::debug!("Load for '{key}' (seq {seq}) was superseded while realizing");
                self.backend.destroy_texture(realized.texture);
                report.discarded_stale += 1;
                continue;
            }
            report.realized += 1;
            if let Some(old) = table.install(key, TextureSlot::Owned(realized.texture)) {
                self.backend.destroy_texture(old);
                report.retired += 1;
            }
        }

        if report.realized > 0 || report.discarded_stale > 0 {
            log::debug!(
                "Commit {:?}: {} realized, {} retired, {} stale",
                frame,
                report.realized,
                report.retired,
                report.discarded_stale
            );
        }
        Ok(report)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Destroys every owned texture; the default is left alone. Any later
    /// call fails with [`Error::Destroyed`].
    pub fn destroy(&mut self) -> Result<()> {
        let owned = {
            let mut table = self.table.lock();
            if table.is_destroyed() {
                return Err(Error::Destroyed);
            }
            table.tear_down()
        };
        let count = owned.len();
        for texture in owned {
            self.backend.destroy_texture(texture);
        }
        self.carry.clear();
        let _ = self.queue.drain_all();
        log::debug!("Texture manager destroyed ({count} textures released)");
        Ok(())
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.table.lock().is_destroyed()
    }
}

impl<B: GpuBackend, R: AssetReader> Drop for TextureManager<B, R> {
    fn drop(&mut self) {
        let owned = {
            let mut table = self.table.lock();
            if table.is_destroyed() {
                return;
            }
            table.tear_down()
        };
        if !owned.is_empty() {
            log::warn!(
                "TextureManager dropped without destroy(); releasing {} textures",
                owned.len()
            );
        }
        for texture in owned {
            self.backend.destroy_texture(texture);
        }
    }
}

async fn resolve<R: AssetReader>(
    reader: &R,
    source: AsyncSource,
    label: String,
) -> Result<RgbaImage> {
    let bytes = match source {
        AsyncSource::Uri(uri) => reader.read_bytes(&uri).await?,
        AsyncSource::Encoded(bytes) => bytes,
    };
    decode_image_async(bytes, label).await
}

/// Queues a finished load unless the manager is gone. The check and the
/// send happen under the table lock, so `destroy` either sees the entry in
/// its final drain or the entry is never sent.
fn stage_completion<T: Clone>(
    table: &Mutex<TextureTable<T>>,
    sender: &LoadSender,
    entry: LoadedEntry,
) -> bool {
    let table = table.lock();
    if table.is_destroyed() {
        log::debug!(
            "Dropping load for '{}' (seq {}): manager destroyed",
            entry.key,
            entry.seq
        );
        return false;
    }
    if !sender.enqueue(entry) {
        log::debug!("Load finished after the manager was dropped");
        return false;
    }
    true
}

fn fall_back_to_default<B: GpuBackend>(
    table: &Mutex<TextureTable<B::Texture>>,
    backend: &B,
    key: &str,
    seq: u64,
    staleness: StalenessPolicy,
) {
    let mut table = table.lock();
    if table.is_destroyed() {
        return;
    }
    if staleness == StalenessPolicy::RequestOrder && !table.is_current(key, seq) {
        log::debug!("Ignoring stale failure for '{key}' (seq {seq})");
        return;
    }
    if let Some(old) = table.install(key.to_string(), TextureSlot::Default) {
        backend.destroy_texture(old);
    }
}
