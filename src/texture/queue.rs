use image::RgbaImage;
use wgpu::TextureFormat;

use crate::resources::{RawBuffer, SamplerConfig};

/// Resolved pixels waiting for realization.
#[derive(Debug, Clone)]
pub enum TextureData {
    Raw(RawBuffer),
    Image(RgbaImage),
}

impl TextureData {
    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Raw(buffer) => (buffer.width, buffer.height),
            Self::Image(image) => image.dimensions(),
        }
    }
}

/// A completed load, immutable once queued.
#[derive(Debug, Clone)]
pub struct LoadedEntry {
    pub key: String,
    /// Per-key request sequence number.
    pub seq: u64,
    pub data: TextureData,
    pub sampler: SamplerConfig,
    /// Upload format; for raw buffers this is the buffer's own format.
    pub format: TextureFormat,
    pub flip_y: bool,
    pub label: String,
}

/// Cloneable producer side of a [`LoadQueue`], handed to completion tasks.
#[derive(Debug, Clone)]
pub struct LoadSender {
    tx: flume::Sender<LoadedEntry>,
}

impl LoadSender {
    /// Appends without blocking. Returns `false` once the queue is gone,
    /// which only happens after the manager was dropped.
    pub fn enqueue(&self, entry: LoadedEntry) -> bool {
        self.tx.send(entry).is_ok()
    }
}

/// Completed-but-unrealized loads, in arrival order.
///
/// Any number of producers may append concurrently; the frame loop is the
/// only consumer.
#[derive(Debug)]
pub struct LoadQueue {
    tx: flume::Sender<LoadedEntry>,
    rx: flume::Receiver<LoadedEntry>,
}

impl Default for LoadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    #[must_use]
    pub fn sender(&self) -> LoadSender {
        LoadSender {
            tx: self.tx.clone(),
        }
    }

    pub fn enqueue(&self, entry: LoadedEntry) {
        // The queue owns a receiver, so sending cannot fail here.
        let _ = self.tx.send(entry);
    }

    /// Empties the queue in one step and returns its contents in arrival
    /// order. Entries sent while draining land in the next drain.
    #[must_use]
    pub fn drain_all(&self) -> Vec<LoadedEntry> {
        self.rx.drain().collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
