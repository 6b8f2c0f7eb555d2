use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{AssetError, Result};

/// Asset reader trait.
///
/// Fetches the encoded bytes of a texture source. Implementations must be
/// shareable across the tasks the manager spawns.
pub trait AssetReader: Send + Sync + 'static {
    fn read_bytes(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

fn is_http(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

// ============================================================================
// Local files
// ============================================================================

/// Reads files relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        let data = tokio::fs::read(&path).await?;
        Ok(data)
    }
}

// ============================================================================
// In-memory table
// ============================================================================

/// Serves bytes registered up front, keyed by URI.
///
/// Useful for embedded assets and for tests; a missing URI resolves to
/// [`AssetError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetReader {
    entries: Arc<RwLock<FxHashMap<String, Arc<[u8]>>>>,
}

impl MemoryAssetReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.write().insert(uri.into(), bytes.into());
    }

    pub fn remove(&self, uri: &str) -> bool {
        self.entries.write().remove(uri).is_some()
    }

    #[must_use]
    pub fn contains(&self, uri: &str) -> bool {
        self.entries.read().contains_key(uri)
    }
}

impl AssetReader for MemoryAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let bytes = self
            .entries
            .read()
            .get(uri)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(uri.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// Fetches over HTTP(S), resolving relative URIs against a base URL.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpAssetReader {
    root_url: String,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url: &str) -> Result<Self> {
        if !is_http(url) {
            return Err(AssetError::Network(format!("not an http(s) URL: {url}")).into());
        }
        // Directory part of the URL, always ending in '/'
        let after_scheme = url.find("://").map_or(0, |i| i + 3);
        let root_url = match url[after_scheme..].rfind('/') {
            Some(idx) => url[..=after_scheme + idx].to_string(),
            None => format!("{url}/"),
        };
        Ok(Self { root_url })
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    fn resolve(&self, uri: &str) -> String {
        if is_http(uri) {
            uri.to_string()
        } else {
            format!("{}{}", self.root_url, uri.trim_start_matches('/'))
        }
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let url = self.resolve(uri);
        let resp = ehttp::fetch_async(ehttp::Request::get(&url))
            .await
            .map_err(AssetError::Network)?;
        if resp.status == 404 {
            return Err(AssetError::NotFound(url).into());
        }
        if !resp.ok {
            return Err(AssetError::Network(format!(
                "HTTP {} {} for {url}",
                resp.status, resp.status_text
            ))
            .into());
        }
        Ok(resp.bytes)
    }
}

// ============================================================================
// Variant dispatch
// ============================================================================

/// Asset reader variant enum.
///
/// Avoids trait objects (the reader trait returns `impl Future`) while still
/// letting the manager pick a reader from a root path or URL at runtime.
#[derive(Debug, Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    Memory(MemoryAssetReader),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl Default for AssetReaderVariant {
    fn default() -> Self {
        Self::File(Arc::new(FileAssetReader::new(".")))
    }
}

impl AssetReaderVariant {
    /// Creates the reader matching a root path or URL.
    pub fn from_source(source: &str) -> Result<Self> {
        if is_http(source) {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(AssetError::Network(
                    "HTTP feature is not enabled. Enable it with `features = [\"http\"]`"
                        .to_string(),
                )
                .into())
            }
        } else {
            Ok(Self::File(Arc::new(FileAssetReader::new(source))))
        }
    }

    /// File name part of a path or URL, for labels.
    #[must_use]
    pub fn source_filename(source: &str) -> &str {
        if is_http(source) {
            source.rsplit('/').next().unwrap_or(source)
        } else {
            Path::new(source)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(source)
        }
    }
}

impl AssetReader for AssetReaderVariant {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        match self {
            Self::File(r) => r.read_bytes(uri).await,
            Self::Memory(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }
}
