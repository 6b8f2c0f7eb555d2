//! Source resolution: fetching encoded bytes and decoding them into images.

pub mod decode;
pub mod io;

pub use decode::{decode_image_async, decode_image_cpu};
#[cfg(feature = "http")]
pub use io::HttpAssetReader;
pub use io::{AssetReader, AssetReaderVariant, FileAssetReader, MemoryAssetReader};
