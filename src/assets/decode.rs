use image::RgbaImage;

use crate::errors::{AssetError, Error, Result};

/// Unified image decoding helper (offloads to tokio's blocking pool).
pub async fn decode_image_async(bytes: Vec<u8>, label: String) -> Result<RgbaImage> {
    tokio::task::spawn_blocking(move || decode_image_cpu(&bytes, &label)).await?
}

/// CPU image decoding logic. Every supported format is expanded to RGBA8.
pub fn decode_image_cpu(bytes: &[u8], label: &str) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| {
        Error::Asset(AssetError::Format(format!(
            "Failed to decode image {label}: {e}"
        )))
    })?;
    Ok(img.into_rgba8())
}
