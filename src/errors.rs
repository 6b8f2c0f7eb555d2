//! Error Types
//!
//! This module defines the error types used throughout the texture manager.
//!
//! # Overview
//!
//! The main error type [`Error`] covers the failure modes that can reach a
//! caller:
//! - Use of a manager after it was destroyed
//! - Malformed texture requests (e.g. raw buffers of the wrong length)
//! - GPU allocation failures reported by the backend
//! - Asset fetching and decoding errors
//!
//! Source-resolution failures never surface from
//! [`TextureManager::request_load`](crate::TextureManager::request_load);
//! they are recovered by installing the default texture. [`AssetError`] is
//! still public because [`AssetReader`](crate::AssetReader) implementations
//! return it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_textures::errors::{Error, Result};
//!
//! fn commit_frame() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Errors produced while fetching or decoding a texture source.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The requested asset does not exist.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network request failed or returned a non-success status.
    #[error("Network error: {0}")]
    Network(String),

    /// The bytes could not be decoded as an image.
    #[error("Format error: {0}")]
    Format(String),
}

/// The main error type for the texture manager.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // State Errors
    // ========================================================================
    /// The manager was destroyed; no further calls are permitted.
    #[error("Texture manager has been destroyed")]
    Destroyed,

    /// The request is malformed and was rejected before staging.
    #[error("Invalid texture request: {0}")]
    InvalidRequest(String),

    // ========================================================================
    // GPU Errors
    // ========================================================================
    /// The GPU backend failed to allocate or upload a texture.
    #[error("GPU error: {0}")]
    Gpu(String),

    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// Fetching or decoding a texture source failed.
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    // ========================================================================
    // Async & Threading Errors
    // ========================================================================
    /// Task join error (when async tasks fail to complete).
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::Asset(AssetError::NotFound(err.to_string()))
        } else {
            Error::Asset(AssetError::Io(err))
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Asset(AssetError::Format(err.to_string()))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskJoin(err.to_string())
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
