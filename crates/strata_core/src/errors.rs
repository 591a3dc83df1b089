//! Error Types
//!
//! This module defines the error type used throughout the material system.
//!
//! # Overview
//!
//! Material editing itself never fails with an error: capacity problems are
//! reported through `bool` returns, range problems through `Option`, and
//! energy-conservation violations are repaired during finalization. The
//! [`StrataError`] enum covers the fallible edges where a material meets the
//! GPU-facing world:
//! - resolving parameter-block layouts
//! - validating bound textures
//! - generating shader variants
//!
//! # Usage
//!
//! ```rust,ignore
//! use strata_core::{Result, StrataError};
//!
//! fn bind() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Strata material system.
#[derive(Error, Debug)]
pub enum StrataError {
    // ========================================================================
    // Parameter Block Errors
    // ========================================================================
    /// A named variable is not declared by the parameter block layout.
    #[error("Unknown variable '{name}' in parameter block '{block}'")]
    UnknownVariable {
        /// Label of the parameter block
        block: String,
        /// The variable that failed to resolve
        name: String,
    },

    /// A write would run past the end of the parameter block storage.
    #[error("Write of {len} bytes at offset {offset} exceeds block size {capacity}")]
    WriteOutOfBounds {
        /// Byte offset of the write
        offset: usize,
        /// Number of bytes written
        len: usize,
        /// Total size of the block
        capacity: usize,
    },

    // ========================================================================
    // Texture Errors
    // ========================================================================
    /// A material texture cannot be sampled as at least RGB.
    #[error("Texture '{texture}' has format {format:?}, which is not sampleable as RGB")]
    UnsupportedTextureFormat {
        /// Texture name
        texture: String,
        /// The offending format
        format: wgpu::TextureFormat,
    },

    // ========================================================================
    // Shader Generation Errors
    // ========================================================================
    /// The shader template could not be found.
    #[error("Shader template not found: {0}")]
    TemplateNotFound(String),

    /// The shader template failed to render.
    #[error("Shader template error: {0}")]
    ShaderTemplate(String),
}

/// Alias for `Result<T, StrataError>`.
pub type Result<T> = std::result::Result<T, StrataError>;
