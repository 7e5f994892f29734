// src/error.rs
//
// Unified error handling for imgfit.
// Uses thiserror for simple, type-safe error handling.
//
// Error taxonomy (surfaced through FitError::kind):
// - InvalidDimension: missing/non-positive request dimensions
// - SourceUnavailable: no readable/decodable source resolved
// - EncodeFailure: destination encode or write failed
// - Internal: library bugs and codec aborts (should not happen)

use std::borrow::Cow;
use thiserror::Error;

/// Coarse failure classification, one value per request outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-positive source or target dimensions.
    InvalidDimension,
    /// No readable image source could be resolved or decoded.
    SourceUnavailable,
    /// Destination encode or write failed (geometry already succeeded).
    EncodeFailure,
    /// Library bugs and codec aborts.
    Internal,
}

/// imgfit error types.
///
/// All errors are type-safe and carry enough context to act on.
#[derive(Debug, Error)]
pub enum FitError {
    // Request validation
    #[error("{side} {axis} must be positive, got {value}")]
    InvalidDimension {
        side: &'static str,
        axis: &'static str,
        value: u32,
    },

    // Source resolution
    #[error("no readable image source: {reason}")]
    SourceUnavailable { reason: Cow<'static, str> },

    #[error("failed to read file '{path}': {source}")]
    FileReadFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory-map file '{path}': {source}")]
    MmapFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {message}")]
    DecodeFailed { message: Cow<'static, str> },

    #[error("image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    // Execution
    #[error("resize failed ({source_width}x{source_height} -> {target_width}x{target_height}): {message}")]
    ResizeFailed {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        message: Cow<'static, str>,
    },

    #[error("crop rectangle ({x}+{width}, {y}+{height}) exceeds image dimensions ({img_width}x{img_height})")]
    InvalidCropBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        img_width: u32,
        img_height: u32,
    },

    // Destination
    #[error("failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("failed to write file '{path}': {source}")]
    FileWriteFailed {
        path: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    // Internal
    #[error("internal error: {message}")]
    Internal { message: Cow<'static, str> },
}

// Constructor helpers
impl FitError {
    pub fn invalid_dimension(side: &'static str, axis: &'static str, value: u32) -> Self {
        Self::InvalidDimension { side, axis, value }
    }

    pub fn source_unavailable(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    pub fn file_read_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn mmap_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::MmapFailed {
            path: path.into(),
            source,
        }
    }

    pub fn decode_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn resize_failed(
        source_dims: (u32, u32),
        target_dims: (u32, u32),
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::ResizeFailed {
            source_width: source_dims.0,
            source_height: source_dims.1,
            target_width: target_dims.0,
            target_height: target_dims.1,
            message: message.into(),
        }
    }

    pub fn invalid_crop_bounds(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        img_width: u32,
        img_height: u32,
    ) -> Self {
        Self::InvalidCropBounds {
            x,
            y,
            width,
            height,
            img_width,
            img_height,
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn file_write_failed(path: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the coarse classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDimension { .. } => ErrorKind::InvalidDimension,

            Self::SourceUnavailable { .. }
            | Self::FileReadFailed { .. }
            | Self::MmapFailed { .. }
            | Self::DecodeFailed { .. }
            | Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. } => ErrorKind::SourceUnavailable,

            Self::EncodeFailed { .. } | Self::FileWriteFailed { .. } => ErrorKind::EncodeFailure,

            // ResizeFailed/InvalidCropBounds only occur when a plan disagrees
            // with the raster it was computed for.
            Self::ResizeFailed { .. } | Self::InvalidCropBounds { .. } | Self::Internal { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Check if this error is recoverable (the caller can fix the input).
    ///
    /// Corrupt data and internal failures are not; bad dimensions, missing
    /// files, and failed destination writes are.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::DecodeFailed { .. }
            | Self::EncodeFailed { .. }
            | Self::ResizeFailed { .. }
            | Self::InvalidCropBounds { .. }
            | Self::Internal { .. } => false,
            _ => true,
        }
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, FitError>;
