// src/engine.rs
//
// Request orchestration: resolve the source, plan the geometry, execute the
// plan, optionally encode to a destination. The decision logic itself lives
// in crate::plan; this module wires it to the I/O collaborators.

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height).
/// Larger images are rejected to prevent decompression bombs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod common;
mod decoder;
mod encoder;
mod io;
mod pipeline;
mod pool;

pub use decoder::{check_dimensions, decode_image, detect_format};
pub use encoder::encode_jpeg;
pub use io::{Destination, Source};
pub use pipeline::{execute, smooth_resize};
pub use pool::resize_batch;

use crate::error::{FitError, Result};
use crate::plan::{plan, Outcome, ResizeAction, ResizePlan};
use image::DynamicImage;

/// One resize job: a source, a target box, and the policy knobs.
///
/// Defaults match the common shrink-to-fit use: `IfLarger` action, aspect
/// ratio preserved, no cropping, quality 0.85, no destination.
#[derive(Debug)]
pub struct ResizeRequest {
    pub source: Source,
    pub target_width: u32,
    pub target_height: u32,
    pub action: ResizeAction,
    pub maintain_aspect: bool,
    pub crop_to_aspect: bool,
    /// Encoder quality factor in [0,1]; geometry never reads it.
    pub quality: f32,
    pub destination: Option<Destination>,
}

impl ResizeRequest {
    pub fn new(source: impl Into<Source>, target_width: u32, target_height: u32) -> Self {
        Self {
            source: source.into(),
            target_width,
            target_height,
            action: ResizeAction::default(),
            maintain_aspect: true,
            crop_to_aspect: false,
            quality: 0.85,
            destination: None,
        }
    }

    pub fn action(mut self, action: ResizeAction) -> Self {
        self.action = action;
        self
    }

    pub fn maintain_aspect(mut self, maintain: bool) -> Self {
        self.maintain_aspect = maintain;
        self
    }

    pub fn crop_to_aspect(mut self, crop: bool) -> Self {
        self.crop_to_aspect = crop;
        self
    }

    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }
}

/// Outcome of one request: the final raster plus what was done to it.
#[derive(Debug)]
pub struct ResizeResult {
    pub image: DynamicImage,
    pub outcome: Outcome,
    /// Encoded bytes when the destination was `Buffer`.
    pub encoded: Option<Vec<u8>>,
    /// Destination failure, reported separately: the raster above is valid
    /// even when the optional write was not.
    pub write_error: Option<FitError>,
}

impl ResizeResult {
    pub fn resized(&self) -> bool {
        self.outcome.contains(Outcome::RESIZED)
    }

    pub fn cropped(&self) -> bool {
        self.outcome.contains(Outcome::CROPPED)
    }
}

/// Plan the geometry for a request against known source dimensions, without
/// touching pixels.
pub fn plan_request(request: &ResizeRequest, source_dims: (u32, u32)) -> Result<ResizePlan> {
    plan(
        source_dims,
        (request.target_width, request.target_height),
        request.action,
        request.maintain_aspect,
        request.crop_to_aspect,
    )
}

/// Run one request to completion: resolve, plan, execute, deliver.
pub fn resize(request: ResizeRequest) -> Result<ResizeResult> {
    let ResizeRequest {
        source,
        target_width,
        target_height,
        action,
        maintain_aspect,
        crop_to_aspect,
        quality,
        destination,
    } = request;

    // The cheapest failure first: a bad target box needs no pixels.
    if target_width == 0 {
        return Err(FitError::invalid_dimension("target", "width", target_width));
    }
    if target_height == 0 {
        return Err(FitError::invalid_dimension(
            "target",
            "height",
            target_height,
        ));
    }

    let img = source.resolve()?;
    let resize_plan = plan(
        (img.width(), img.height()),
        (target_width, target_height),
        action,
        maintain_aspect,
        crop_to_aspect,
    )?;
    let outcome = resize_plan.outcome();
    let image = pipeline::execute(img, &resize_plan)?;

    let (encoded, write_error) = match destination {
        None => (None, None),
        Some(dest) => match encoder::write_destination(&image, quality, dest) {
            Ok(bytes) => (bytes, None),
            Err(err) => (None, Some(err)),
        },
    };

    Ok(ResizeResult {
        image,
        outcome,
        encoded,
        write_error,
    })
}
