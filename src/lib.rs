// lib.rs
//
// imgfit: deterministic resize/crop planning and execution for raster images.
//
// Two halves:
// - plan: pure decision logic reconciling the trigger policy, aspect
//   preservation, and crop-to-fill into a single tagged plan
// - engine: source resolution, the scale/crop executor, JPEG destinations
//
// Planning never touches pixels; execution never second-guesses the plan.

pub mod engine;
pub mod error;
pub mod plan;

pub use engine::{
    plan_request, resize, resize_batch, Destination, ResizeRequest, ResizeResult, Source,
};
pub use error::{ErrorKind, FitError};
pub use plan::{CropRect, Outcome, ResizeAction, ResizePlan};

/// Library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
