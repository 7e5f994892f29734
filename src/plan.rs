// src/plan.rs
//
// Resize/crop decision logic.
// Pure arithmetic: no I/O, no pixel access. The executor in engine/pipeline.rs
// consumes the plans produced here.

use crate::error::{FitError, Result};
use bitflags::bitflags;

/// Policy deciding under what circumstances a geometric change happens at all,
/// independent of aspect/crop choices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeAction {
    /// Transform whenever target and source dimensions differ.
    Always,
    /// Transform only when the target is below the source (shrink-to-fit).
    #[default]
    IfLarger,
    /// Transform only when the target exceeds the source (grow-to-fit).
    IfSmaller,
    /// Never transform.
    Never,
}

bitflags! {
    /// Which operations a plan performs, observable by downstream consumers.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Outcome: u8 {
        const RESIZED = 1 << 0;
        const CROPPED = 1 << 1;
    }
}

/// Crop rectangle in the coordinate space of the image being cropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The computed, side-effect-free description of what to do with a raster.
///
/// A tagged variant rather than a pair of booleans: a crop rectangle without a
/// crop, or resize dimensions without a resize, are unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizePlan {
    /// The raster already satisfies the request.
    NoOp,
    /// Scale to exactly width x height.
    ResizeOnly { width: u32, height: u32 },
    /// Cut the rectangle out of the source, no scaling.
    CropOnly { rect: CropRect },
    /// Scale to width x height, then cut the rectangle out of the result.
    ResizeThenCrop {
        width: u32,
        height: u32,
        rect: CropRect,
    },
}

impl ResizePlan {
    /// Outcome flags implied by the variant.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::NoOp => Outcome::empty(),
            Self::ResizeOnly { .. } => Outcome::RESIZED,
            Self::CropOnly { .. } => Outcome::CROPPED,
            Self::ResizeThenCrop { .. } => Outcome::RESIZED | Outcome::CROPPED,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// Dimensions handed to the scale primitive, if the plan resizes.
    pub fn resize_dimensions(&self) -> Option<(u32, u32)> {
        match *self {
            Self::ResizeOnly { width, height } | Self::ResizeThenCrop { width, height, .. } => {
                Some((width, height))
            }
            _ => None,
        }
    }

    /// The crop rectangle, if the plan crops.
    pub fn crop_rect(&self) -> Option<CropRect> {
        match *self {
            Self::CropOnly { rect } | Self::ResizeThenCrop { rect, .. } => Some(rect),
            _ => None,
        }
    }
}

/// Decide what geometric operations (if any) take a `source_w x source_h`
/// raster to the `target_w x target_h` box under the given policy.
///
/// An image already at target size short-circuits to `NoOp` regardless of
/// `action` or flags. Errors only on zero dimensions.
pub fn plan(
    (source_w, source_h): (u32, u32),
    (target_w, target_h): (u32, u32),
    action: ResizeAction,
    maintain_aspect: bool,
    crop_to_aspect: bool,
) -> Result<ResizePlan> {
    validate_dims("source", source_w, source_h)?;
    validate_dims("target", target_w, target_h)?;

    if target_h == source_h && target_w == source_w {
        return Ok(ResizePlan::NoOp);
    }

    let (resize, crop) = triggers(
        (source_w, source_h),
        (target_w, target_h),
        action,
        crop_to_aspect,
    );
    if !resize && !crop {
        return Ok(ResizePlan::NoOp);
    }

    if !maintain_aspect {
        // Stretch both axes to fill the box exactly; nothing is left to crop.
        return Ok(ResizePlan::ResizeOnly {
            width: target_w,
            height: target_h,
        });
    }

    if crop_to_aspect {
        let (mut width, mut height) = (source_w, source_h);
        if resize {
            // Scale so the image covers the target box on both axes; the
            // tighter-constrained axis lands exactly on target, the other
            // overhangs and gets trimmed below.
            let aspect_ratio = source_h as f32 / source_w as f32;
            let scale = if (target_h as f32 / aspect_ratio) < target_w as f32 {
                target_w as f64 / source_w as f64
            } else {
                target_h as f64 / source_h as f64
            };
            width = scaled_dim(source_w, scale);
            height = scaled_dim(source_h, scale);
        }

        // Trim the overhanging axis in equal parts; at most one axis overhangs
        // (height wins if rounding ever leaves both).
        let rect = if height > target_h {
            Some(CropRect {
                x: 0,
                y: (height - target_h) / 2,
                width,
                height: target_h,
            })
        } else if width > target_w {
            Some(CropRect {
                x: (width - target_w) / 2,
                y: 0,
                width: target_w,
                height,
            })
        } else {
            None
        };

        return Ok(match (resize, rect) {
            (true, Some(rect)) => ResizePlan::ResizeThenCrop {
                width,
                height,
                rect,
            },
            (true, None) => ResizePlan::ResizeOnly { width, height },
            (false, Some(rect)) => ResizePlan::CropOnly { rect },
            // Crop triggered but the mismatched axis falls short of the box
            // rather than past it; there is nothing to trim.
            (false, None) => ResizePlan::NoOp,
        });
    }

    // maintain_aspect without crop_to_aspect: resize is the only trigger that
    // can reach here. Uniform scale chosen by source orientation; the result
    // fits the box on the driving axis and may undershoot on the other.
    let scale = if source_w > source_h {
        target_w as f64 / source_w as f64
    } else {
        target_h as f64 / source_h as f64
    };
    Ok(ResizePlan::ResizeOnly {
        width: scaled_dim(source_w, scale),
        height: scaled_dim(source_h, scale),
    })
}

/// Per-action trigger evaluation. Returns (resize, crop).
///
/// With `crop_to_aspect`, a single-axis mismatch crops without resizing; both
/// axes must miss for a resize to be worth it. Without it, any mismatch is a
/// resize and the crop flag stays clear.
fn triggers(
    (source_w, source_h): (u32, u32),
    (target_w, target_h): (u32, u32),
    action: ResizeAction,
    crop_to_aspect: bool,
) -> (bool, bool) {
    let (height_hit, width_hit) = match action {
        ResizeAction::Always => (target_h != source_h, target_w != source_w),
        ResizeAction::IfSmaller => (target_h > source_h, target_w > source_w),
        ResizeAction::IfLarger => (target_h < source_h, target_w < source_w),
        ResizeAction::Never => return (false, false),
    };

    if crop_to_aspect {
        (height_hit && width_hit, height_hit || width_hit)
    } else {
        (height_hit || width_hit, false)
    }
}

fn validate_dims(side: &'static str, width: u32, height: u32) -> Result<()> {
    if width == 0 {
        return Err(FitError::invalid_dimension(side, "width", width));
    }
    if height == 0 {
        return Err(FitError::invalid_dimension(side, "height", height));
    }
    Ok(())
}

/// Scale one axis, rounding half away from zero. Never returns zero: a raster
/// axis cannot collapse below one pixel.
fn scaled_dim(dim: u32, scale: f64) -> u32 {
    (((dim as f64) * scale).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_short_circuits_every_policy() {
        for action in [
            ResizeAction::Always,
            ResizeAction::IfLarger,
            ResizeAction::IfSmaller,
            ResizeAction::Never,
        ] {
            for maintain in [false, true] {
                for crop in [false, true] {
                    let p = plan((1600, 900), (1600, 900), action, maintain, crop).unwrap();
                    assert_eq!(p, ResizePlan::NoOp, "{action:?} {maintain} {crop}");
                }
            }
        }
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(plan((0, 100), (50, 50), ResizeAction::Always, true, false).is_err());
        assert!(plan((100, 0), (50, 50), ResizeAction::Always, true, false).is_err());
        assert!(plan((100, 100), (0, 50), ResizeAction::Always, true, false).is_err());
        assert!(plan((100, 100), (50, 0), ResizeAction::Always, true, false).is_err());
    }

    #[test]
    fn stretch_fills_the_box_exactly() {
        let p = plan((800, 600), (1000, 1000), ResizeAction::Always, false, false).unwrap();
        assert_eq!(
            p,
            ResizePlan::ResizeOnly {
                width: 1000,
                height: 1000
            }
        );
        assert_eq!(p.outcome(), Outcome::RESIZED);
    }

    #[test]
    fn stretch_ignores_crop_flag_on_single_axis_mismatch() {
        // Only the widths differ, so crop_to_aspect triggers a crop without a
        // resize; without aspect preservation that becomes a plain stretch.
        let p = plan((500, 300), (300, 300), ResizeAction::Always, false, true).unwrap();
        assert_eq!(
            p,
            ResizePlan::ResizeOnly {
                width: 300,
                height: 300
            }
        );
    }

    #[test]
    fn fit_inside_wide_source_scales_by_width() {
        let p = plan((1600, 900), (300, 300), ResizeAction::Always, true, false).unwrap();
        // scale = 300/1600; 900 * 0.1875 = 168.75 -> 169
        assert_eq!(
            p,
            ResizePlan::ResizeOnly {
                width: 300,
                height: 169
            }
        );
    }

    #[test]
    fn fit_inside_tall_source_scales_by_height() {
        let p = plan((900, 1600), (300, 300), ResizeAction::Always, true, false).unwrap();
        assert_eq!(
            p,
            ResizePlan::ResizeOnly {
                width: 169,
                height: 300
            }
        );
    }

    #[test]
    fn cover_wide_source_resizes_then_trims_width() {
        let p = plan((1600, 900), (300, 300), ResizeAction::Always, true, true).unwrap();
        // scale = 300/900; 1600/3 = 533.33 -> 533; overhang 233 -> offset 116
        assert_eq!(
            p,
            ResizePlan::ResizeThenCrop {
                width: 533,
                height: 300,
                rect: CropRect {
                    x: 116,
                    y: 0,
                    width: 300,
                    height: 300
                },
            }
        );
        assert_eq!(p.outcome(), Outcome::RESIZED | Outcome::CROPPED);
    }

    #[test]
    fn cover_tall_source_resizes_then_trims_height() {
        let p = plan((900, 1600), (300, 300), ResizeAction::Always, true, true).unwrap();
        assert_eq!(
            p,
            ResizePlan::ResizeThenCrop {
                width: 300,
                height: 533,
                rect: CropRect {
                    x: 0,
                    y: 116,
                    width: 300,
                    height: 300
                },
            }
        );
    }

    #[test]
    fn cover_single_axis_mismatch_crops_without_resizing() {
        let p = plan((500, 300), (300, 300), ResizeAction::Always, true, true).unwrap();
        assert_eq!(
            p,
            ResizePlan::CropOnly {
                rect: CropRect {
                    x: 100,
                    y: 0,
                    width: 300,
                    height: 300
                },
            }
        );
        assert_eq!(p.outcome(), Outcome::CROPPED);
    }

    #[test]
    fn cover_single_axis_undershoot_is_a_noop() {
        // Heights differ but the target is taller than the source; nothing
        // overhangs the box, so there is nothing to trim.
        let p = plan((300, 500), (300, 900), ResizeAction::Always, true, true).unwrap();
        assert_eq!(p, ResizePlan::NoOp);
    }

    #[test]
    fn if_larger_skips_smaller_sources() {
        for crop in [false, true] {
            let p = plan((800, 600), (1000, 1000), ResizeAction::IfLarger, true, crop).unwrap();
            assert_eq!(p, ResizePlan::NoOp);
        }
    }

    #[test]
    fn if_smaller_skips_larger_sources() {
        for crop in [false, true] {
            let p = plan((800, 600), (300, 300), ResizeAction::IfSmaller, true, crop).unwrap();
            assert_eq!(p, ResizePlan::NoOp);
        }
    }

    #[test]
    fn if_smaller_enlarges_and_trims() {
        let p = plan((800, 600), (1000, 1000), ResizeAction::IfSmaller, true, true).unwrap();
        // scale = 1000/600; 800 * 1.6667 = 1333.33 -> 1333; offset (1333-1000)/2
        assert_eq!(
            p,
            ResizePlan::ResizeThenCrop {
                width: 1333,
                height: 1000,
                rect: CropRect {
                    x: 166,
                    y: 0,
                    width: 1000,
                    height: 1000
                },
            }
        );
    }

    #[test]
    fn never_leaves_everything_alone() {
        for maintain in [false, true] {
            for crop in [false, true] {
                let p = plan((800, 600), (300, 300), ResizeAction::Never, maintain, crop).unwrap();
                assert_eq!(p, ResizePlan::NoOp);
            }
        }
    }

    #[test]
    fn extreme_aspect_ratio_never_collapses_an_axis() {
        let p = plan((10000, 10), (20, 20), ResizeAction::Always, true, false).unwrap();
        // 10 * (20/10000) = 0.02 would round to zero; clamped to one pixel
        assert_eq!(
            p,
            ResizePlan::ResizeOnly {
                width: 20,
                height: 1
            }
        );
    }

    #[test]
    fn replanning_the_produced_size_is_a_noop() {
        let first = plan((1600, 900), (300, 300), ResizeAction::Always, true, true).unwrap();
        let rect = first.crop_rect().unwrap();
        let second = plan(
            (rect.width, rect.height),
            (300, 300),
            ResizeAction::Always,
            true,
            true,
        )
        .unwrap();
        assert_eq!(second, ResizePlan::NoOp);
    }
}
