// src/engine/pipeline.rs
//
// Plan execution: the smooth scale primitive and the crop step.
// Planning never depends on the resampling algorithm; swapping it out stays
// confined to this module.

use crate::error::{FitError, Result};
use crate::plan::{CropRect, ResizePlan};
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::{imageops::FilterType, DynamicImage, RgbImage, RgbaImage};

#[cfg(feature = "trace-plan")]
use once_cell::sync::Lazy;
#[cfg(feature = "trace-plan")]
use tracing::debug;

/// Run a plan against a decoded raster. The plan must have been computed for
/// this raster's dimensions: a crop rectangle that does not fit the (possibly
/// resized) image is an internal error.
pub fn execute(img: DynamicImage, plan: &ResizePlan) -> Result<DynamicImage> {
    // Optional step logging, enabled only when feature "trace-plan" is on AND
    // env IMGFIT_TRACE_PLAN is set.
    #[cfg(feature = "trace-plan")]
    static TRACE_ENABLED: Lazy<bool> = Lazy::new(|| std::env::var("IMGFIT_TRACE_PLAN").is_ok());
    #[cfg(feature = "trace-plan")]
    let log_step = |stage: &str, dims: (u32, u32)| {
        if *TRACE_ENABLED {
            debug!(target: "imgfit::plan", %stage, width = dims.0, height = dims.1, "execute");
        }
    };
    #[cfg(not(feature = "trace-plan"))]
    let log_step = |_stage: &str, _dims: (u32, u32)| {};

    match *plan {
        ResizePlan::NoOp => Ok(img),
        ResizePlan::ResizeOnly { width, height } => {
            log_step("resize", (width, height));
            smooth_resize(img, width, height)
        }
        ResizePlan::CropOnly { rect } => {
            log_step("crop", (rect.width, rect.height));
            crop(img, rect)
        }
        ResizePlan::ResizeThenCrop {
            width,
            height,
            rect,
        } => {
            log_step("resize", (width, height));
            let resized = smooth_resize(img, width, height)?;
            log_step("crop", (rect.width, rect.height));
            crop(resized, rect)
        }
    }
}

fn crop(img: DynamicImage, rect: CropRect) -> Result<DynamicImage> {
    let img_w = img.width();
    let img_h = img.height();
    if rect.width == 0
        || rect.height == 0
        || rect.x + rect.width > img_w
        || rect.y + rect.height > img_h
    {
        return Err(FitError::invalid_crop_bounds(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            img_w,
            img_h,
        ));
    }
    Ok(img.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

fn default_resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// Smooth scale to exactly `dst_width x dst_height` (Lanczos3 convolution).
/// Identity dimensions return the input untouched.
pub fn smooth_resize(img: DynamicImage, dst_width: u32, dst_height: u32) -> Result<DynamicImage> {
    let src_width = img.width();
    let src_height = img.height();

    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(FitError::resize_failed(
            (src_width, src_height),
            (dst_width, dst_height),
            "invalid dimensions for resize",
        ));
    }
    if (dst_width, dst_height) == (src_width, src_height) {
        return Ok(img);
    }

    // RGB8/RGBA8 transfer their buffers without copying; other layouts are
    // normalized to RGBA8 first.
    let (pixel_type, src_pixels): (PixelType, Vec<u8>) = match img {
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.into_raw()),
        other => (PixelType::U8x4, other.to_rgba8().into_raw()),
    };

    fir_resize(
        src_width, src_height, src_pixels, pixel_type, dst_width, dst_height,
    )
    .map_err(|reason| {
        FitError::resize_failed((src_width, src_height), (dst_width, dst_height), reason)
    })
}

fn fir_resize(
    src_width: u32,
    src_height: u32,
    mut src_pixels: Vec<u8>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let pixel_count = (src_width as usize)
        .checked_mul(src_height as usize)
        .ok_or_else(|| "image dimensions overflow during resize".to_string())?;
    let required_bytes = pixel_count
        .checked_mul(pixel_type.size())
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;

    if src_pixels.len() < required_bytes {
        return Err(format!(
            "fir source image invalid buffer size. expected {required_bytes} bytes, got {} bytes",
            src_pixels.len()
        ));
    }

    let options = default_resize_options();
    let primary_result = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => {
            resize_with_source_image(src_image, pixel_type, dst_width, dst_height, &options)
        }
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let aligned_image = copy_pixels_to_aligned_image(
                src_width,
                src_height,
                pixel_type,
                &src_pixels,
                required_bytes,
            )?;
            resize_with_source_image(aligned_image, pixel_type, dst_width, dst_height, &options)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match primary_result {
        Ok(img) => Ok(img),
        Err(err) => resize_with_image_crate_fallback(
            &src_pixels,
            src_width,
            src_height,
            pixel_type,
            dst_width,
            dst_height,
        )
        .map_err(|fallback_err| format!("{err}; image crate fallback failed: {fallback_err}")),
    }
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> std::result::Result<DynamicImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    // Alpha must be premultiplied around the convolution for RGBA layouts.
    let needs_premultiply = matches!(pixel_type, PixelType::U8x4);

    let mul_div = MulDiv::default();
    if needs_premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if needs_premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    let dst_pixels = dst_image.into_vec();
    match pixel_type {
        PixelType::U8x3 => {
            let rgb_image = RgbImage::from_raw(dst_width, dst_height, dst_pixels)
                .ok_or("failed to create rgb image from resized data")?;
            Ok(DynamicImage::ImageRgb8(rgb_image))
        }
        PixelType::U8x4 => {
            let rgba_image = RgbaImage::from_raw(dst_width, dst_height, dst_pixels)
                .ok_or("failed to create rgba image from resized data")?;
            Ok(DynamicImage::ImageRgba8(rgba_image))
        }
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}

fn copy_pixels_to_aligned_image(
    width: u32,
    height: u32,
    pixel_type: PixelType,
    src_pixels: &[u8],
    required_bytes: usize,
) -> std::result::Result<fir::images::Image<'static>, String> {
    let mut aligned_image = fir::images::Image::new(width, height, pixel_type);
    let aligned_buffer = aligned_image.buffer_mut();
    if aligned_buffer.len() != required_bytes {
        return Err(format!(
            "fir alignment fallback buffer mismatch. expected {required_bytes} bytes, got {} bytes",
            aligned_buffer.len()
        ));
    }
    aligned_buffer.copy_from_slice(&src_pixels[..required_bytes]);
    Ok(aligned_image)
}

fn resize_with_image_crate_fallback(
    src_pixels: &[u8],
    src_width: u32,
    src_height: u32,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let filter = FilterType::Lanczos3;
    match pixel_type {
        PixelType::U8x3 => {
            let rgb = RgbImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgb8(image::imageops::resize(
                &rgb, dst_width, dst_height, filter,
            )))
        }
        PixelType::U8x4 => {
            let rgba = RgbaImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgba8(image::imageops::resize(
                &rgba, dst_width, dst_height, filter,
            )))
        }
        _ => Err("fallback resize supports only U8x3/U8x4 pixel types".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_noop_returns_input_unchanged() {
        let img = create_test_image(10, 10);
        let out = execute(img, &ResizePlan::NoOp).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out.get_pixel(3, 7), create_test_image(10, 10).get_pixel(3, 7));
    }

    #[test]
    fn test_resize_only_produces_requested_dimensions() {
        let img = create_test_image(64, 48);
        let out = execute(
            img,
            &ResizePlan::ResizeOnly {
                width: 32,
                height: 24,
            },
        )
        .unwrap();
        assert_eq!(out.dimensions(), (32, 24));
    }

    #[test]
    fn test_identity_resize_short_circuits() {
        let img = create_test_image(16, 16);
        let out = execute(
            img,
            &ResizePlan::ResizeOnly {
                width: 16,
                height: 16,
            },
        )
        .unwrap();
        assert_eq!(out.dimensions(), (16, 16));
    }

    #[test]
    fn test_crop_only_extracts_the_rectangle() {
        let img = create_test_image(8, 4);
        let rect = CropRect {
            x: 2,
            y: 1,
            width: 3,
            height: 2,
        };
        let out = execute(img, &ResizePlan::CropOnly { rect }).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        // Top-left of the crop is source pixel (2, 1).
        assert_eq!(out.to_rgb8().get_pixel(0, 0).0, [2, 1, 128]);
    }

    #[test]
    fn test_resize_then_crop_lands_on_target() {
        let img = create_test_image(160, 90);
        let out = execute(
            img,
            &ResizePlan::ResizeThenCrop {
                width: 53,
                height: 30,
                rect: CropRect {
                    x: 11,
                    y: 0,
                    width: 30,
                    height: 30,
                },
            },
        )
        .unwrap();
        assert_eq!(out.dimensions(), (30, 30));
    }

    #[test]
    fn test_out_of_bounds_crop_is_rejected() {
        let img = create_test_image(10, 10);
        let rect = CropRect {
            x: 5,
            y: 5,
            width: 6,
            height: 6,
        };
        let err = execute(img, &ResizePlan::CropOnly { rect }).unwrap_err();
        assert!(matches!(err, FitError::InvalidCropBounds { .. }));
    }

    #[test]
    fn test_rgba_resize_keeps_alpha_channel() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(20, 20, |x, _| {
            image::Rgba([200, 100, 50, if x < 10 { 255 } else { 128 }])
        }));
        let out = smooth_resize(img, 10, 10).unwrap();
        assert_eq!(out.dimensions(), (10, 10));
        assert!(matches!(out, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_luma_input_is_normalized_before_resize() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::new(12, 12));
        let out = smooth_resize(img, 6, 6).unwrap();
        assert_eq!(out.dimensions(), (6, 6));
    }

    #[test]
    fn test_upscale_from_one_pixel() {
        let img = create_test_image(1, 1);
        let out = smooth_resize(img, 100, 100).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
    }
}
