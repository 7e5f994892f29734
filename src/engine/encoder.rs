// src/engine/encoder.rs
//
// JPEG encoding via mozjpeg with an explicit quality factor, plus destination
// delivery. Only invoked when a request names a destination.

use crate::engine::common::run_with_panic_policy;
use crate::engine::io::Destination;
use crate::engine::MAX_DIMENSION;
use crate::error::{FitError, Result};
use image::DynamicImage;
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;
use std::io::Write;

/// Map the request's [0,1] quality factor onto mozjpeg's 0-100 scale.
/// Out-of-range values are clamped.
pub fn jpeg_quality(quality: f32) -> f32 {
    quality.clamp(0.0, 1.0) * 100.0
}

/// Encode to JPEG using mozjpeg with progressive, optimized-coding settings.
pub fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        // Avoid conversion if already RGB8
        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
            _ => Cow::Owned(img.to_rgb8()),
        };
        let (w, h) = rgb.dimensions();
        let pixels: &[u8] = rgb.as_raw();

        if w == 0 || h == 0 {
            return Err(FitError::encode_failed("jpeg", "zero-sized image"));
        }
        if w > MAX_DIMENSION || h > MAX_DIMENSION {
            return Err(FitError::dimension_exceeds_limit(w.max(h), MAX_DIMENSION));
        }

        let expected_len = (w as usize) * (h as usize) * 3;
        if pixels.len() != expected_len {
            return Err(FitError::encode_failed(
                "jpeg",
                "pixel buffer does not match image dimensions",
            ));
        }

        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_quality(jpeg_quality(quality));
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);

        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                FitError::encode_failed("jpeg", format!("mozjpeg: failed to start compress: {e:?}"))
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    FitError::encode_failed(
                        "jpeg",
                        format!("mozjpeg: failed to write scanlines: {e:?}"),
                    )
                })?;
            }

            writer.finish().map_err(|e| {
                FitError::encode_failed("jpeg", format!("mozjpeg: failed to finish: {e:?}"))
            })?;
        }

        Ok(output)
    })
}

/// Encode and deliver to the destination. Returns the bytes for `Buffer`
/// destinations, `None` after a successful path write.
///
/// Path writes go through a sibling temp file and persist atomically: a
/// failed encode or write leaves nothing at the destination.
pub fn write_destination(
    img: &DynamicImage,
    quality: f32,
    dest: Destination,
) -> Result<Option<Vec<u8>>> {
    let bytes = encode_jpeg(img, quality)?;
    match dest {
        Destination::Buffer => Ok(Some(bytes)),
        Destination::Path(path) => {
            let display = path.to_string_lossy().to_string();
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => std::path::Path::new("."),
            };
            let mut tmp = tempfile::NamedTempFile::new_in(dir)
                .map_err(|e| FitError::file_write_failed(display.clone(), e))?;
            tmp.write_all(&bytes)
                .map_err(|e| FitError::file_write_failed(display.clone(), e))?;
            tmp.persist(&path)
                .map_err(|e| FitError::file_write_failed(display, e.error))?;
            Ok(None)
        }
    }
}
