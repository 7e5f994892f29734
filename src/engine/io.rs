// src/engine/io.rs
//
// Source and destination forms. A request names exactly one source; the enum
// variants are listed in resolution priority order: an already-decoded raster
// wins over bytes, bytes over an open file handle, a handle over a path.

use crate::engine::decoder;
use crate::error::{FitError, Result};
use image::DynamicImage;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Image source.
#[derive(Debug)]
pub enum Source {
    /// Already-decoded raster; used as-is.
    Raster(DynamicImage),
    /// In-memory encoded image data.
    Memory(Arc<Vec<u8>>),
    /// Open file handle; read to the end and decoded.
    File(File),
    /// Memory-mapped file (zero-copy access to the encoded bytes).
    Mapped(Arc<Mmap>),
    /// File path; memory-mapped on resolution.
    Path(PathBuf),
}

impl Source {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Source::Memory(Arc::new(data))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    /// Resolve to a decoded raster, enforcing the decompression-bomb limits.
    pub fn resolve(self) -> Result<DynamicImage> {
        match self {
            Source::Raster(img) => {
                decoder::check_dimensions(img.width(), img.height())?;
                Ok(img)
            }
            Source::Memory(data) => decoder::decode_image(&data),
            Source::File(mut file) => {
                let mut data = Vec::new();
                file.read_to_end(&mut data).map_err(|e| {
                    FitError::source_unavailable(format!("cannot read source file handle: {e}"))
                })?;
                decoder::decode_image(&data)
            }
            Source::Mapped(mmap) => decoder::decode_image(mmap.as_ref()),
            Source::Path(path) => {
                let display = path.to_string_lossy().to_string();
                let file =
                    File::open(&path).map_err(|e| FitError::file_read_failed(display.clone(), e))?;
                // The mapping stays valid after the handle is dropped.
                let mmap = unsafe { Mmap::map(&file) }
                    .map_err(|e| FitError::mmap_failed(display, e))?;
                decoder::decode_image(&mmap)
            }
        }
    }
}

impl From<DynamicImage> for Source {
    fn from(img: DynamicImage) -> Self {
        Source::Raster(img)
    }
}

impl From<Vec<u8>> for Source {
    fn from(data: Vec<u8>) -> Self {
        Source::from_bytes(data)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

/// Where the encoded result goes, if anywhere. Omitted entirely when the
/// caller only wants the raster back.
#[derive(Clone, Debug)]
pub enum Destination {
    /// Write a JPEG file at this path.
    Path(PathBuf),
    /// Return the encoded JPEG bytes on the result.
    Buffer,
}
