use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{AspectRatio, ImageUri};
use crate::foundation::error::{MemeError, MemeResult};
use crate::foundation::math::premultiply_rgba8_in_place;

#[derive(Clone, Debug)]
/// Decoded raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap already-premultiplied pixels, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> MemeResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| MemeError::validation("image size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(MemeError::validation(format!(
                "expected {expected} rgba8 bytes for {width}x{height}, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[i..i + 4];
        [p[0], p[1], p[2], p[3]]
    }
}

pub fn decode_image(bytes: &[u8]) -> MemeResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Resolve `uri` against `root` and decode the file it names.
pub fn load_image(uri: &ImageUri, root: &Path) -> MemeResult<PreparedImage> {
    let path = uri.to_path(root)?;
    let bytes = std::fs::read(&path)
        .map_err(|e| MemeError::asset(format!("read '{}': {e}", path.display())))?;
    decode_image(&bytes).map_err(|e| MemeError::asset(format!("decode '{uri}': {e}")))
}

/// Image dimension lookup used to size the canvas.
pub trait AspectProbe {
    /// Width and height of the image behind `uri`.
    fn dimensions(&self, uri: &ImageUri) -> MemeResult<(u32, u32)>;

    /// Aspect ratio, or `None` when the probe fails or reports a degenerate size.
    fn aspect_ratio(&self, uri: &ImageUri) -> Option<AspectRatio> {
        match self.dimensions(uri) {
            Ok((w, h)) => AspectRatio::from_dimensions(w, h),
            Err(err) => {
                tracing::warn!(%uri, error = %err, "image dimension probe failed");
                None
            }
        }
    }
}

/// Reads dimensions from image headers on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsAspectProbe {
    root: std::path::PathBuf,
}

impl FsAspectProbe {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AspectProbe for FsAspectProbe {
    fn dimensions(&self, uri: &ImageUri) -> MemeResult<(u32, u32)> {
        let path = uri.to_path(&self.root)?;
        image::image_dimensions(&path)
            .map_err(|e| MemeError::asset(format!("probe '{}': {e}", path.display())))
    }
}
