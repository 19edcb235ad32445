//! Capture capability: flattening a canvas snapshot into one exported image.

pub(crate) mod composite;
pub(crate) mod cpu;
pub(crate) mod text;

use crate::canvas::CanvasSnapshot;
use crate::foundation::core::ImageUri;
use crate::foundation::error::{MemeError, MemeResult};

/// Largest accepted edge of a rendered frame or text tile, in device pixels.
pub const MAX_FRAME_EDGE: u32 = 16_384;
/// Largest accepted pixel count of a rendered frame or text tile.
pub const MAX_FRAME_PIXELS: u64 = 64 * 1024 * 1024;

/// Encoded output format of a capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureFormat {
    #[default]
    Jpeg,
    Png,
}

impl CaptureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptureOptions {
    pub format: CaptureFormat,
    /// Lossy quality in `[0, 1]`; ignored for PNG.
    pub quality: f32,
    /// Output file name stem.
    pub file_name: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            format: CaptureFormat::Jpeg,
            quality: 0.9,
            file_name: "generated".to_string(),
        }
    }
}

/// A rendered frame held in memory.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Device pixel extent for a `width` x `height` buffer, already rounded.
///
/// Rejects non-finite sizes and anything past [`MAX_FRAME_EDGE`] or
/// [`MAX_FRAME_PIXELS`]; returns the dimensions and the RGBA8 byte length.
pub(crate) fn checked_extent(
    what: &str,
    width: f64,
    height: f64,
) -> MemeResult<(u32, u32, usize)> {
    let edge = f64::from(MAX_FRAME_EDGE);
    if !width.is_finite() || !height.is_finite() || width > edge || height > edge {
        return Err(MemeError::validation(format!(
            "{what} of {width}x{height} px exceeds the {MAX_FRAME_EDGE} px edge limit"
        )));
    }
    let w = (width as u32).max(1);
    let h = (height as u32).max(1);
    let pixels = u64::from(w)
        .checked_mul(u64::from(h))
        .filter(|p| *p <= MAX_FRAME_PIXELS)
        .ok_or_else(|| {
            MemeError::validation(format!("{what} of {w}x{h} px exceeds {MAX_FRAME_PIXELS} pixels"))
        })?;
    let len = usize::try_from(pixels)
        .ok()
        .and_then(|p| p.checked_mul(4))
        .ok_or_else(|| MemeError::validation(format!("{what} buffer size overflow")))?;
    Ok((w, h, len))
}

/// Capture capability consumed by the editor.
///
/// Implementations run on the capture worker thread, hence `Send`.
pub trait Rasterizer: Send {
    fn capture(&mut self, scene: &CanvasSnapshot, opts: &CaptureOptions) -> MemeResult<ImageUri>;
}

impl<F> Rasterizer for F
where
    F: FnMut(&CanvasSnapshot, &CaptureOptions) -> MemeResult<ImageUri> + Send,
{
    fn capture(&mut self, scene: &CanvasSnapshot, opts: &CaptureOptions) -> MemeResult<ImageUri> {
        self(scene, opts)
    }
}
