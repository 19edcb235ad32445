//! Tunables with environment overrides.
//!
//! | variable               | default                 |
//! |------------------------|-------------------------|
//! | `MEMEKIT_SETTLE_MS`    | `100`                   |
//! | `MEMEKIT_OUTPUT_DIR`   | `$TMPDIR/memekit`       |
//! | `MEMEKIT_ASSET_ROOT`   | `.`                     |
//! | `MEMEKIT_VIEW_WIDTH`   | `360`                   |
//! | `MEMEKIT_PIXEL_RATIO`  | `2`                     |
//! | `MEMEKIT_FONT`         | unset (text is skipped) |
//! | `MEMEKIT_TEXT_COLOR`   | `#11181C`               |

use std::path::PathBuf;
use std::time::Duration;

use crate::foundation::core::Rgba8Premul;
use crate::overlay::collection::TextIdPolicy;

/// Screen-level behaviour of [`crate::MemeEditor`].
#[derive(Clone, Debug)]
pub struct EditorSettings {
    /// Wait between freezing input and invoking capture.
    pub settle_delay: Duration,
    pub text_id_policy: TextIdPolicy,
    /// Floor applied to pinch samples on new overlays.
    pub min_overlay_scale: Option<f64>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            text_id_policy: TextIdPolicy::Monotonic,
            min_overlay_scale: None,
        }
    }
}

impl EditorSettings {
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Some(ms) = env_parse::<u64>("MEMEKIT_SETTLE_MS") {
            s.settle_delay = Duration::from_millis(ms);
        }
        s
    }
}

/// Text box styling, in logical points.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub padding: f32,
    pub min_width: f32,
    pub color: Rgba8Premul,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            padding: 8.0,
            min_width: 100.0,
            color: Rgba8Premul::from_straight_rgba(0x11, 0x18, 0x1c, 255),
        }
    }
}

/// Layout and output configuration of [`crate::CpuRasterizer`].
#[derive(Clone, Debug)]
pub struct RasterSettings {
    /// Canvas width in logical points; height follows the aspect ratio.
    pub view_width: f64,
    /// Device pixels per logical point.
    pub pixel_ratio: f64,
    /// Base directory for relative image URIs.
    pub asset_root: PathBuf,
    pub output_dir: PathBuf,
    pub font_path: Option<PathBuf>,
    pub text: TextStyle,
    /// Edge length of the square box image overlays are fitted into.
    pub image_overlay_size: f64,
    /// Opaque colour the canvas is flattened onto.
    pub matte_rgb: [u8; 3],
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            view_width: 360.0,
            pixel_ratio: 2.0,
            asset_root: PathBuf::from("."),
            output_dir: std::env::temp_dir().join("memekit"),
            font_path: None,
            text: TextStyle::default(),
            image_overlay_size: 150.0,
            matte_rgb: [255, 255, 255],
        }
    }
}

impl RasterSettings {
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Some(dir) = env_path("MEMEKIT_OUTPUT_DIR") {
            s.output_dir = dir;
        }
        if let Some(root) = env_path("MEMEKIT_ASSET_ROOT") {
            s.asset_root = root;
        }
        if let Some(w) = env_parse::<f64>("MEMEKIT_VIEW_WIDTH").filter(|w| *w > 0.0) {
            s.view_width = w;
        }
        if let Some(r) = env_parse::<f64>("MEMEKIT_PIXEL_RATIO").filter(|r| *r > 0.0) {
            s.pixel_ratio = r;
        }
        s.font_path = env_path("MEMEKIT_FONT");
        if let Ok(hex) = std::env::var("MEMEKIT_TEXT_COLOR") {
            match Rgba8Premul::from_hex(hex.trim()) {
                Ok(color) => s.text.color = color,
                Err(err) => tracing::warn!(%err, "ignoring MEMEKIT_TEXT_COLOR"),
            }
        }
        s
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
