use std::path::{Path, PathBuf};

use crate::foundation::error::{MemeError, MemeResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Opaque image location as handed around by pickers, catalogs and capture.
///
/// Accepted forms are `file://` URIs and plain filesystem paths. Other schemes
/// are carried verbatim but cannot be resolved by the filesystem loaders.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageUri(String);

impl ImageUri {
    /// Wrap a raw URI string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build a `file://` URI for a filesystem path.
    pub fn from_path(path: &Path) -> Self {
        Self(format!("file://{}", path.display()))
    }

    /// Borrow the raw URI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to a filesystem path; relative paths are joined onto `root`.
    pub fn to_path(&self, root: &Path) -> MemeResult<PathBuf> {
        let raw = self.0.trim();
        if raw.is_empty() {
            return Err(MemeError::asset("empty image uri"));
        }
        if let Some(rest) = raw.strip_prefix("file://") {
            return Ok(PathBuf::from(rest));
        }
        if let Some((scheme, _)) = raw.split_once("://") {
            return Err(MemeError::asset(format!(
                "unsupported uri scheme '{scheme}' in '{raw}'"
            )));
        }
        let p = Path::new(raw);
        if p.is_absolute() {
            Ok(p.to_path_buf())
        } else {
            Ok(root.join(p))
        }
    }
}

impl std::fmt::Display for ImageUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageUri {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ImageUri {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Width over height of a background image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AspectRatio(f64);

impl AspectRatio {
    /// Fallback box used while the real ratio is unknown.
    pub const DEFAULT: AspectRatio = AspectRatio(1.0);

    /// `None` for zero, negative or non-finite ratios ("unknown").
    pub fn new(ratio: f64) -> Option<Self> {
        (ratio.is_finite() && ratio > 0.0).then_some(Self(ratio))
    }

    pub fn from_dimensions(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Self::new(f64::from(width) / f64::from(height))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> MemeResult<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let byte = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| MemeError::validation(format!("invalid hex color '{hex}'")))
        };
        match digits.len() {
            6 => Ok(Self::from_straight_rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Ok(Self::from_straight_rgba(
                byte(0)?,
                byte(2)?,
                byte(4)?,
                byte(6)?,
            )),
            _ => Err(MemeError::validation(format!("invalid hex color '{hex}'"))),
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_resolution_handles_file_scheme_and_relative_paths() {
        let root = Path::new("/assets");
        assert_eq!(
            ImageUri::new("file:///tmp/a.png").to_path(root).unwrap(),
            PathBuf::from("/tmp/a.png")
        );
        assert_eq!(
            ImageUri::new("templates/drake.jpg").to_path(root).unwrap(),
            PathBuf::from("/assets/templates/drake.jpg")
        );
        assert!(ImageUri::new("https://i.imgflip.com/x.jpg").to_path(root).is_err());
        assert!(ImageUri::new("  ").to_path(root).is_err());
    }

    #[test]
    fn aspect_ratio_rejects_degenerate_sizes() {
        assert!(AspectRatio::from_dimensions(0, 10).is_none());
        assert!(AspectRatio::from_dimensions(10, 0).is_none());
        assert!(AspectRatio::new(f64::NAN).is_none());
        let r = AspectRatio::from_dimensions(400, 300).unwrap();
        assert!((r.get() - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn hex_colors_parse_and_premultiply() {
        let c = Rgba8Premul::from_hex("#11181C").unwrap();
        assert_eq!(c.to_array(), [0x11, 0x18, 0x1c, 255]);
        let half = Rgba8Premul::from_hex("ff000080").unwrap();
        assert_eq!(half.a, 128);
        assert_eq!(half.r, 128);
        assert!(Rgba8Premul::from_hex("#12").is_err());
        assert!(Rgba8Premul::from_hex("#zzzzzz").is_err());
    }
}
