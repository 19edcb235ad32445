use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};

use crate::assets::decode::PreparedImage;
use crate::foundation::core::Size;
use crate::foundation::error::{MemeError, MemeResult};
use crate::render::checked_extent;
use crate::settings::TextStyle;

/// Lays out and rasterizes text boxes with a single font.
#[derive(Clone)]
pub struct TextRenderer {
    font: FontArc,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

struct LineLayout {
    glyphs: Vec<(GlyphId, f32)>,
    width: f32,
}

impl TextRenderer {
    pub fn from_bytes(bytes: Vec<u8>) -> MemeResult<Self> {
        let font =
            FontArc::try_from_vec(bytes).map_err(|e| MemeError::asset(format!("invalid font: {e}")))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> MemeResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| MemeError::asset(format!("read font '{}': {e}", path.display())))?;
        Self::from_bytes(bytes)
    }

    fn layout_lines(&self, content: &str, px: f32) -> Vec<LineLayout> {
        let scaled = self.font.as_scaled(PxScale::from(px));
        content
            .split('\n')
            .map(|line| {
                let mut glyphs = Vec::with_capacity(line.len());
                let mut cursor = 0.0f32;
                let mut prev: Option<GlyphId> = None;
                for ch in line.chars() {
                    let id = self.font.glyph_id(ch);
                    if let Some(p) = prev {
                        cursor += scaled.kern(p, id);
                    }
                    glyphs.push((id, cursor));
                    cursor += scaled.h_advance(id);
                    prev = Some(id);
                }
                LineLayout {
                    glyphs,
                    width: cursor,
                }
            })
            .collect()
    }

    /// Logical size of the text box: padded, at least `min_width` wide.
    pub fn measure(&self, content: &str, style: &TextStyle) -> Size {
        let lines = self.layout_lines(content, style.font_size);
        let line_height = self.font.as_scaled(PxScale::from(style.font_size)).height();
        let text_w = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
        let width = (text_w + 2.0 * style.padding).max(style.min_width);
        let height = line_height * lines.len() as f32 + 2.0 * style.padding;
        Size::new(f64::from(width), f64::from(height))
    }

    /// Rasterize `content` centred in its box at `pixel_ratio` device pixels per point.
    ///
    /// Returns the logical box size and the premultiplied tile covering it.
    pub fn render_tile(
        &self,
        content: &str,
        style: &TextStyle,
        pixel_ratio: f64,
    ) -> MemeResult<(Size, PreparedImage)> {
        let size = self.measure(content, style);
        let pr = pixel_ratio as f32;
        let (tile_w, tile_h, len) = checked_extent(
            "text tile",
            (size.width * pixel_ratio).ceil(),
            (size.height * pixel_ratio).ceil(),
        )?;

        let px = style.font_size * pr;
        let scaled = self.font.as_scaled(PxScale::from(px));
        let line_height = scaled.height();
        let ascent = scaled.ascent();

        let mut coverage = vec![0.0f32; (tile_w as usize) * (tile_h as usize)];
        for (i, line) in self.layout_lines(content, px).iter().enumerate() {
            let left = (tile_w as f32 - line.width) * 0.5;
            let baseline = style.padding * pr + line_height * i as f32 + ascent;
            for &(id, x) in &line.glyphs {
                let glyph = id.with_scale_and_position(px, point(left + x, baseline));
                let Some(outlined) = self.font.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, c| {
                    let x = bounds.min.x as i64 + i64::from(gx);
                    let y = bounds.min.y as i64 + i64::from(gy);
                    if x < 0 || y < 0 || x >= i64::from(tile_w) || y >= i64::from(tile_h) {
                        return;
                    }
                    let idx = (y as usize) * (tile_w as usize) + x as usize;
                    coverage[idx] = (coverage[idx] + c).min(1.0);
                });
            }
        }

        let color = style.color.to_array();
        let mut rgba = Vec::with_capacity(len);
        for c in coverage {
            for ch in color {
                rgba.push((f32::from(ch) * c).round() as u8);
            }
        }
        let tile = PreparedImage::from_premul(tile_w, tile_h, rgba)?;
        Ok((size, tile))
    }
}
