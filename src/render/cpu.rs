use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;

use crate::assets::decode::{PreparedImage, load_image};
use crate::canvas::CanvasSnapshot;
use crate::foundation::core::{Affine, ImageUri, Point, Size};
use crate::foundation::error::{MemeError, MemeResult};
use crate::foundation::math::flatten_onto;
use crate::overlay::model::OverlayContent;
use crate::render::composite::{Fit, Sprite, draw_sprite};
use crate::render::text::TextRenderer;
use crate::render::{CaptureFormat, CaptureOptions, FrameRGBA, Rasterizer, checked_extent};
use crate::settings::RasterSettings;

/// Software implementation of the capture capability.
///
/// Lays the canvas out the way the mobile screen does: background fitted into
/// a `view_width`-wide box, every overlay starting top-centre and then moved by
/// its own transform.
pub struct CpuRasterizer {
    settings: RasterSettings,
    text: Option<TextRenderer>,
    image_cache: HashMap<ImageUri, PreparedImage>,
}

impl CpuRasterizer {
    pub fn new(settings: RasterSettings) -> MemeResult<Self> {
        let text = match &settings.font_path {
            Some(path) => Some(TextRenderer::from_file(path)?),
            None => None,
        };
        Ok(Self {
            settings,
            text,
            image_cache: HashMap::new(),
        })
    }

    pub fn with_text_renderer(mut self, text: TextRenderer) -> Self {
        self.text = Some(text);
        self
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    fn image(&mut self, uri: &ImageUri) -> MemeResult<PreparedImage> {
        if let Some(img) = self.image_cache.get(uri) {
            return Ok(img.clone());
        }
        let img = load_image(uri, &self.settings.asset_root)?;
        self.image_cache.insert(uri.clone(), img.clone());
        Ok(img)
    }

    /// Logical canvas size for a scene.
    pub fn canvas_size(&self, scene: &CanvasSnapshot) -> Size {
        let w = self.settings.view_width;
        Size::new(w, w / scene.aspect_ratio.get())
    }

    /// Composite `scene` into premultiplied pixels without encoding.
    ///
    /// Images are decoded once per render; files edited between renders are
    /// picked up by the next one.
    #[tracing::instrument(skip(self, scene), fields(overlays = scene.overlays.len()))]
    pub fn render(&mut self, scene: &CanvasSnapshot) -> MemeResult<FrameRGBA> {
        scene.validate()?;
        let pr = self.settings.pixel_ratio;
        if !pr.is_finite() || pr <= 0.0 {
            return Err(MemeError::validation("pixel_ratio must be finite and > 0"));
        }
        let canvas = self.canvas_size(scene);
        let (width, height, len) = checked_extent(
            "canvas",
            (canvas.width * pr).round(),
            (canvas.height * pr).round(),
        )?;
        let device = Affine::scale(pr);
        let mut data = vec![0u8; len];
        self.image_cache.clear();

        let background = self.image(&scene.background_uri)?;
        let bg = Sprite {
            image: &background,
            size: canvas,
            fit: Fit::Contain,
        };
        draw_sprite(&mut data, width, height, &bg, device)?;

        let mut skipped_text = 0usize;
        for overlay in &scene.overlays {
            let (size, image, fit) = match &overlay.content {
                OverlayContent::Image(i) => {
                    let edge = self.settings.image_overlay_size;
                    (Size::new(edge, edge), self.image(&i.source_uri)?, Fit::Cover)
                }
                OverlayContent::Text(t) => {
                    let Some(text) = &self.text else {
                        skipped_text += 1;
                        continue;
                    };
                    let (size, tile) = text.render_tile(&t.content, &self.settings.text, pr)?;
                    (size, tile, Fit::Fill)
                }
            };
            let origin = Point::new((canvas.width - size.width) * 0.5, 0.0);
            let placement = overlay.transform.placement_matrix(origin, size);
            let sprite = Sprite {
                image: &image,
                size,
                fit,
            };
            draw_sprite(&mut data, width, height, &sprite, device * placement)?;
        }
        if skipped_text > 0 {
            tracing::warn!(skipped_text, "no font configured; text overlays were not drawn");
        }

        Ok(FrameRGBA {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Flatten onto the matte and write `<output_dir>/<file_name>-<n>.<ext>`.
    pub fn encode(&self, frame: &FrameRGBA, opts: &CaptureOptions) -> MemeResult<PathBuf> {
        let dir = &self.settings.output_dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        let path = next_free_path(dir, &opts.file_name, opts.format.extension());

        let mut rgb = Vec::with_capacity((frame.width as usize) * (frame.height as usize) * 3);
        for px in frame.data.chunks_exact(4) {
            rgb.extend_from_slice(&flatten_onto(
                [px[0], px[1], px[2], px[3]],
                self.settings.matte_rgb,
            ));
        }

        match opts.format {
            CaptureFormat::Jpeg => {
                let quality = ((opts.quality.clamp(0.0, 1.0) * 100.0).round() as u8).max(1);
                let file = File::create(&path)
                    .with_context(|| format!("create '{}'", path.display()))?;
                let mut writer = BufWriter::new(file);
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality)
                    .encode(
                        &rgb,
                        frame.width,
                        frame.height,
                        image::ExtendedColorType::Rgb8,
                    )
                    .with_context(|| format!("write jpeg '{}'", path.display()))?;
                writer
                    .flush()
                    .with_context(|| format!("flush '{}'", path.display()))?;
            }
            CaptureFormat::Png => {
                image::save_buffer_with_format(
                    &path,
                    &rgb,
                    frame.width,
                    frame.height,
                    image::ColorType::Rgb8,
                    image::ImageFormat::Png,
                )
                .with_context(|| format!("write png '{}'", path.display()))?;
            }
        }
        Ok(path)
    }
}

impl Rasterizer for CpuRasterizer {
    fn capture(&mut self, scene: &CanvasSnapshot, opts: &CaptureOptions) -> MemeResult<ImageUri> {
        let frame = self
            .render(scene)
            .map_err(|e| MemeError::capture(format!("render failed: {e}")))?;
        let path = self
            .encode(&frame, opts)
            .map_err(|e| MemeError::capture(format!("export failed: {e}")))?;
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        tracing::info!(path = %path.display(), width = frame.width, height = frame.height, "captured canvas");
        Ok(ImageUri::from_path(&path))
    }
}

fn next_free_path(dir: &std::path::Path, stem: &str, ext: &str) -> PathBuf {
    let stem = if stem.trim().is_empty() { "generated" } else { stem };
    let mut n = 1u64;
    loop {
        let candidate = dir.join(format!("{stem}-{n}.{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
