use rayon::prelude::*;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Affine, Point, Size, Vec2};
use crate::foundation::error::{MemeError, MemeResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// How an image fills its layout box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fit {
    /// Stretch to the box.
    Fill,
    /// Whole image visible, letterboxed and centred.
    Contain,
    /// Box fully covered, overflow cropped and centred.
    Cover,
}

/// An image placed in a local layout box of `size` logical points.
#[derive(Clone, Copy, Debug)]
pub struct Sprite<'a> {
    pub image: &'a PreparedImage,
    pub size: Size,
    pub fit: Fit,
}

impl Sprite<'_> {
    /// Local box coordinates to image pixel coordinates.
    fn local_to_image(&self) -> Affine {
        let iw = f64::from(self.image.width);
        let ih = f64::from(self.image.height);
        let sx = self.size.width / iw;
        let sy = self.size.height / ih;
        match self.fit {
            Fit::Fill => Affine::scale_non_uniform(1.0 / sx, 1.0 / sy),
            Fit::Contain | Fit::Cover => {
                let s = if self.fit == Fit::Contain {
                    sx.min(sy)
                } else {
                    sx.max(sy)
                };
                let offset = Vec2::new(
                    (self.size.width - iw * s) * 0.5,
                    (self.size.height - ih * s) * 0.5,
                );
                Affine::scale(1.0 / s) * Affine::translate(-offset)
            }
        }
    }
}

/// Source-over `sprite` into a premultiplied RGBA8 target.
///
/// `to_device` maps the sprite's local box into target pixels. Rows are
/// composited in parallel.
pub fn draw_sprite(
    dst: &mut [u8],
    width: u32,
    height: u32,
    sprite: &Sprite<'_>,
    to_device: Affine,
) -> MemeResult<()> {
    let row_bytes = (width as usize) * 4;
    if dst.len() != row_bytes * (height as usize) {
        return Err(MemeError::validation(
            "draw_sprite expects a buffer matching width*height*4",
        ));
    }
    let Size {
        width: bw,
        height: bh,
    } = sprite.size;
    if sprite.image.width == 0 || sprite.image.height == 0 || bw <= 0.0 || bh <= 0.0 {
        return Ok(());
    }
    let det = to_device.determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return Ok(());
    }

    let corners = [
        Point::new(0.0, 0.0),
        Point::new(bw, 0.0),
        Point::new(0.0, bh),
        Point::new(bw, bh),
    ]
    .map(|p| to_device * p);
    let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for c in corners {
        x0 = x0.min(c.x);
        y0 = y0.min(c.y);
        x1 = x1.max(c.x);
        y1 = y1.max(c.y);
    }
    let x0 = x0.floor().clamp(0.0, f64::from(width)) as usize;
    let y0 = y0.floor().clamp(0.0, f64::from(height)) as usize;
    let x1 = x1.ceil().clamp(0.0, f64::from(width)) as usize;
    let y1 = y1.ceil().clamp(0.0, f64::from(height)) as usize;
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let to_local = to_device.inverse();
    let to_image = sprite.local_to_image();

    dst.par_chunks_mut(row_bytes)
        .enumerate()
        .skip(y0)
        .take(y1 - y0)
        .for_each(|(y, row)| {
            for x in x0..x1 {
                let local = to_local * Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if local.x < 0.0 || local.y < 0.0 || local.x >= bw || local.y >= bh {
                    continue;
                }
                let p = to_image * local;
                let Some(src) = sample_bilinear(sprite.image, p.x, p.y) else {
                    continue;
                };
                let i = x * 4;
                let out = over([row[i], row[i + 1], row[i + 2], row[i + 3]], src, 1.0);
                row[i..i + 4].copy_from_slice(&out);
            }
        });
    Ok(())
}

/// Bilinear lookup with pixel centres at `+0.5`; `None` outside the image.
fn sample_bilinear(img: &PreparedImage, u: f64, v: f64) -> Option<PremulRgba8> {
    let w = f64::from(img.width);
    let h = f64::from(img.height);
    if !(0.0..w).contains(&u) || !(0.0..h).contains(&v) {
        return None;
    }
    let fx = (u - 0.5).max(0.0);
    let fy = (v - 0.5).max(0.0);
    let xa = (fx.floor() as u32).min(img.width - 1);
    let ya = (fy.floor() as u32).min(img.height - 1);
    let xb = (xa + 1).min(img.width - 1);
    let yb = (ya + 1).min(img.height - 1);
    let tx = (fx - f64::from(xa)).clamp(0.0, 1.0);
    let ty = (fy - f64::from(ya)).clamp(0.0, 1.0);

    let (p00, p10) = (img.pixel(xa, ya), img.pixel(xb, ya));
    let (p01, p11) = (img.pixel(xa, yb), img.pixel(xb, yb));
    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = f64::from(p00[i]) * (1.0 - tx) + f64::from(p10[i]) * tx;
        let bottom = f64::from(p01[i]) * (1.0 - tx) + f64::from(p11[i]) * tx;
        out[i] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, px: PremulRgba8) -> PreparedImage {
        PreparedImage::from_premul(w, h, px.repeat((w * h) as usize)).unwrap()
    }

    fn px_at(buf: &[u8], width: u32, x: u32, y: u32) -> PremulRgba8 {
        let i = ((y * width + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn over_opacity_0_is_noop() {
        let dst = [1, 2, 3, 4];
        let src = [200, 200, 200, 200];
        assert_eq!(over(dst, src, 0.0), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let dst = [0, 0, 0, 0];
        let src = [100, 110, 120, 200];
        assert_eq!(over(dst, src, 1.0), src);
    }

    #[test]
    fn fill_sprite_covers_exactly_its_box() {
        let img = solid(2, 2, [255, 0, 0, 255]);
        let sprite = Sprite {
            image: &img,
            size: Size::new(4.0, 4.0),
            fit: Fit::Fill,
        };
        let mut buf = vec![0u8; 8 * 8 * 4];
        draw_sprite(&mut buf, 8, 8, &sprite, Affine::translate((2.0, 2.0))).unwrap();

        assert_eq!(px_at(&buf, 8, 2, 2), [255, 0, 0, 255]);
        assert_eq!(px_at(&buf, 8, 5, 5), [255, 0, 0, 255]);
        assert_eq!(px_at(&buf, 8, 1, 1), [0, 0, 0, 0]);
        assert_eq!(px_at(&buf, 8, 6, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn contain_letterboxes_and_cover_crops() {
        let wide = solid(4, 2, [0, 0, 255, 255]);
        let mut buf = vec![0u8; 4 * 4 * 4];
        let contain = Sprite {
            image: &wide,
            size: Size::new(4.0, 4.0),
            fit: Fit::Contain,
        };
        draw_sprite(&mut buf, 4, 4, &contain, Affine::IDENTITY).unwrap();
        assert_eq!(px_at(&buf, 4, 0, 0), [0, 0, 0, 0]);
        assert_eq!(px_at(&buf, 4, 0, 1), [0, 0, 255, 255]);
        assert_eq!(px_at(&buf, 4, 3, 2), [0, 0, 255, 255]);
        assert_eq!(px_at(&buf, 4, 3, 3), [0, 0, 0, 0]);

        let mut buf = vec![0u8; 4 * 4 * 4];
        let cover = Sprite {
            fit: Fit::Cover,
            ..contain
        };
        draw_sprite(&mut buf, 4, 4, &cover, Affine::IDENTITY).unwrap();
        assert!(buf.chunks_exact(4).all(|p| p == [0, 0, 255, 255]));
    }

    #[test]
    fn zero_scale_draws_nothing() {
        let img = solid(1, 1, [9, 9, 9, 255]);
        let sprite = Sprite {
            image: &img,
            size: Size::new(2.0, 2.0),
            fit: Fit::Fill,
        };
        let mut buf = vec![0u8; 16];
        draw_sprite(&mut buf, 2, 2, &sprite, Affine::scale(0.0)).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let img = solid(1, 1, [9, 9, 9, 255]);
        let sprite = Sprite {
            image: &img,
            size: Size::new(1.0, 1.0),
            fit: Fit::Fill,
        };
        let mut buf = vec![0u8; 15];
        assert!(draw_sprite(&mut buf, 2, 2, &sprite, Affine::IDENTITY).is_err());
    }
}
