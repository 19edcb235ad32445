pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Premultiply straight-alpha RGBA8 pixels in place.
pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

/// Drop a premultiplied pixel onto an opaque matte, yielding RGB.
pub(crate) fn flatten_onto(px: [u8; 4], matte: [u8; 3]) -> [u8; 3] {
    let inv = 255u16 - u16::from(px[3]);
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = px[i].saturating_add(mul_div255_u8(u16::from(matte[i]), inv));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div255_variants_align() {
        for x in [0u16, 1, 127, 255] {
            for y in [0u16, 1, 127, 255] {
                assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
            }
        }
    }

    #[test]
    fn premultiply_zeroes_transparent_pixels() {
        let mut px = vec![100u8, 50, 200, 128, 9, 9, 9, 0];
        premultiply_rgba8_in_place(&mut px);
        assert_eq!(
            px,
            vec![
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128,
                0,
                0,
                0,
                0
            ]
        );
    }

    #[test]
    fn flatten_transparent_yields_matte_and_opaque_yields_pixel() {
        assert_eq!(flatten_onto([0, 0, 0, 0], [255, 255, 255]), [255, 255, 255]);
        assert_eq!(flatten_onto([10, 20, 30, 255], [255, 255, 255]), [10, 20, 30]);
    }
}
