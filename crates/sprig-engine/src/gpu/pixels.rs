use super::PixelFormat;

/// Expands source pixels to tightly packed RGBA8.
///
/// Channel mapping:
/// - `Rgb`            → `(r, g, b, 255)`
/// - `Luminance`      → `(l, l, l, 255)`
/// - `LuminanceAlpha` → `(l, l, l, a)`
/// - `Alpha`          → `(0, 0, 0, a)`
///
/// Trailing bytes that do not form a whole pixel are ignored.
pub fn expand_to_rgba8(format: PixelFormat, pixels: &[u8]) -> Vec<u8> {
    if format == PixelFormat::Rgba {
        return pixels.to_vec();
    }

    let bpp = format.bytes_per_pixel();
    let mut out = Vec::with_capacity(pixels.len() / bpp * 4);

    for px in pixels.chunks_exact(bpp) {
        let rgba = match format {
            PixelFormat::Rgb => [px[0], px[1], px[2], 255],
            PixelFormat::Luminance => [px[0], px[0], px[0], 255],
            PixelFormat::LuminanceAlpha => [px[0], px[0], px[0], px[1]],
            PixelFormat::Alpha => [0, 0, 0, px[0]],
            PixelFormat::Rgba => [px[0], px[1], px[2], px[3]],
        };
        out.extend_from_slice(&rgba);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_is_passed_through() {
        let px = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(expand_to_rgba8(PixelFormat::Rgba, &px), px.to_vec());
    }

    #[test]
    fn rgb_gets_opaque_alpha() {
        assert_eq!(
            expand_to_rgba8(PixelFormat::Rgb, &[10, 20, 30, 40, 50, 60]),
            vec![10, 20, 30, 255, 40, 50, 60, 255]
        );
    }

    #[test]
    fn luminance_replicates_into_rgb() {
        assert_eq!(expand_to_rgba8(PixelFormat::Luminance, &[7]), vec![7, 7, 7, 255]);
        assert_eq!(
            expand_to_rgba8(PixelFormat::LuminanceAlpha, &[7, 128]),
            vec![7, 7, 7, 128]
        );
    }

    #[test]
    fn alpha_only_is_black_with_coverage() {
        assert_eq!(expand_to_rgba8(PixelFormat::Alpha, &[0, 200]), vec![0, 0, 0, 0, 0, 0, 0, 200]);
    }
}
