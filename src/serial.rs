use crate::{weights::convert_span, Dimensions};

/// Reference single-threaded conversion.
///
/// Walks the destination once, advancing the source by `stride` bytes per
/// pixel. Every other full-precision strategy must match its output byte for
/// byte.
pub fn convert(source: &[u8], luma: &mut [u8], dims: Dimensions) {
    debug_assert!(dims.check_buffers(source, luma).is_ok());

    convert_span(source, luma, dims.stride());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_and_rgba_agree() {
        let dims_rgb = Dimensions::new(3, 2, 3).unwrap();
        let dims_rgba = Dimensions::rgba(3, 2).unwrap();
        let pixels: [[u8; 3]; 6] = [
            [0, 0, 0],
            [255, 255, 255],
            [12, 200, 37],
            [90, 90, 90],
            [255, 0, 128],
            [1, 2, 3],
        ];
        let rgb: Vec<u8> = pixels.iter().flatten().copied().collect();
        let rgba: Vec<u8> = pixels.iter().flat_map(|p| [p[0], p[1], p[2], 0xAA]).collect();

        let mut from_rgb = vec![0u8; 6];
        let mut from_rgba = vec![0u8; 6];
        convert(&rgb, &mut from_rgb, dims_rgb);
        convert(&rgba, &mut from_rgba, dims_rgba);

        assert_eq!(from_rgb, from_rgba);
        assert_eq!(from_rgb[0], 0);
        assert_eq!(from_rgb[1], 255);
        assert_eq!(from_rgb[3], 90);
    }

    #[test]
    fn overwrites_previous_contents() {
        let dims = Dimensions::rgba(2, 1).unwrap();
        let mut luma = [0xFF, 0xFF];
        convert(&[0u8; 8], &mut luma, dims);
        assert_eq!(luma, [0, 0]);
    }
}
