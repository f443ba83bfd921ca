//! Adaptive palette reduction for png8 output.

use color_quant::NeuQuant;
use image::DynamicImage;
use std::collections::HashMap;

/// Maximum palette size of an 8-bit indexed image
pub const MAX_PALETTE_SIZE: usize = 256;

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// One byte per pixel indexing into an RGBA palette.
#[derive(Debug, Clone)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    pub palette: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

impl IndexedImage {
    /// Palette as packed RGB triples, the layout of a PNG `PLTE` chunk
    pub fn rgb_palette(&self) -> Vec<u8> {
        self.palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect()
    }

    /// Alpha per palette entry, or `None` when every entry is opaque
    pub fn transparency(&self) -> Option<Vec<u8>> {
        if self.palette.iter().all(|c| c[3] == u8::MAX) {
            return None;
        }
        Some(self.palette.iter().map(|c| c[3]).collect())
    }
}

/// Reduce an image to at most 256 colors.
///
/// Images that already use 256 colors or fewer keep them exactly. Anything
/// richer is fitted with a NeuQuant network.
pub fn quantize(img: &DynamicImage) -> IndexedImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = rgba.as_raw();

    if let Some((palette, indices)) = exact_palette(pixels) {
        return IndexedImage {
            width,
            height,
            palette,
            indices,
        };
    }

    let quant = NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, MAX_PALETTE_SIZE, pixels);
    let palette = quant
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();
    let indices = pixels
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();

    IndexedImage {
        width,
        height,
        palette,
        indices,
    }
}

/// Palette in first-seen order, or `None` past 256 distinct colors
fn exact_palette(pixels: &[u8]) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::new();
    let mut palette = Vec::new();
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        let index = match lookup.get(&color) {
            Some(&index) => index,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let index = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, index);
                index
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::collections::HashSet;

    fn used_colors(img: &IndexedImage) -> usize {
        img.indices.iter().collect::<HashSet<_>>().len()
    }

    #[test]
    fn test_few_colors_kept_exactly() {
        let img = RgbImage::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let indexed = quantize(&DynamicImage::ImageRgb8(img));

        assert_eq!(indexed.palette, vec![[255, 0, 0, 255], [0, 0, 255, 255]]);
        assert_eq!(indexed.indices.len(), 16);
        assert_eq!(&indexed.indices[0..4], &[0, 0, 1, 1]);
        assert!(indexed.transparency().is_none());
    }

    #[test]
    fn test_many_colors_capped_at_256() {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        });
        let indexed = quantize(&DynamicImage::ImageRgb8(img));

        assert!(indexed.palette.len() <= MAX_PALETTE_SIZE);
        assert_eq!(indexed.indices.len(), 64 * 64);
        assert!(used_colors(&indexed) <= MAX_PALETTE_SIZE);
        assert!(used_colors(&indexed) > 16);
    }

    #[test]
    fn test_exactly_256_colors_not_approximated() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(y * 16 + x) as u8, 0, 0]));
        let indexed = quantize(&DynamicImage::ImageRgb8(img));
        assert_eq!(indexed.palette.len(), 256);
        assert_eq!(used_colors(&indexed), 256);
    }

    #[test]
    fn test_transparency_reported() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let indexed = quantize(&DynamicImage::ImageRgba8(img));

        assert_eq!(indexed.transparency(), Some(vec![255, 0]));
        assert_eq!(indexed.rgb_palette(), vec![0, 0, 0, 0, 0, 0]);
    }
}
