//! Synthetic images for regression tests

use crate::error::{TestError, TestResult};
use erfilter_core::{Box, GrayImage, RgbImage};

/// Uniform `width` x `height` image with every pixel set to `value`
pub fn uniform(width: u32, height: u32, value: u8) -> TestResult<GrayImage> {
    GrayImage::filled(width, height, value).map_err(|source| TestError::ImageBuild {
        name: "uniform",
        source,
    })
}

/// Background `background` with every box in `blobs` painted `foreground`
pub fn blobs(
    width: u32,
    height: u32,
    background: u8,
    foreground: u8,
    blobs: &[Box],
) -> TestResult<GrayImage> {
    let mut image = GrayImage::filled(width, height, background).map_err(|source| {
        TestError::ImageBuild {
            name: "blobs",
            source,
        }
    })?;
    for b in blobs {
        image.fill_box(b, foreground);
    }
    Ok(image)
}

/// Layout of a synthetic text line
#[derive(Debug, Clone)]
pub struct TextLineSpec {
    /// Number of glyphs
    pub glyphs: u32,
    /// Glyph width in pixels
    pub glyph_w: i32,
    /// Glyph height in pixels
    pub glyph_h: i32,
    /// Horizontal gap between glyphs
    pub gap: i32,
    /// Left margin and top margin
    pub origin: (i32, i32),
    /// Glyph intensity
    pub ink: u8,
    /// Background intensity
    pub paper: u8,
    /// Number of one-pixel anti-aliasing rings around each glyph, with
    /// intensities stepping from `ink` to `paper`
    pub halo: u8,
}

impl Default for TextLineSpec {
    fn default() -> Self {
        Self {
            glyphs: 6,
            glyph_w: 20,
            glyph_h: 40,
            gap: 10,
            origin: (20, 40),
            ink: 20,
            paper: 230,
            halo: 2,
        }
    }
}

impl TextLineSpec {
    /// Bounding boxes of the glyphs, left to right
    pub fn glyph_boxes(&self) -> Vec<Box> {
        (0..self.glyphs as i32)
            .map(|i| {
                Box::new_unchecked(
                    self.origin.0 + i * (self.glyph_w + self.gap),
                    self.origin.1,
                    self.glyph_w,
                    self.glyph_h,
                )
            })
            .collect()
    }

    /// Render as a grayscale image of the given size
    pub fn render(&self, width: u32, height: u32) -> TestResult<GrayImage> {
        let mut image = uniform(width, height, self.paper)?;
        let steps = i32::from(self.halo) + 1;
        let (ink, paper) = (i32::from(self.ink), i32::from(self.paper));

        for b in self.glyph_boxes() {
            // Outermost ring first, each inner ring painted over it
            for ring in (1..=i32::from(self.halo)).rev() {
                let value = ink + (paper - ink) * ring / steps;
                let outer = Box::new_unchecked(b.x - ring, b.y - ring, b.w + 2 * ring, b.h + 2 * ring);
                image.fill_box(&outer, value as u8);
            }
            image.fill_box(&b, self.ink);
        }
        Ok(image)
    }

    /// Render as a 3-channel image (all channels equal)
    pub fn render_rgb(&self, width: u32, height: u32) -> TestResult<RgbImage> {
        let gray = self.render(width, height)?;
        let data = gray.data().iter().flat_map(|&v| [v, v, v]).collect();
        RgbImage::from_vec(width, height, data).map_err(|source| TestError::ImageBuild {
            name: "text_line_rgb",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blobs() {
        let img = blobs(10, 10, 0, 200, &[Box::new_unchecked(1, 1, 2, 2)]).unwrap();
        assert_eq!(img.histogram()[200], 4);
    }

    #[test]
    fn test_text_line_boxes() {
        let spec = TextLineSpec::default();
        let boxes = spec.glyph_boxes();
        assert_eq!(boxes.len(), 6);
        assert_eq!(boxes[1].x - boxes[0].x, 30);
        let rgb = spec.render_rgb(240, 140).unwrap();
        assert_eq!(rgb.get_rgb(20, 40), Some([20, 20, 20]));
        assert_eq!(rgb.get_rgb(19, 40), Some([90, 90, 90]));
        assert_eq!(rgb.get_rgb(18, 40), Some([160, 160, 160]));
        assert_eq!(rgb.get_rgb(17, 40), Some([230, 230, 230]));
    }
}
