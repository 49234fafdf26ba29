//! Region descriptors
//!
//! - [`lbp_histogram`]: spatial histogram of local binary patterns, the
//!   feature vector handed to a [`RegionScorer`](crate::RegionScorer)
//! - [`color_means`]: mean color of the foreground pixels of a region

use crate::error::{RecogError, RecogResult};
use erfilter_core::stats::otsu_threshold;
use erfilter_core::{GrayImage, RgbImage};
use erfilter_region::Region;

/// Number of cells along each axis of the LBP grid (default)
pub const DEFAULT_CELLS: usize = 2;

/// Side of the normalized crop the LBP codes are computed on (default)
pub const DEFAULT_SIZE: u32 = 24;

/// Number of distinct 8-neighbour codes
const LBP_BINS: usize = 256;

/// Local binary pattern code of every pixel of `image` (square, `size` x
/// `size`). Border pixels get code 0.
///
/// Each neighbour brighter than the mean of the 8-neighbourhood sets one
/// bit, starting at the top-left neighbour and going clockwise.
fn lbp_codes(image: &GrayImage) -> Vec<u8> {
    let w = image.width() as usize;
    let h = image.height() as usize;
    let px = image.data();
    let mut codes = vec![0u8; w * h];

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let i = y * w + x;
            let ring = [
                px[i - w - 1],
                px[i - w],
                px[i - w + 1],
                px[i + 1],
                px[i + w + 1],
                px[i + w],
                px[i + w - 1],
                px[i - 1],
            ];
            let thresh = ring.iter().map(|&v| f64::from(v)).sum::<f64>() / 8.0;
            codes[i] = ring
                .iter()
                .enumerate()
                .filter(|&(_, &v)| f64::from(v) > thresh)
                .fold(0u8, |code, (bit, _)| code | (1 << bit));
        }
    }

    codes
}

/// Spatial LBP histogram of a region crop.
///
/// The crop is resized (nearest neighbour) to `size` x `size` and split
/// into `cells` x `cells` blocks; each block contributes a 256-bin histogram
/// of LBP codes, concatenated row-major. The result has
/// `cells * cells * 256` entries.
///
/// # Errors
///
/// Returns [`RecogError::InvalidParameter`] unless `1 <= cells <= size / 3`.
pub fn lbp_histogram(crop: &GrayImage, cells: usize, size: u32) -> RecogResult<Vec<f64>> {
    if cells == 0 || size < 3 || cells > (size / 3) as usize {
        return Err(RecogError::InvalidParameter(format!(
            "cannot split a {size}x{size} crop into {cells}x{cells} cells"
        )));
    }

    let normalized = crop.resize_nearest(size, size)?;
    let codes = lbp_codes(&normalized);
    let side = size as usize;
    let block = side / cells;

    let mut hist = vec![0.0; cells * cells * LBP_BINS];
    for m in 0..cells {
        for n in 0..cells {
            let base = (m * cells + n) * LBP_BINS;
            for i in 0..block {
                let row = (m * block + i) * side + n * block;
                for &code in &codes[row..row + block] {
                    hist[base + code as usize] += 1.0;
                }
            }
        }
    }

    Ok(hist)
}

/// Mean color of the foreground pixels of `region`.
///
/// The region's crop of `channel` is binarized with Otsu's threshold; pixels
/// at or below the threshold (the dark side, after inversion) form the
/// mask. Returns the per-channel mean of `color` under the mask, or zeros
/// when the mask is empty.
///
/// # Errors
///
/// Returns an error if `channel` and `color` differ in size or the region's
/// bound is not inside the image.
pub fn color_means(region: &Region, channel: &GrayImage, color: &RgbImage) -> RecogResult<[f64; 3]> {
    color.check_registered(channel)?;
    let bound = region.bound;
    let crop = channel.crop(&bound)?;
    let thresh = otsu_threshold(&crop.histogram());

    let mut sum = [0.0f64; 3];
    let mut count = 0u32;
    for y in 0..crop.height() {
        for x in 0..crop.width() {
            if crop.get_pixel_unchecked(x, y) > thresh {
                continue;
            }
            let Some(rgb) = color.get_rgb(bound.x as u32 + x, bound.y as u32 + y) else {
                continue;
            };
            for (acc, v) in sum.iter_mut().zip(rgb) {
                *acc += f64::from(v);
            }
            count += 1;
        }
    }

    if count == 0 {
        return Ok([0.0; 3]);
    }
    Ok(sum.map(|s| s / f64::from(count)))
}
