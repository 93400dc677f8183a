//! Cost-volume construction: for every reference pixel and every candidate
//! displacement in the hint-centered search window, a census-Hamming cost
//! averaged over a square aggregation window.

use rayon::prelude::*;

use crate::census::CensusCode;
use crate::hint::HintField;
use crate::image;
use crate::rounding::round_half_away_from_zero;

/// Fixed cost charged when either the aggregation-window sample or its
/// hint-warped counterpart falls outside the image. Not configurable.
pub const DEFAULT_COST: u32 = 5;

/// A dense `H x W x D` matching-cost tensor, stored flat with `d` as the
/// innermost (fastest-varying) axis for inner-loop locality.
#[derive(Debug, Clone)]
pub struct CostVolume {
    data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Label-axis sizes: `wx = 2*rx+1` (slow axis), `wy = 2*ry+1` (fast axis).
    pub wx: usize,
    pub wy: usize,
}

impl CostVolume {
    fn new(width: usize, height: usize, wx: usize, wy: usize) -> Self {
        Self {
            data: vec![0u8; width * height * wx * wy],
            width,
            height,
            wx,
            wy,
        }
    }

    #[inline]
    pub fn d(&self) -> usize {
        self.wx * self.wy
    }

    /// Linearized label for an offset pair, matching the crate-wide
    /// convention `d = (ox + rx) * wy + (oy + ry)`.
    #[inline]
    pub fn label_of(&self, ox_idx: usize, oy_idx: usize) -> usize {
        ox_idx * self.wy + oy_idx
    }

    /// The `D`-length cost vector for pixel `(x, y)`.
    #[inline]
    pub fn labels(&self, x: usize, y: usize) -> &[u8] {
        let d = self.d();
        let base = (y * self.width + x) * d;
        &self.data[base..base + d]
    }

    #[inline]
    fn labels_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let d = self.d();
        let base = (y * self.width + x) * d;
        &mut self.data[base..base + d]
    }
}

/// Builds the cost volume for a pair of census-coded images.
///
/// `ra` is the aggregation half-window, `rx`/`ry` the search half-windows.
/// Per-pixel work is independent, so this is parallelized across rows.
#[allow(clippy::too_many_arguments)]
pub fn build_cost_volume(
    cen1: &[CensusCode],
    cen2: &[CensusCode],
    width: usize,
    height: usize,
    hint: &HintField,
    ra: i32,
    rx: i32,
    ry: i32,
) -> CostVolume {
    let wx = (2 * rx + 1) as usize;
    let wy = (2 * ry + 1) as usize;
    let mut volume = CostVolume::new(width, height, wx, wy);
    let n = ((2 * ra + 1) * (2 * ra + 1)) as u32;

    volume
        .data
        .par_chunks_mut(width * wx * wy)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..width {
                let (mvx, mvy) = hint.get(x, y);
                let labels = &mut row[x * wx * wy..(x + 1) * wx * wy];
                for ox in -rx..=rx {
                    for oy in -ry..=ry {
                        let label = ((ox + rx) as usize) * wy + (oy + ry) as usize;
                        labels[label] = aggregate_one_label(
                            cen1, cen2, width, height, x, y, ox, oy, mvx, mvy, ra, n,
                        );
                    }
                }
            }
        });

    volume
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn aggregate_one_label(
    cen1: &[CensusCode],
    cen2: &[CensusCode],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    ox: i32,
    oy: i32,
    mvx: f64,
    mvy: f64,
    ra: i32,
    n: u32,
) -> u8 {
    let mut sum: u32 = 0;
    for ay in -ra..=ra {
        for ax in -ra..=ra {
            let y1 = y as i64 + ay as i64;
            let x1 = x as i64 + ax as i64;
            if !image::in_bounds(x1, y1, width, height) {
                sum += DEFAULT_COST;
                continue;
            }
            let y2 = round_half_away_from_zero(y1 as f64 + oy as f64 + mvy);
            let x2 = round_half_away_from_zero(x1 as f64 + ox as f64 + mvx);
            if !image::in_bounds(x2, y2, width, height) {
                sum += DEFAULT_COST;
                continue;
            }
            let c1 = cen1[y1 as usize * width + x1 as usize];
            let c2 = cen2[y2 as usize * width + x2 as usize];
            sum += (c1 ^ c2).count_ones();
        }
    }
    // round half up on a non-negative quantity, saturating to u8.
    let rounded = (sum as f64 / n as f64 + 0.5) as u32;
    rounded.min(u8::MAX as u32) as u8
}
