//! Census transform: per-pixel bit-codes recording which neighbors in a
//! fixed-radius window are strictly brighter than the center.

use rayon::prelude::*;
use v_frame::plane::Plane;

use crate::image;

/// Neighborhood radius used throughout the crate. `rc = 2` yields
/// `(2*rc+1)^2 - 1 == 24` comparison bits, which fits comfortably in a
/// [`CensusCode`].
pub const CENSUS_RADIUS: i32 = 2;

/// A census bit-code. 24 bits are used at `CENSUS_RADIUS == 2`; the type
/// must hold at least that many.
pub type CensusCode = u32;

/// Computes the census code for a single pixel.
///
/// Neighbors are visited in row-major order over
/// `[-radius, radius] x [-radius, radius]`, skipping the center. An
/// out-of-image neighbor contributes a `0` bit rather than being skipped,
/// so the bit position for a given neighbor offset is stable regardless of
/// how close `(x, y)` is to the border.
#[inline]
pub fn census_at(plane: &Plane<u8>, x: usize, y: usize, radius: i32) -> CensusCode {
    let width = plane.cfg.width;
    let height = plane.cfg.height;
    let center = image::sample(plane, x, y) as i32;

    let mut code: CensusCode = 0;
    let mut bit = 0u32;
    for j in -radius..=radius {
        for i in -radius..=radius {
            if i == 0 && j == 0 {
                continue;
            }
            let nx = x as i64 + i as i64;
            let ny = y as i64 + j as i64;
            if image::in_bounds(nx, ny, width, height) {
                let neighbor = image::sample(plane, nx as usize, ny as usize) as i32;
                if neighbor > center {
                    code |= 1 << bit;
                }
            }
            bit += 1;
        }
    }
    code
}

/// Computes the census transform of a full plane, shape-matching the
/// input. Independent per pixel, so this is parallelized across rows.
pub fn census_transform(plane: &Plane<u8>, radius: i32) -> Vec<CensusCode> {
    let width = plane.cfg.width;
    let height = plane.cfg.height;
    let mut out = vec![0 as CensusCode; width * height];
    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, code) in row.iter_mut().enumerate() {
                *code = census_at(plane, x, y, radius);
            }
        });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::plane_from_samples;

    #[test]
    fn self_comparison_has_zero_hamming_distance() {
        let samples: Vec<u8> = (0..64).map(|i| (i * 7 % 251) as u8).collect();
        let plane = plane_from_samples(8, 8, &samples);
        let cen = census_transform(&plane, CENSUS_RADIUS);
        for y in 0..8 {
            for x in 0..8 {
                let a = cen[y * 8 + x];
                assert_eq!((a ^ a).count_ones(), 0);
            }
        }
    }

    #[test]
    fn constant_image_has_all_zero_codes() {
        let samples = vec![128u8; 36];
        let plane = plane_from_samples(6, 6, &samples);
        let cen = census_transform(&plane, CENSUS_RADIUS);
        assert!(cen.iter().all(|&c| c == 0));
    }

    #[test]
    fn strictly_brighter_neighbor_sets_exactly_one_bit() {
        // 5x5 image, all zero except one neighbor of the center pixel.
        let mut samples = vec![0u8; 25];
        let cx = 2;
        let cy = 2;
        samples[(cy - 1) * 5 + (cx - 1)] = 10; // top-left neighbor, offset (-1, -1)
        let plane = plane_from_samples(5, 5, &samples);
        let code = census_at(&plane, cx, cy, CENSUS_RADIUS);
        assert_eq!(code.count_ones(), 1);
    }

    #[test]
    fn border_pixel_ignores_out_of_image_neighbors() {
        let samples = vec![0u8; 25];
        let plane = plane_from_samples(5, 5, &samples);
        // Corner pixel: most of its rc=2 neighborhood is out of image.
        let code = census_at(&plane, 0, 0, CENSUS_RADIUS);
        assert_eq!(code, 0);
    }
}
