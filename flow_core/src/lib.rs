//! Dense, census/SGM-based optical flow for a single level of a
//! coarse-to-fine pyramidal flow pipeline.
//!
//! Given two equal-shaped grayscale image planes and an upscaled
//! motion-vector hint from the coarser pyramid level, [`estimate_flow`]
//! produces, for every pixel, the best integer displacement within a
//! hint-centered search window, its aggregated matching cost, and an
//! optional sub-pixel refinement. Pyramid construction, hint upsampling,
//! image decoding, and the outer multi-level driver are a host's job, not
//! this crate's.

pub mod census;
pub mod cost_volume;
pub mod error;
pub mod hint;
pub mod image;
pub mod refine;
pub mod rounding;
pub mod sgm;

pub use error::FlowError;
pub use hint::HintField;

use v_frame::plane::Plane;

use cost_volume::build_cost_volume;
use sgm::SgmParams;

/// Every knob the estimator takes beyond the two images and the hint.
#[derive(Debug, Clone, Copy)]
pub struct FlowParams {
    /// Search half-window along x.
    pub rx: i32,
    /// Search half-window along y.
    pub ry: i32,
    /// Aggregation half-window for the census-Hamming cost.
    pub ra: i32,
    /// Small smoothness penalty.
    pub p1: u16,
    /// Large smoothness penalty, must exceed `p1`.
    pub p2: u16,
    /// Enables the two diagonal SGM directions (8-path vs 4-path).
    pub enable_diagonal: bool,
    /// Number of raster passes, 1 or 2.
    pub total_pass: u8,
    /// Reduces `p2` across sharp intensity edges.
    pub adaptive_p2: bool,
    /// Enables the parabolic sub-pixel fit.
    pub sub_pixel_refine: bool,
}

impl FlowParams {
    fn sgm_params(&self) -> SgmParams {
        SgmParams {
            p1: self.p1,
            p2: self.p2,
            enable_diagonal: self.enable_diagonal,
            total_pass: self.total_pass,
            adaptive_p2: self.adaptive_p2,
        }
    }
}

/// Everything the estimator produces for one pyramid level.
#[derive(Debug, Clone)]
pub struct FlowResult {
    /// Per-pixel winning label, `d = (ox+rx)*(2*ry+1) + (oy+ry)`.
    pub best_d: Vec<u32>,
    /// Per-pixel score at `best_d`.
    pub min_c: Vec<u32>,
    /// Sub-pixel offset along x, zero unless refinement is enabled and the
    /// label is strictly interior on that axis.
    pub mv_sub_x: Vec<f64>,
    /// Sub-pixel offset along y, same caveats as `mv_sub_x`.
    pub mv_sub_y: Vec<f64>,
    pub width: usize,
    pub height: usize,
    /// Label-axis extents, `wx = 2*rx+1`, `wy = 2*ry+1`.
    pub wx: usize,
    pub wy: usize,
}

/// Runs the full census -> cost-volume -> SGM -> refine pipeline for one
/// pyramid level.
///
/// `image1` and `image2` must share a shape, and `hint` must cover that
/// shape. Both are caller preconditions reported as [`FlowError`] rather
/// than panics.
pub fn estimate_flow(
    image1: &Plane<u8>,
    image2: &Plane<u8>,
    hint: &HintField,
    params: &FlowParams,
) -> Result<FlowResult, FlowError> {
    let w1 = image1.cfg.width;
    let h1 = image1.cfg.height;
    let w2 = image2.cfg.width;
    let h2 = image2.cfg.height;

    if w1 != w2 || h1 != h2 {
        return Err(FlowError::ImageShapeMismatch {
            w1,
            h1,
            w2,
            h2,
        });
    }
    if w1 == 0 || h1 == 0 {
        return Err(FlowError::EmptyImage { w: w1, h: h1 });
    }
    if params.rx < 0 || params.ry < 0 {
        return Err(FlowError::EmptySearchWindow {
            rx: params.rx,
            ry: params.ry,
        });
    }
    hint.check_covers(w1, h1)?;

    let sgm_params = params.sgm_params();
    sgm_params.validate()?;

    let wx = (2 * params.rx + 1) as usize;
    let wy = (2 * params.ry + 1) as usize;
    let d = wx * wy;
    log::debug!(
        "estimate_flow: {w1}x{h1}, search {wx}x{wy} (D={d}), ra={}, passes={}",
        params.ra,
        params.total_pass
    );

    let cen1 = census::census_transform(image1, census::CENSUS_RADIUS);
    let cen2 = census::census_transform(image2, census::CENSUS_RADIUS);

    let cost = build_cost_volume(
        &cen1,
        &cen2,
        w1,
        h1,
        hint,
        params.ra,
        params.rx,
        params.ry,
    );

    let score = sgm::aggregate(&cost, image1, hint, &sgm_params)?;

    let refined = refine::refine(&score, wx, wy, params.sub_pixel_refine);

    Ok(FlowResult {
        best_d: refined.best_d,
        min_c: refined.min_c,
        mv_sub_x: refined.mv_sub_x,
        mv_sub_y: refined.mv_sub_y,
        width: w1,
        height: h1,
        wx,
        wy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::plane_from_samples;

    fn default_params() -> FlowParams {
        FlowParams {
            rx: 2,
            ry: 2,
            ra: 0,
            p1: 2,
            p2: 8,
            enable_diagonal: false,
            total_pass: 2,
            adaptive_p2: false,
            sub_pixel_refine: false,
        }
    }

    fn ramp(width: usize, height: usize) -> Vec<u8> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (10 * (x + y)).min(255) as u8))
            .collect()
    }

    #[test]
    fn rejects_mismatched_image_shapes() {
        let samples1 = vec![0u8; 8 * 8];
        let samples2 = vec![0u8; 4 * 8];
        let plane1 = plane_from_samples(8, 8, &samples1);
        let plane2 = plane_from_samples(4, 8, &samples2);
        let hint = HintField::zero(8, 8);
        let result = estimate_flow(&plane1, &plane2, &hint, &default_params());
        assert_eq!(
            result.unwrap_err(),
            FlowError::ImageShapeMismatch {
                w1: 8,
                h1: 8,
                w2: 4,
                h2: 8
            }
        );
    }

    #[test]
    fn rejects_undersized_hint() {
        let samples = vec![0u8; 8 * 8];
        let plane = plane_from_samples(8, 8, &samples);
        let hint = HintField::zero(4, 4);
        let result = estimate_flow(&plane, &plane, &hint, &default_params());
        assert!(result.is_err());
    }

    #[test]
    fn pure_translation_zero_hint_recovers_shift() {
        // I1 a diagonal ramp, I2[y, x] = I1[y, x - 1] (border-clamped shift
        // right by one), zero hint: every interior pixel should settle on
        // offset (ox, oy) = (1, 0), i.e. label d = (1+2)*5 + (0+2) = 17.
        let width = 8;
        let height = 8;
        let i1 = ramp(width, height);
        let mut i2 = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let src_x = if x == 0 { 0 } else { x - 1 };
                i2[y * width + x] = i1[y * width + src_x];
            }
        }
        let plane1 = plane_from_samples(width, height, &i1);
        let plane2 = plane_from_samples(width, height, &i2);
        let hint = HintField::zero(width, height);
        let result = estimate_flow(&plane1, &plane2, &hint, &default_params()).unwrap();

        for y in 3..height - 3 {
            for x in 3..width - 3 {
                assert_eq!(result.best_d[y * width + x], 17, "at ({x},{y})");
            }
        }
    }

    #[test]
    fn hint_centered_translation_recovers_identity_offset() {
        // Same shift as above but by 3 pixels, with a matching constant
        // hint: the search window recenters on the true shift, so the
        // winning offset should be (0, 0), i.e. d = 2*5 + 2 = 12.
        let width = 16;
        let height = 16;
        let i1 = ramp(width, height);
        let mut i2 = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let src_x = if x < 3 { 0 } else { x - 3 };
                i2[y * width + x] = i1[y * width + src_x];
            }
        }
        let plane1 = plane_from_samples(width, height, &i1);
        let plane2 = plane_from_samples(width, height, &i2);
        let hint = HintField::constant(3.0, 0.0, width, height);
        let result = estimate_flow(&plane1, &plane2, &hint, &default_params()).unwrap();

        for y in 3..height - 3 {
            for x in 4..width - 3 {
                assert_eq!(result.best_d[y * width + x], 12, "at ({x},{y})");
            }
        }
    }

    #[test]
    fn identity_hint_law_holds_with_zero_penalties() {
        let width = 6;
        let height = 6;
        let samples: Vec<u8> = (0..width * height).map(|i| ((i * 29) % 251) as u8).collect();
        let plane = plane_from_samples(width, height, &samples);
        let hint = HintField::zero(width, height);
        let params = FlowParams {
            rx: 1,
            ry: 1,
            p1: 0,
            p2: 1,
            ..default_params()
        };
        let result = estimate_flow(&plane, &plane, &hint, &params).unwrap();
        let zero_label = (1 * 3 + 1) as u32; // (ox+1)*wy + (oy+1) with rx=ry=1
        for &d in &result.best_d {
            assert_eq!(d, zero_label);
        }
    }

    #[test]
    fn deterministic_across_runs() {
        let width = 10;
        let height = 9;
        let samples: Vec<u8> = (0..width * height).map(|i| ((i * 17) % 251) as u8).collect();
        let plane1 = plane_from_samples(width, height, &samples);
        let shifted: Vec<u8> = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| samples[y * width + x.saturating_sub(1)])
            })
            .collect();
        let plane2 = plane_from_samples(width, height, &shifted);
        let hint = HintField::zero(width, height);
        let params = FlowParams {
            enable_diagonal: true,
            adaptive_p2: true,
            sub_pixel_refine: true,
            ..default_params()
        };
        let a = estimate_flow(&plane1, &plane2, &hint, &params).unwrap();
        let b = estimate_flow(&plane1, &plane2, &hint, &params).unwrap();
        assert_eq!(a.best_d, b.best_d);
        assert_eq!(a.min_c, b.min_c);
        assert_eq!(a.mv_sub_x, b.mv_sub_x);
        assert_eq!(a.mv_sub_y, b.mv_sub_y);
    }
}
