//! Argmin selection and the optional parabolic sub-pixel fit.

use crate::sgm::ScoreVolume;

/// Per-pixel argmin outputs: the winning label, its score, and (if
/// requested) the fractional offset fitted along each label axis.
pub struct Refined {
    pub best_d: Vec<u32>,
    pub min_c: Vec<u32>,
    pub mv_sub_x: Vec<f64>,
    pub mv_sub_y: Vec<f64>,
}

/// Selects `bestD`/`minC` from a score volume and, if `sub_pixel_refine`,
/// fits a 1-D parabola along each label axis around the winning label.
///
/// `wx`, `wy` are the label-axis extents (`d = sx * wy + sy`); ties in the
/// argmin are broken toward the lowest `d`.
pub fn refine(score: &ScoreVolume, wx: usize, wy: usize, sub_pixel_refine: bool) -> Refined {
    let width = score.width;
    let height = score.height;
    let n = width * height;

    let mut best_d = vec![0u32; n];
    let mut min_c = vec![0u32; n];
    let mut mv_sub_x = vec![0.0f64; n];
    let mut mv_sub_y = vec![0.0f64; n];

    for y in 0..height {
        for x in 0..width {
            let labels = score.labels(x, y);
            let (d, &c) = labels
                .iter()
                .enumerate()
                .min_by_key(|&(d, &c)| (c, d))
                .expect("label axis is never empty");
            let idx = y * width + x;
            best_d[idx] = d as u32;
            min_c[idx] = c;

            if sub_pixel_refine {
                let sx = d / wy;
                let sy = d % wy;
                mv_sub_x[idx] = fit_axis(labels, d, sx, wx, wy);
                mv_sub_y[idx] = fit_axis(labels, d, sy, wy, 1);
            }
        }
    }

    Refined {
        best_d,
        min_c,
        mv_sub_x,
        mv_sub_y,
    }
}

/// Fits the parabola along one axis, given the winning label's position
/// `pos` on that axis (extent `extent`) and the `stride` separating
/// neighboring labels along it. Returns 0 on the axis boundary or when the
/// formula degenerates (`denom == 0`).
fn fit_axis(labels: &[u32], d: usize, pos: usize, extent: usize, stride: usize) -> f64 {
    if pos == 0 || pos + 1 >= extent {
        return 0.0;
    }
    let c0 = labels[d] as i64;
    let c_l = labels[d - stride] as i64;
    let c_r = labels[d + stride] as i64;

    let denom = if c_r < c_l { c0 - c_l } else { c0 - c_r };
    if denom == 0 {
        return 0.0;
    }
    (c_r - c_l) as f64 / denom as f64 / 2.0
}
