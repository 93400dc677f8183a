//! Semi-Global Matching path aggregation: four (or eight, with diagonals)
//! directional dynamic-programming scans over the cost volume, summed into
//! a combined score tensor.

mod path;

pub use path::PathCost;

use v_frame::plane::Plane;

use crate::cost_volume::CostVolume;
use crate::error::FlowError;
use crate::hint::HintField;
use crate::image;
use path::{adaptive_p2, sgm_step};

/// Knobs controlling the aggregation pass. `p1 < p2` and
/// `total_pass in {1, 2}` are enforced by [`SgmParams::validate`].
#[derive(Debug, Clone, Copy)]
pub struct SgmParams {
    pub p1: u16,
    pub p2: u16,
    pub enable_diagonal: bool,
    pub total_pass: u8,
    pub adaptive_p2: bool,
}

impl SgmParams {
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.p1 >= self.p2 {
            return Err(FlowError::InvalidPenalties {
                p1: self.p1,
                p2: self.p2,
            });
        }
        if self.total_pass != 1 && self.total_pass != 2 {
            return Err(FlowError::InvalidPassCount {
                total_pass: self.total_pass,
            });
        }
        Ok(())
    }
}

/// The combined per-pixel, per-label score, `S[y, x, d]`, accumulated
/// across every enabled direction and pass.
#[derive(Debug, Clone)]
pub struct ScoreVolume {
    data: Vec<u32>,
    pub width: usize,
    pub height: usize,
    pub d: usize,
}

impl ScoreVolume {
    fn new(width: usize, height: usize, d: usize) -> Self {
        Self {
            data: vec![0u32; width * height * d],
            width,
            height,
            d,
        }
    }

    #[inline]
    pub fn labels(&self, x: usize, y: usize) -> &[u32] {
        let base = (y * self.width + x) * self.d;
        &self.data[base..base + self.d]
    }

    #[inline]
    fn labels_mut(&mut self, x: usize, y: usize) -> &mut [u32] {
        let base = (y * self.width + x) * self.d;
        &mut self.data[base..base + self.d]
    }
}

#[cfg(test)]
impl ScoreVolume {
    /// Builds a score volume directly from per-pixel label rows, for
    /// exercising the argmin/sub-pixel stage without a full aggregation.
    pub(crate) fn from_rows(width: usize, height: usize, d: usize, rows: &[Vec<u32>]) -> Self {
        assert_eq!(rows.len(), width * height);
        let mut data = Vec::with_capacity(width * height * d);
        for row in rows {
            assert_eq!(row.len(), d);
            data.extend_from_slice(row);
        }
        Self {
            data,
            width,
            height,
            d,
        }
    }
}

/// Two full-row ping-ponged path-cost buffers, used by the vertical and
/// diagonal directions (L2, L3, L4): the previous row is read while the
/// current row is written, then the roles flip at scanline end.
struct RowBuffers {
    rows: [Vec<PathCost>; 2],
    cur: usize,
}

impl RowBuffers {
    fn new(width: usize, slot: usize) -> Self {
        Self {
            rows: [vec![0; width * slot], vec![0; width * slot]],
            cur: 0,
        }
    }

    fn swap(&mut self) {
        self.cur ^= 1;
    }

    /// Splits into (mutable current row, shared previous row).
    fn split(&mut self) -> (&mut [PathCost], &[PathCost]) {
        if self.cur == 0 {
            let (a, b) = self.rows.split_at_mut(1);
            (&mut a[0], &b[0])
        } else {
            let (a, b) = self.rows.split_at_mut(1);
            (&mut b[0], &a[0])
        }
    }

    /// Indexes a single pixel's slot range out of a full row, mutably.
    fn slot_mut(row: &mut [PathCost], x: usize, slot: usize) -> &mut [PathCost] {
        &mut row[x * slot..(x + 1) * slot]
    }

    /// Indexes a single pixel's slot range out of a full row.
    fn slot_at(row: &[PathCost], x: usize, slot: usize) -> &[PathCost] {
        &row[x * slot..(x + 1) * slot]
    }
}

/// The single-row ping-pong pair used by the horizontal direction (L1):
/// just two slots, flipped after every pixel.
struct LineBuffers {
    slots: [Vec<PathCost>; 2],
    cur: usize,
}

impl LineBuffers {
    fn new(slot: usize) -> Self {
        Self {
            slots: [vec![0; slot], vec![0; slot]],
            cur: 0,
        }
    }

    fn swap(&mut self) {
        self.cur ^= 1;
    }

    fn split(&mut self) -> (&mut [PathCost], &[PathCost]) {
        if self.cur == 0 {
            let (a, b) = self.slots.split_at_mut(1);
            (&mut a[0], &b[0])
        } else {
            let (a, b) = self.slots.split_at_mut(1);
            (&mut b[0], &a[0])
        }
    }
}

/// Runs both raster passes of the SGM aggregator and returns the combined
/// score tensor.
///
/// The two passes are strictly sequential in raster order; only the
/// census transform, cost-volume builder, and argmin/sub-pixel stage are
/// parallelized elsewhere in the crate.
pub fn aggregate(
    cost: &CostVolume,
    image1: &Plane<u8>,
    hint: &HintField,
    params: &SgmParams,
) -> Result<ScoreVolume, FlowError> {
    params.validate()?;

    let width = cost.width;
    let height = cost.height;
    let wx = cost.wx;
    let wy = cost.wy;
    let d_max = wx * wy;
    let slot = d_max + 1;

    let mut score = ScoreVolume::new(width, height, d_max);
    let mut l1 = LineBuffers::new(slot);
    let mut l2 = RowBuffers::new(width, slot);
    let mut l3 = RowBuffers::new(width, slot);
    let mut l4 = RowBuffers::new(width, slot);

    for pass in 0..params.total_pass {
        log::trace!("sgm pass {pass} of {}", params.total_pass);
        let (ystart, yend, ystep): (i64, i64, i64) = if pass == 0 {
            (0, height as i64, 1)
        } else {
            (height as i64 - 1, -1, -1)
        };
        let (xstart, xend, xstep): (i64, i64, i64) = if pass == 0 {
            (0, width as i64, 1)
        } else {
            (width as i64 - 1, -1, -1)
        };

        let mut y = ystart;
        while y != yend {
            let yidx = y as usize;

            let mut x = xstart;
            while x != xend {
                let xidx = x as usize;
                let cost_here = cost.labels(xidx, yidx);
                let at_xstart = x == xstart;
                let at_ystart = y == ystart;
                let at_xend = x == xend - xstep;

                // L1: horizontal.
                if at_xstart {
                    let (l1_cur, _) = l1.split();
                    path::seed(l1_cur, cost_here);
                } else {
                    let xprev = (x - xstep) as usize;
                    let (dx, dy) = hint.diff((xidx, yidx), (xprev, yidx));
                    let pix_cur = image::sample(image1, xidx, yidx);
                    let pix_pre = image::sample(image1, xprev, yidx);
                    let p2 = if params.adaptive_p2 {
                        adaptive_p2(params.p2, pix_cur, pix_pre)
                    } else {
                        params.p2
                    };
                    let (l1_cur, l1_pre) = l1.split();
                    sgm_step(l1_cur, l1_pre, cost_here, dx, dy, wx, wy, params.p1, p2);
                }

                // L3: vertical.
                if at_ystart {
                    let (l3_cur_row, _) = l3.split();
                    let l3_cur = RowBuffers::slot_mut(l3_cur_row, xidx, slot);
                    path::seed(l3_cur, cost_here);
                } else {
                    let yprev = (y - ystep) as usize;
                    let (dx, dy) = hint.diff((xidx, yidx), (xidx, yprev));
                    let pix_cur = image::sample(image1, xidx, yidx);
                    let pix_pre = image::sample(image1, xidx, yprev);
                    let p2 = if params.adaptive_p2 {
                        adaptive_p2(params.p2, pix_cur, pix_pre)
                    } else {
                        params.p2
                    };
                    let (l3_cur_row, l3_pre_row) = l3.split();
                    let l3_cur = RowBuffers::slot_mut(l3_cur_row, xidx, slot);
                    let l3_pre = RowBuffers::slot_at(l3_pre_row, xidx, slot);
                    sgm_step(l3_cur, l3_pre, cost_here, dx, dy, wx, wy, params.p1, p2);
                }

                if params.enable_diagonal {
                    // L2: main diagonal, previous at (y - ystep, x - xstep).
                    if at_xstart || at_ystart {
                        let (l2_cur_row, _) = l2.split();
                        let l2_cur = RowBuffers::slot_mut(l2_cur_row, xidx, slot);
                        path::seed(l2_cur, cost_here);
                    } else {
                        let xprev = (x - xstep) as usize;
                        let yprev = (y - ystep) as usize;
                        let (dx, dy) = hint.diff((xidx, yidx), (xprev, yprev));
                        let pix_cur = image::sample(image1, xidx, yidx);
                        let pix_pre = image::sample(image1, xprev, yprev);
                        let p2 = if params.adaptive_p2 {
                            adaptive_p2(params.p2, pix_cur, pix_pre)
                        } else {
                            params.p2
                        };
                        let (l2_cur_row, l2_pre_row) = l2.split();
                        let l2_cur = RowBuffers::slot_mut(l2_cur_row, xidx, slot);
                        let l2_pre = RowBuffers::slot_at(l2_pre_row, xprev, slot);
                        sgm_step(l2_cur, l2_pre, cost_here, dx, dy, wx, wy, params.p1, p2);
                    }

                    // L4: anti-diagonal, previous at (y - ystep, x + xstep).
                    if at_ystart || at_xend {
                        let (l4_cur_row, _) = l4.split();
                        let l4_cur = RowBuffers::slot_mut(l4_cur_row, xidx, slot);
                        path::seed(l4_cur, cost_here);
                    } else {
                        let xnext = (x + xstep) as usize;
                        let yprev = (y - ystep) as usize;
                        let (dx, dy) = hint.diff((xidx, yidx), (xnext, yprev));
                        let pix_cur = image::sample(image1, xidx, yidx);
                        let pix_pre = image::sample(image1, xnext, yprev);
                        let p2 = if params.adaptive_p2 {
                            adaptive_p2(params.p2, pix_cur, pix_pre)
                        } else {
                            params.p2
                        };
                        let (l4_cur_row, l4_pre_row) = l4.split();
                        let l4_cur = RowBuffers::slot_mut(l4_cur_row, xidx, slot);
                        let l4_pre = RowBuffers::slot_at(l4_pre_row, xnext, slot);
                        sgm_step(l4_cur, l4_pre, cost_here, dx, dy, wx, wy, params.p1, p2);
                    }
                }

                // Accumulate this pixel's directional path costs into S.
                {
                    let (l1_cur, _) = l1.split();
                    let (l3_cur_row, _) = l3.split();
                    let l3_cur = RowBuffers::slot_at(l3_cur_row, xidx, slot);
                    let out = score.labels_mut(xidx, yidx);
                    for d in 0..d_max {
                        out[d] = out[d].wrapping_add(l1_cur[d] as u32).wrapping_add(l3_cur[d] as u32);
                    }
                    if params.enable_diagonal {
                        let (l2_cur_row, _) = l2.split();
                        let l2_cur = RowBuffers::slot_at(l2_cur_row, xidx, slot);
                        let (l4_cur_row, _) = l4.split();
                        let l4_cur = RowBuffers::slot_at(l4_cur_row, xidx, slot);
                        for d in 0..d_max {
                            out[d] = out[d].wrapping_add(l2_cur[d] as u32).wrapping_add(l4_cur[d] as u32);
                        }
                    }
                }

                l1.swap();
                x += xstep;
            }

            l2.swap();
            l3.swap();
            l4.swap();
            y += ystep;
        }
    }

    Ok(score)
}
