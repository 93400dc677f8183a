//! Per-direction path-cost recurrence and the ping-pong scratch buffers
//! that carry it across a scanline.

/// A single direction's running path cost. 16 bits are sufficient given
/// the per-step normalization (`L[d] = (C[d] + best) - LpreMin`) that
/// keeps magnitudes bounded regardless of path length.
pub type PathCost = u16;

/// Radius, in label-space, within which a neighboring label pays the
/// small penalty `P1` instead of the large penalty `P2`.
const SMOOTH_RADIUS: i32 = 2;

/// Reduces `P2` when the path step crosses a sharp intensity edge.
#[inline]
pub fn adaptive_p2(p2: u16, pix_cur: u8, pix_pre: u8) -> u16 {
    const THRESHOLD: i32 = 50;
    if (pix_cur as i32 - pix_pre as i32).abs() > THRESHOLD {
        let reduced = p2 / 8;
        if reduced == 0 {
            log::warn!("adaptive P2 collapsed P2={p2} to 0 across an intensity edge");
        }
        reduced
    } else {
        p2
    }
}

/// Runs one step of the SGM path recurrence: given the previous pixel's
/// path costs `l_pre` (length `wx*wy + 1`, slot `wx*wy` holding its
/// minimum), the current pixel's matching costs `cost` (length `wx*wy`),
/// and the hint differential `(dx, dy)` between the current and previous
/// pixel, fills `l_cur` (same shape as `l_pre`) with the normalized path
/// cost for every label and its trailing minimum.
pub fn sgm_step(
    l_cur: &mut [PathCost],
    l_pre: &[PathCost],
    cost: &[u8],
    dx: f64,
    dy: f64,
    wx: usize,
    wy: usize,
    p1: u16,
    p2: u16,
) {
    let d_max = wx * wy;
    debug_assert_eq!(l_cur.len(), d_max + 1);
    debug_assert_eq!(l_pre.len(), d_max + 1);
    debug_assert_eq!(cost.len(), d_max);

    let lpre_min = l_pre[d_max];
    let ceiling = lpre_min.saturating_add(p2);
    let mut running_min = PathCost::MAX;

    for sx in 0..wx {
        for sy in 0..wy {
            let d = sx * wy + sy;
            let xpre = crate::rounding::round_half_away_from_zero(sx as f64 + dx);
            let ypre = crate::rounding::round_half_away_from_zero(sy as f64 + dy);

            let min1 = if in_window(xpre, wx) && in_window(ypre, wy) {
                l_pre[xpre as usize * wy + ypre as usize]
            } else {
                ceiling
            };

            let mut min2 = ceiling;
            for k in -SMOOTH_RADIUS..=SMOOTH_RADIUS {
                for m in -SMOOTH_RADIUS..=SMOOTH_RADIUS {
                    if k == 0 && m == 0 {
                        continue;
                    }
                    let ty = ypre + k as i64;
                    let tx = xpre + m as i64;
                    if in_window(tx, wx) && in_window(ty, wy) {
                        let v = l_pre[tx as usize * wy + ty as usize].saturating_add(p1);
                        min2 = min2.min(v);
                    }
                }
            }

            // Never improves on the P2 ceiling; kept as a literal
            // computation rather than algebraically eliminated.
            let min3 = ceiling;

            let best = min1.min(min2).min(min3);
            let c = cost[d] as u16;
            let l = c.saturating_add(best).saturating_sub(lpre_min);
            l_cur[d] = l;
            running_min = running_min.min(l);
        }
    }

    l_cur[d_max] = running_min;
}

#[inline]
fn in_window(v: i64, extent: usize) -> bool {
    v >= 0 && (v as usize) < extent
}

/// Seeds a direction's leading-edge path cost directly from the local
/// matching cost, with a zero running minimum.
pub fn seed(l_cur: &mut [PathCost], cost: &[u8]) {
    let d_max = cost.len();
    debug_assert_eq!(l_cur.len(), d_max + 1);
    for (slot, &c) in l_cur.iter_mut().zip(cost.iter()) {
        *slot = c as u16;
    }
    l_cur[d_max] = 0;
}
