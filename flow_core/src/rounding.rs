//! Shared rounding policy for hint-warped coordinates: round half away
//! from zero, used everywhere a warped coordinate becomes an index.

/// Rounds `v` to the nearest integer, with ties (`*.5`) rounding away from
/// zero so that `round(0.5) == 1` and `round(-0.5) == -1`.
#[inline]
pub fn round_half_away_from_zero(v: f64) -> i64 {
    if v >= 0.0 {
        (v + 0.5).floor() as i64
    } else {
        -((-v + 0.5).floor() as i64)
    }
}
