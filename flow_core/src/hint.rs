//! The upscaled motion-vector hint from the previous pyramid level.

use crate::error::FlowError;

/// Two co-located planes of continuous displacement, `mvx` and `mvy`,
/// indexed with their own stride `width` (which may exceed the image's
/// width -- extra rows/columns are simply never read).
#[derive(Debug, Clone)]
pub struct HintField {
    mvx: Vec<f64>,
    mvy: Vec<f64>,
    width: usize,
    height: usize,
}

impl HintField {
    /// Builds a hint field from two flat, row-major planes of matching
    /// shape `width x height`.
    ///
    /// # Panics
    /// Panics if `mvx` or `mvy` does not have exactly `width * height`
    /// elements; this is a caller-assembly bug, not a runtime precondition
    /// covered by [`FlowError`].
    pub fn new(mvx: Vec<f64>, mvy: Vec<f64>, width: usize, height: usize) -> Self {
        assert_eq!(mvx.len(), width * height, "mvx plane size mismatch");
        assert_eq!(mvy.len(), width * height, "mvy plane size mismatch");
        Self {
            mvx,
            mvy,
            width,
            height,
        }
    }

    /// A hint field that is zero everywhere, useful for the coarsest
    /// pyramid level and for tests.
    pub fn zero(width: usize, height: usize) -> Self {
        Self::new(vec![0.0; width * height], vec![0.0; width * height], width, height)
    }

    /// A hint field with a constant displacement everywhere.
    pub fn constant(mvx: f64, mvy: f64, width: usize, height: usize) -> Self {
        Self::new(
            vec![mvx; width * height],
            vec![mvy; width * height],
            width,
            height,
        )
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Validates that this hint field is large enough to cover an image
    /// of shape `w x h`.
    pub fn check_covers(&self, w: usize, h: usize) -> Result<(), FlowError> {
        if self.width < w || self.height < h {
            return Err(FlowError::HintTooSmall {
                wh: self.width,
                hh: self.height,
                w,
                h,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> (f64, f64) {
        let idx = y * self.width + x;
        (self.mvx[idx], self.mvy[idx])
    }

    /// `hint[cur] - hint[prev]`, the warp used by the SGM recurrence to
    /// translate a previous pixel's path-cost labels into the current
    /// pixel's label space.
    #[inline]
    pub fn diff(&self, cur: (usize, usize), prev: (usize, usize)) -> (f64, f64) {
        let (cx, cy) = self.get(cur.0, cur.1);
        let (px, py) = self.get(prev.0, prev.1);
        (cx - px, cy - py)
    }
}
