//! Error taxonomy for the flow core.
//!
//! The core is a pure numeric kernel: it either produces fully-populated
//! outputs or reports a precondition violation. There is no recoverable
//! error path, so every public entry point returns a plain `Result` built
//! around this single enum rather than a trait object.

use thiserror::Error;

/// Everything that can stop [`crate::estimate_flow`] before it produces a
/// result.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum FlowError {
    /// The two input images do not share a shape.
    #[error("image shape mismatch: I1 is {w1}x{h1}, I2 is {w2}x{h2}")]
    ImageShapeMismatch {
        w1: usize,
        h1: usize,
        w2: usize,
        h2: usize,
    },

    /// The hint field is smaller than the images it is meant to cover.
    #[error("hint field {wh}x{hh} is smaller than image {w}x{h}")]
    HintTooSmall {
        wh: usize,
        hh: usize,
        w: usize,
        h: usize,
    },

    /// `P1 >= P2`, which would make the large-displacement penalty no
    /// larger (or smaller) than the small-displacement one.
    #[error("SGM penalties must satisfy P1 < P2, got P1={p1}, P2={p2}")]
    InvalidPenalties { p1: u16, p2: u16 },

    /// `totalPass` outside `{1, 2}`.
    #[error("totalPass must be 1 or 2, got {total_pass}")]
    InvalidPassCount { total_pass: u8 },

    /// The search half-windows collapsed to an empty or absurd label
    /// axis (e.g. zero-sized `D`).
    #[error("search window produced an empty label axis: rx={rx}, ry={ry}")]
    EmptySearchWindow { rx: i32, ry: i32 },

    /// Either image has a zero dimension.
    #[error("image dimensions must be non-zero, got {w}x{h}")]
    EmptyImage { w: usize, h: usize },
}
