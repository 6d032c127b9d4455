//! # Detection algorithm interface

use crate::prelude::v1::*;

/// Configuration recognized by the detection algorithms.
///
/// The strategy itself is fixed for the lifetime of a stream; it is selected by name when
/// the algorithm instance is created.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Stop decimating once the next level would fall below this height.
    pub min_processing_height: usize,
    /// Hard cap on the number of decimation levels.
    pub max_levels: usize,
    /// Threshold applied to frame differences when building the binary mask.
    pub diff_thresh: u8,
    /// Foreground runs shorter than this are discarded as noise (processing pixels).
    pub min_strip_height: i32,
    /// Minimum vertical separation between two valid runs in a column (processing pixels).
    pub min_strip_gap: i32,
    /// Minimum number of linked strips for a candidate to be accepted.
    pub min_strips: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_processing_height: 108,
            max_levels: 6,
            diff_thresh: 19,
            min_strip_height: 2,
            min_strip_gap: 3,
            min_strips: 12,
        }
    }
}

/// Axis-aligned bounding extent in source-image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: Pos,
    pub max: Pos,
}

impl Bounds {
    /// Degenerate extent around a single point.
    pub fn point(p: Pos) -> Self {
        Self { min: p, max: p }
    }

    /// Grow the extent to contain `p`.
    pub fn include(&mut self, p: Pos) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn contains(&self, p: Pos) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }
}

/// Detailed information about a detected object.
#[derive(Clone, Debug, Default)]
pub struct ObjectDetails {
    /// Bounding extent of the object.
    pub bounds: Option<Bounds>,
    /// Centers of the strips that make up the object.
    pub points: Vec<Pos>,
}

impl ObjectDetails {
    pub fn clear(&mut self) {
        self.bounds = None;
        self.points.clear();
    }
}

/// Fast-moving object detection algorithm.
///
/// One instance owns all mutable pipeline state for one stream and is not meant to be shared
/// between streams; callers processing several streams concurrently instantiate one
/// algorithm per stream. Dropping the instance releases all buffers.
pub trait Algorithm {
    /// Process a single frame in the stream.
    ///
    /// The input is received by swapping the contents of the provided image with an internal
    /// buffer; no pixel data is copied. The whole detection pipeline runs during the call.
    /// The frame must match the format and dimensions the algorithm was created with,
    /// otherwise the call fails and the frame is not processed.
    fn set_input_swap(&mut self, input: &mut Image) -> Result<()>;

    /// Whether an object was found as a result of analyzing the last frame.
    ///
    /// Always `false` until enough frames of history have accumulated.
    fn have_object(&self) -> bool;

    /// Bounding extent of the detected object, if any.
    fn object_bounds(&self) -> Option<Bounds>;

    /// Fill `out` with detailed information about the detected object.
    ///
    /// The output is cleared when no object was found. Reuses the capacity of `out`.
    fn object_details(&self, out: &mut ObjectDetails);

    /// Render a debug visualization of the last frame's detection state.
    ///
    /// The returned image has BGR format and the same dimensions as the input.
    fn debug_image(&mut self) -> Result<&Image>;
}
