//! # Vertical strip detection
//!
//! A strip is a maximal vertical run of foreground pixels, one pixel wide at the processing
//! resolution and reported in source-image coordinates. Strips are the atoms that the
//! detector crates link into components and trajectories.

use crate::prelude::v1::*;
use bytemuck::{Pod, Zeroable};

/// Strip center and half-dimensions, in source-image pixels.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Strip {
    pub x: i32,
    pub y: i32,
    pub half_width: i32,
    pub half_height: i32,
}

impl Strip {
    pub fn new(x: i32, y: i32, half_width: i32, half_height: i32) -> Self {
        Self {
            x,
            y,
            half_width,
            half_height,
        }
    }

    /// Strip center position.
    pub fn center(&self) -> Pos {
        Pos::new(self.x, self.y)
    }

    /// Find out whether two strips would overlap if they were in the same column.
    ///
    /// This is the contact predicate used when linking strips into components: a cheap,
    /// position-only test, symmetric in its arguments.
    pub fn overlap_y(l: &Strip, r: &Strip) -> bool {
        (l.y - r.y).abs() < l.half_height + r.half_height
    }
}

/// Detects vertical strips by iterating over all pixels in a binary image.
///
/// Scratch storage is cached inside the generator so that repeated invocations do not
/// allocate once warmed up.
#[derive(Default)]
pub struct StripGen {
    runs: Vec<(i32, i32)>,
    noise: usize,
}

impl StripGen {
    /// Detect vertical strips in the binary image `img`, appending them to `out` sorted by
    /// x coordinate.
    ///
    /// Runs shorter than `min_height` are discarded as noise. The vertical gap between two
    /// valid runs in a column must be at least `min_gap`, otherwise both runs are discarded:
    /// a sub-gap separation violates the assumption that the runs belong to distinct
    /// objects. The parameter `step` is the ratio of processing-resolution pixel size to
    /// source-resolution pixel size and must be even for exact strip geometry.
    pub fn strips(
        &mut self,
        img: &Image,
        min_height: i32,
        min_gap: i32,
        step: i32,
        out: &mut Vec<Strip>,
    ) -> Result<()> {
        if img.format() != Format::Gray {
            bail!("strips: expected a binary grayscale image");
        }
        if step <= 0 || step % 2 != 0 {
            bail!("strips: step must be positive and even, got {}", step);
        }

        let dims = img.dims();
        let data = img.data();
        let half_width = step / 2;
        self.noise = 0;

        for x in 0..dims.width {
            self.runs.clear();

            // run-length encode the column, dropping noise runs
            let mut start = None;
            for y in 0..=dims.height {
                let fg = y < dims.height && data[y * dims.width + x] != 0;
                match (start, fg) {
                    (None, true) => start = Some(y as i32),
                    (Some(s), false) => {
                        let end = y as i32;
                        if end - s < min_height {
                            self.noise += 1;
                        } else {
                            self.runs.push((s, end));
                        }
                        start = None;
                    }
                    _ => {}
                }
            }

            // a valid run survives only when sufficiently separated from its neighbours
            for i in 0..self.runs.len() {
                let (s, e) = self.runs[i];
                let gap_above = i > 0 && s - self.runs[i - 1].1 < min_gap;
                let gap_below =
                    i + 1 < self.runs.len() && self.runs[i + 1].0 - e < min_gap;
                if gap_above || gap_below {
                    continue;
                }

                out.push(Strip::new(
                    x as i32 * step + half_width,
                    (s + e) * half_width,
                    half_width,
                    (e - s) * half_width,
                ));
            }
        }

        Ok(())
    }

    /// The number of runs discarded due to `min_height` in the last invocation.
    pub fn last_noise(&self) -> usize {
        self.noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(dims: Dims, fg: &[(usize, usize)]) -> Image {
        let mut data = vec![0u8; dims.width * dims.height];
        for &(x, y) in fg {
            data[y * dims.width + x] = 0xFF;
        }
        let mut img = Image::default();
        img.assign(Format::Gray, dims, &data).unwrap();
        img
    }

    #[test]
    fn deterministic_and_sorted() {
        let img = mask(
            Dims::new(4, 6),
            &[(1, 1), (1, 2), (1, 3), (3, 0), (3, 1), (0, 4), (0, 5)],
        );

        let mut a = vec![];
        let mut b = vec![];
        let mut gen = StripGen::default();
        gen.strips(&img, 2, 2, 2, &mut a).unwrap();
        gen.strips(&img, 2, 2, 2, &mut b).unwrap();

        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0].x <= w[1].x));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn strip_geometry_in_source_coordinates() {
        // single run: column 1, rows 2..5, with step 4
        let img = mask(Dims::new(2, 6), &[(1, 2), (1, 3), (1, 4)]);

        let mut out = vec![];
        StripGen::default().strips(&img, 2, 2, 4, &mut out).unwrap();

        assert_eq!(out, vec![Strip::new(6, 14, 2, 6)]);
    }

    #[test]
    fn short_runs_count_as_noise() {
        let img = mask(Dims::new(3, 5), &[(0, 1), (2, 0), (2, 1), (2, 3)]);

        let mut out = vec![];
        let mut gen = StripGen::default();
        gen.strips(&img, 2, 2, 2, &mut out).unwrap();

        // (0,1) and (2,3) are isolated single-pixel runs
        assert_eq!(gen.last_noise(), 2);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn sub_gap_runs_are_both_discarded() {
        // two valid runs in column 0 separated by a single background pixel
        let img = mask(
            Dims::new(1, 8),
            &[(0, 0), (0, 1), (0, 2), (0, 4), (0, 5), (0, 6)],
        );

        let mut out = vec![];
        let mut gen = StripGen::default();
        gen.strips(&img, 2, 2, 2, &mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(gen.last_noise(), 0);
    }

    #[test]
    fn wide_gap_keeps_both_runs() {
        let img = mask(
            Dims::new(1, 8),
            &[(0, 0), (0, 1), (0, 2), (0, 5), (0, 6), (0, 7)],
        );

        let mut out = vec![];
        StripGen::default().strips(&img, 2, 2, 2, &mut out).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn odd_step_is_rejected() {
        let img = mask(Dims::new(1, 1), &[]);
        let mut out = vec![];
        assert!(StripGen::default().strips(&img, 2, 2, 3, &mut out).is_err());
    }

    #[test]
    fn contact_is_symmetric() {
        let a = Strip::new(0, 10, 2, 6);
        let b = Strip::new(4, 20, 2, 5);
        let c = Strip::new(8, 40, 2, 4);

        assert_eq!(Strip::overlap_y(&a, &b), Strip::overlap_y(&b, &a));
        assert_eq!(Strip::overlap_y(&a, &c), Strip::overlap_y(&c, &a));
        assert!(Strip::overlap_y(&a, &b));
        assert!(!Strip::overlap_y(&a, &c));
    }
}
