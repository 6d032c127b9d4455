//! # Explorer fast-moving object detector
//!
//! The double-difference variant of the detection pipeline. Each frame is decimated into a
//! pyramid whose lowest-resolution level is examined: two consecutive thresholded frame
//! differences are OR-ed into a binary mask, vertical strips are detected in the mask,
//! linked into connected components and finally into trajectories, and the highest-scoring
//! trajectory becomes the frame's detected object.
//!
//! One [`ExplorerV1`] instance owns all per-stream state; the pyramid rings rotate by
//! buffer swap so that the hot path does not allocate once warmed up.

mod components;
mod trajectories;
mod visualize;

use components::Component;
use fmo::prelude::v1::*;
use fmo::processing;
use trajectories::Trajectory;

/// Sentinel for "no link" in the index-based strip/component chains.
pub(crate) const NONE: u16 = u16::MAX;

/// Three generations of the source image, newest first.
#[derive(Default)]
struct SourceLevel {
    image1: Image,
    image2: Image,
    image3: Image,
}

/// Intermediate decimation step, retained only as input to the next level.
#[derive(Default)]
struct IgnoredLevel {
    image: Image,
}

/// The lowest-resolution level, where all detection happens.
#[derive(Default)]
struct ProcessedLevel {
    image1: Image,
    image2: Image,
    image3: Image,
    diff1: Image,
    diff2: Image,
    preprocessed: Image,
    /// Size of one processing pixel measured in source pixels.
    step: i32,
}

/// Double-difference fast-moving object detector.
pub struct ExplorerV1 {
    cfg: Config,
    format: Format,
    dims: Dims,
    frame_num: usize,
    decimator: Decimator,
    source: SourceLevel,
    ignored: Vec<IgnoredLevel>,
    level: ProcessedLevel,
    strip_gen: StripGen,
    strips: Vec<Strip>,
    next_strip: Vec<u16>,
    components: Vec<Component>,
    trajectories: Vec<Trajectory>,
    best: Option<usize>,
    object_bounds: Option<Bounds>,
    object_points: Vec<Pos>,
    vis_cache: Image,
    visualized: Image,
}

impl ExplorerV1 {
    /// Create a detector for a stream of images with fixed format and dimensions.
    ///
    /// Creates as many decimation levels as needed to bring the processing height down to
    /// the configured minimum, capped at the maximum level count.
    pub fn new(cfg: Config, format: Format, dims: Dims) -> Result<Self> {
        num_bytes(format, dims)?;
        if format == Format::Bgr {
            bail!("explorer-v1: processing requires a luminance plane, convert BGR to GRAY");
        }

        let mut level_dims = Decimator::next_dims(dims);
        let mut step = Decimator::next_pixel_size(1);
        let mut ignored = vec![];

        while Decimator::next_dims(level_dims).height >= cfg.min_processing_height
            && ignored.len() + 1 < cfg.max_levels
        {
            ignored.push(IgnoredLevel::default());
            level_dims = Decimator::next_dims(level_dims);
            step = Decimator::next_pixel_size(step);
        }

        log::debug!(
            "explorer-v1: processing at {}x{}, step {}",
            level_dims.width,
            level_dims.height,
            step
        );

        Ok(Self {
            cfg,
            format,
            dims,
            frame_num: 0,
            decimator: Decimator::default(),
            source: SourceLevel::default(),
            ignored,
            level: ProcessedLevel {
                step,
                ..Default::default()
            },
            strip_gen: StripGen::default(),
            strips: vec![],
            next_strip: vec![],
            components: vec![],
            trajectories: vec![],
            best: None,
            object_bounds: None,
            object_points: vec![],
            vis_cache: Image::default(),
            visualized: Image::default(),
        })
    }

    /// Rotate the level rings and refill every decimation level from the newest source.
    fn create_level_pyramid(&mut self, input: &mut Image) -> Result<()> {
        let src = &mut self.source;
        src.image2.swap(&mut src.image3);
        src.image1.swap(&mut src.image2);
        input.swap(&mut src.image1);

        for i in 0..self.ignored.len() {
            let (done, rest) = self.ignored.split_at_mut(i);
            let prev = match done.last() {
                Some(level) => &level.image,
                None => &self.source.image1,
            };
            self.decimator.decimate(prev, &mut rest[0].image)?;
        }

        let lvl = &mut self.level;
        lvl.image2.swap(&mut lvl.image3);
        lvl.image1.swap(&mut lvl.image2);

        let prev = match self.ignored.last() {
            Some(level) => &level.image,
            None => &self.source.image1,
        };
        self.decimator.decimate(prev, &mut self.level.image1)?;

        Ok(())
    }

    /// Build the binary mask out of the last three frames at the processing level.
    fn preprocess(&mut self) -> Result<()> {
        let lvl = &mut self.level;

        if self.frame_num >= 2 {
            lvl.diff1.swap(&mut lvl.diff2);
            processing::absdiff(
                &lvl.image1.gray_view()?,
                &lvl.image2.gray_view()?,
                &mut lvl.diff1,
            )?;
            processing::threshold_gt(&mut lvl.diff1, self.cfg.diff_thresh)?;
        }

        if self.frame_num >= 3 {
            processing::bitwise_or(&lvl.diff1, &lvl.diff2, &mut lvl.preprocessed)?;
        }

        Ok(())
    }

    fn detect(&mut self) -> Result<()> {
        self.best = None;
        self.object_bounds = None;
        self.object_points.clear();
        self.strips.clear();

        if self.frame_num < 3 {
            return Ok(());
        }

        self.strip_gen.strips(
            &self.level.preprocessed,
            self.cfg.min_strip_height,
            self.cfg.min_strip_gap,
            self.level.step,
            &mut self.strips,
        )?;
        log::debug!(
            "frame {}: {} strips, {} noise",
            self.frame_num,
            self.strips.len(),
            self.strip_gen.last_noise()
        );

        components::find_components(
            &self.strips,
            self.level.step,
            &mut self.next_strip,
            &mut self.components,
        );
        trajectories::find_trajectories(&self.strips, &mut self.components, &mut self.trajectories)?;
        trajectories::analyze_trajectories(
            &self.strips,
            &self.components,
            &mut self.trajectories,
            self.cfg.min_strips,
        );

        let mut best: Option<usize> = None;
        for (i, traj) in self.trajectories.iter().enumerate() {
            if traj.score > 0.0 && best.map_or(true, |b| traj.score > self.trajectories[b].score) {
                best = Some(i);
            }
        }
        self.best = best;

        if let Some(i) = best {
            let traj = self.trajectories[i];
            self.object_bounds = trajectories::trajectory_bounds(
                &self.strips,
                &self.components,
                &self.next_strip,
                &traj,
            );
            trajectories::for_each_strip(
                &self.strips,
                &self.components,
                &self.next_strip,
                &traj,
                |strip| self.object_points.push(strip.center()),
            );
        }

        Ok(())
    }
}

impl Algorithm for ExplorerV1 {
    fn set_input_swap(&mut self, input: &mut Image) -> Result<()> {
        if input.format() != self.format || input.dims() != self.dims {
            bail!(
                "set_input_swap: stream is fixed to {:?} {}x{}, got {:?} {}x{}",
                self.format,
                self.dims.width,
                self.dims.height,
                input.format(),
                input.dims().width,
                input.dims().height
            );
        }

        self.frame_num += 1;
        self.create_level_pyramid(input)?;
        self.preprocess()?;
        self.detect()
    }

    fn have_object(&self) -> bool {
        self.object_bounds.is_some()
    }

    fn object_bounds(&self) -> Option<Bounds> {
        self.object_bounds
    }

    fn object_details(&self, out: &mut ObjectDetails) {
        out.clear();
        out.bounds = self.object_bounds;
        out.points.extend_from_slice(&self.object_points);
    }

    fn debug_image(&mut self) -> Result<&Image> {
        visualize::visualize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn square_frame(dims: Dims, x: usize, y: usize) -> Image {
        let mut data = vec![0u8; dims.width * dims.height];
        for row in y..y + 20 {
            for col in x..x + 20 {
                data[row * dims.width + col] = 0xFF;
            }
        }
        let mut img = Image::default();
        img.assign(Format::Gray, dims, &data).unwrap();
        img
    }

    #[test]
    fn translating_square_score_is_the_displacement() {
        let dims = Dims::new(640, 360);
        let cfg = Config {
            min_processing_height: 90,
            min_strip_height: 2,
            min_strip_gap: 2,
            min_strips: 2,
            ..Default::default()
        };
        let mut ex = ExplorerV1::new(cfg, Format::Gray, dims).unwrap();

        for (x, y) in [(100, 100), (120, 108), (140, 116)] {
            let mut frame = square_frame(dims, x, y);
            ex.set_input_swap(&mut frame).unwrap();
        }

        // strip centers run from (102, 110) to (158, 126)
        let best = ex.best.unwrap();
        let expected = ((56 * 56 + 16 * 16) as f32).sqrt();
        assert_approx_eq!(ex.trajectories[best].score, expected, 1e-3);
    }

    #[test]
    fn rejects_packed_color_streams() {
        assert!(ExplorerV1::new(Config::default(), Format::Bgr, Dims::new(64, 64)).is_err());
    }

    #[test]
    fn rejects_frame_mismatch_mid_stream() {
        let mut ex =
            ExplorerV1::new(Config::default(), Format::Gray, Dims::new(64, 64)).unwrap();

        let mut frame = Image::new(Format::Gray, Dims::new(64, 32)).unwrap();
        assert!(ex.set_input_swap(&mut frame).is_err());

        let mut frame = Image::new(Format::Gray, Dims::new(64, 64)).unwrap();
        assert!(ex.set_input_swap(&mut frame).is_ok());
    }

    #[test]
    fn pyramid_depth_follows_config() {
        let cfg = Config {
            min_processing_height: 90,
            ..Default::default()
        };
        let ex = ExplorerV1::new(cfg, Format::Gray, Dims::new(640, 360)).unwrap();
        // 360 -> 180 (ignored) -> 90 (processed)
        assert_eq!(ex.ignored.len(), 1);
        assert_eq!(ex.level.step, 4);

        let cfg = Config {
            min_processing_height: 90,
            max_levels: 1,
            ..Default::default()
        };
        let ex = ExplorerV1::new(cfg, Format::Gray, Dims::new(640, 360)).unwrap();
        assert_eq!(ex.ignored.len(), 0);
        assert_eq!(ex.level.step, 2);
    }
}
