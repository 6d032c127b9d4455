//! # Median-background fast-moving object detector
//!
//! The alternate strategy of the detection pipeline: the background is estimated as the
//! per-pixel median of the last three decimated frames, the binary mask is the thresholded
//! difference between the newest frame and that background, and candidates are built as
//! strip clusters with explicit validity verdicts. The widest-spanning valid cluster is the
//! frame's detected object.

pub mod clusters;

use clusters::Cluster;
use fmo::prelude::v1::*;
use fmo::{image, processing};
use nalgebra as na;

/// Sentinel for "no link" in the index-based strip chains.
pub(crate) const NONE: u16 = u16::MAX;

/// Median-background fast-moving object detector.
pub struct MedianV1 {
    cfg: Config,
    format: Format,
    dims: Dims,
    frame_num: usize,
    decimator: Decimator,
    /// Latest source image, kept for visualization.
    source: Image,
    /// Cached intermediate decimation steps.
    decimated: Vec<Image>,
    /// Processing-level pixel size in source pixels.
    step: i32,
    /// Input images decimated to processing resolution, newest first.
    inputs: [Image; 3],
    /// Median of the last three inputs.
    background: Image,
    /// Binary difference image, newest input vs. background.
    bin_diff: Image,
    strip_gen: StripGen,
    strips: Vec<Strip>,
    next_strip: Vec<u16>,
    clusters: Vec<Cluster>,
    best: Option<usize>,
    object_bounds: Option<Bounds>,
    object_points: Vec<Pos>,
    vis_cache: Image,
    visualized: Image,
}

impl MedianV1 {
    /// Create a detector for a stream of images with fixed format and dimensions.
    pub fn new(cfg: Config, format: Format, dims: Dims) -> Result<Self> {
        num_bytes(format, dims)?;
        if format == Format::Bgr {
            bail!("median-v1: processing requires a luminance plane, convert BGR to GRAY");
        }

        let mut level_dims = Decimator::next_dims(dims);
        let mut step = Decimator::next_pixel_size(1);
        let mut decimated = vec![];

        while Decimator::next_dims(level_dims).height >= cfg.min_processing_height
            && decimated.len() + 1 < cfg.max_levels
        {
            decimated.push(Image::default());
            level_dims = Decimator::next_dims(level_dims);
            step = Decimator::next_pixel_size(step);
        }

        log::debug!(
            "median-v1: processing at {}x{}, step {}",
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
            source: Image::default(),
            decimated,
            step,
            inputs: Default::default(),
            background: Image::default(),
            bin_diff: Image::default(),
            strip_gen: StripGen::default(),
            strips: vec![],
            next_strip: vec![],
            clusters: vec![],
            best: None,
            object_bounds: None,
            object_points: vec![],
            vis_cache: Image::default(),
            visualized: Image::default(),
        })
    }

    /// Save the source image and decimate it down to the processing resolution.
    fn swap_and_decimate_input(&mut self, input: &mut Image) -> Result<()> {
        input.swap(&mut self.source);

        for i in 0..self.decimated.len() {
            let (done, rest) = self.decimated.split_at_mut(i);
            let prev = match done.last() {
                Some(image) => image,
                None => &self.source,
            };
            self.decimator.decimate(prev, &mut rest[0])?;
        }

        // rotate the three-generation ring, then refill the newest slot
        let [newest, mid, oldest] = &mut self.inputs;
        mid.swap(oldest);
        newest.swap(mid);

        let prev = match self.decimated.last() {
            Some(image) => image,
            None => &self.source,
        };
        self.decimator.decimate(prev, &mut self.inputs[0])
    }

    /// Estimate the background as the per-pixel median of the last three inputs and
    /// threshold the difference of the newest input against it.
    fn compute_bin_diff(&mut self) -> Result<()> {
        if self.frame_num < 3 {
            return Ok(());
        }

        let [newest, mid, oldest] = &self.inputs;
        processing::median3(
            &newest.gray_view()?,
            &mid.gray_view()?,
            &oldest.gray_view()?,
            &mut self.background,
        )?;
        processing::absdiff(
            &newest.gray_view()?,
            &self.background.view()?,
            &mut self.bin_diff,
        )?;
        processing::threshold_gt(&mut self.bin_diff, self.cfg.diff_thresh)
    }

    fn detect(&mut self) -> Result<()> {
        self.best = None;
        self.object_bounds = None;
        self.object_points.clear();
        self.strips.clear();

        // the median needs three frames of history before the mask means anything
        if self.frame_num <= 3 {
            return Ok(());
        }

        self.strip_gen.strips(
            &self.bin_diff,
            self.cfg.min_strip_height,
            self.cfg.min_strip_gap,
            self.step,
            &mut self.strips,
        )?;
        log::debug!(
            "frame {}: {} strips, {} noise",
            self.frame_num,
            self.strips.len(),
            self.strip_gen.last_noise()
        );

        clusters::find_clusters(
            &self.strips,
            self.step,
            self.cfg.min_strips,
            &mut self.next_strip,
            &mut self.clusters,
        );

        // the widest-spanning valid cluster wins
        let mut best: Option<(usize, f32)> = None;
        for (i, cluster) in self.clusters.iter().enumerate() {
            if !cluster.valid() {
                continue;
            }
            let first = self.strips[cluster.first as usize];
            let last = self.strips[cluster.last as usize];
            let d = na::Vector2::new((last.x - first.x) as f32, (last.y - first.y) as f32);
            let span = d.norm();
            if best.map_or(true, |(_, s)| span > s) {
                best = Some((i, span));
            }
        }

        if let Some((i, _)) = best {
            self.best = Some(i);
            let cluster = self.clusters[i];
            self.object_bounds =
                Some(clusters::cluster_bounds(&self.strips, &self.next_strip, &cluster));

            let mut s = cluster.first as usize;
            loop {
                self.object_points.push(self.strips[s].center());
                if s as u16 == cluster.last {
                    break;
                }
                s = self.next_strip[s] as usize;
            }
        }

        Ok(())
    }

    fn visualize(&mut self) -> Result<&Image> {
        const PALE: [u8; 3] = [0xFF, 0x88, 0x88];
        const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
        const RED: [u8; 3] = [0x00, 0x00, 0xFF];

        // cover the visualization with the binary mask once it exists
        let src = if self.frame_num >= 3 {
            &self.bin_diff
        } else {
            &self.inputs[0]
        };
        processing::scale_nearest(&src.gray_view()?, &mut self.vis_cache, self.dims)?;
        image::convert(&self.vis_cache, &mut self.visualized, Format::Bgr)?;

        for strip in &self.strips {
            processing::draw_rect(
                &mut self.visualized,
                Pos::new(strip.x - strip.half_width, strip.y - strip.half_height),
                Pos::new(strip.x + strip.half_width, strip.y + strip.half_height),
                PALE,
            );
        }

        // invalid clusters are kept around precisely for this view
        for (i, cluster) in self.clusters.iter().enumerate() {
            let b = clusters::cluster_bounds(&self.strips, &self.next_strip, cluster);
            let color = if Some(i) == self.best {
                RED
            } else if cluster.valid() {
                PALE
            } else {
                BLACK
            };
            processing::draw_rect(&mut self.visualized, b.min, b.max, color);
        }

        Ok(&self.visualized)
    }
}

impl Algorithm for MedianV1 {
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
        self.swap_and_decimate_input(input)?;
        self.compute_bin_diff()?;
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
        self.visualize()
    }
}
