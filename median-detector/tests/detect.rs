//! End-to-end detection of a synthetic translating square.

use fmo::prelude::v1::*;
use median_detector::MedianV1;

const DIMS: Dims = Dims {
    width: 640,
    height: 360,
};

/// A bright 20x20 square on black background, top-left corner at (x, y).
fn square_frame(x: usize, y: usize) -> Image {
    let mut data = vec![0u8; DIMS.width * DIMS.height];
    for row in y..y + 20 {
        for col in x..x + 20 {
            data[row * DIMS.width + col] = 0xFF;
        }
    }
    let mut img = Image::default();
    img.assign(Format::Gray, DIMS, &data).unwrap();
    img
}

fn detector() -> MedianV1 {
    let cfg = Config {
        min_processing_height: 90, // 640x360 -> 160x90, step 4
        min_strip_height: 2,
        min_strip_gap: 2,
        min_strips: 2,
        ..Default::default()
    };
    MedianV1::new(cfg, Format::Gray, DIMS).unwrap()
}

#[test]
fn translating_square_is_detected() {
    let mut md = detector();

    // the square translates by (20, 8) pixels per frame; successive positions are
    // disjoint, so the median background stays black and the mask is the newest square
    let positions = [(100, 100), (120, 108), (140, 116), (160, 124)];
    for (i, (x, y)) in positions.iter().enumerate() {
        let mut frame = square_frame(*x, *y);
        md.set_input_swap(&mut frame).unwrap();

        if i < 3 {
            // warm-up: the background estimate needs three frames of history
            assert!(!md.have_object(), "object reported during warm-up");
        }
    }

    assert!(md.have_object());

    let bounds = md.object_bounds().unwrap();
    assert_eq!(bounds.min, Pos::new(160, 124));
    assert_eq!(bounds.max, Pos::new(180, 144));

    let mut details = ObjectDetails::default();
    md.object_details(&mut details);
    assert_eq!(details.bounds, Some(bounds));

    // one strip per mask column, sorted by x
    assert_eq!(details.points.len(), 5);
    assert_eq!(details.points[0], Pos::new(162, 134));
    assert_eq!(details.points[4], Pos::new(178, 134));
    assert!(details.points.windows(2).all(|w| w[0].x < w[1].x));
}

#[test]
fn static_scene_yields_nothing() {
    let mut md = detector();

    for _ in 0..6 {
        let mut frame = square_frame(100, 100);
        md.set_input_swap(&mut frame).unwrap();
        assert!(!md.have_object());
    }

    let mut details = ObjectDetails::default();
    md.object_details(&mut details);
    assert!(details.bounds.is_none());
    assert!(details.points.is_empty());
}

#[test]
fn debug_image_matches_source_geometry() {
    let mut md = detector();
    for (x, y) in [(100, 100), (120, 108), (140, 116), (160, 124)] {
        let mut frame = square_frame(x, y);
        md.set_input_swap(&mut frame).unwrap();
    }

    let debug = md.debug_image().unwrap();
    assert_eq!(debug.format(), Format::Bgr);
    assert_eq!(debug.dims(), DIMS);
}
