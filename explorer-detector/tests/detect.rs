//! End-to-end detection of a synthetic translating square.

use explorer_detector::ExplorerV1;
use fmo::prelude::v1::*;

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

fn detector() -> ExplorerV1 {
    let cfg = Config {
        min_processing_height: 90, // 640x360 -> 160x90, step 4
        min_strip_height: 2,
        min_strip_gap: 2,
        min_strips: 2,
        ..Default::default()
    };
    ExplorerV1::new(cfg, Format::Gray, DIMS).unwrap()
}

#[test]
fn translating_square_is_detected() {
    let mut ex = detector();

    // the square translates by (20, 8) pixels per frame
    for (i, (x, y)) in [(100, 100), (120, 108), (140, 116)].iter().enumerate() {
        let mut frame = square_frame(*x, *y);
        ex.set_input_swap(&mut frame).unwrap();

        if i < 2 {
            // warm-up: no detection regardless of content
            assert!(!ex.have_object(), "object reported during warm-up");
        }
    }

    assert!(ex.have_object());

    // the double-diff mask covers all three square positions; the object bounds span
    // them and track the square's final position
    let bounds = ex.object_bounds().unwrap();
    assert_eq!(bounds.min, Pos::new(100, 100));
    assert_eq!(bounds.max, Pos::new(160, 136));
    assert!(bounds.contains(Pos::new(159, 135)));

    let mut details = ObjectDetails::default();
    ex.object_details(&mut details);
    assert_eq!(details.bounds, Some(bounds));

    // one strip per mask column, sorted by x
    assert_eq!(details.points.len(), 15);
    assert_eq!(details.points[0], Pos::new(102, 110));
    assert_eq!(details.points[14], Pos::new(158, 126));
    assert!(details.points.windows(2).all(|w| w[0].x < w[1].x));
}

#[test]
fn static_scene_yields_nothing() {
    let mut ex = detector();

    for _ in 0..5 {
        let mut frame = square_frame(100, 100);
        ex.set_input_swap(&mut frame).unwrap();
        assert!(!ex.have_object());
    }

    let mut details = ObjectDetails::default();
    ex.object_details(&mut details);
    assert!(details.bounds.is_none());
    assert!(details.points.is_empty());
}

#[test]
fn debug_image_matches_source_geometry() {
    let mut ex = detector();
    for (x, y) in [(100, 100), (120, 108), (140, 116)] {
        let mut frame = square_frame(x, y);
        ex.set_input_swap(&mut frame).unwrap();
    }

    let bounds = ex.object_bounds().unwrap();
    let debug = ex.debug_image().unwrap();
    assert_eq!(debug.format(), Format::Bgr);
    assert_eq!(debug.dims(), DIMS);

    // the winning object's bounds are outlined in red
    let i = (bounds.min.y as usize * DIMS.width + bounds.min.x as usize) * 3;
    assert_eq!(&debug.data()[i..i + 3], &[0x00, 0x00, 0xFF]);
}

#[test]
fn strip_count_gates_detection() {
    let positions = [(100, 100), (120, 108), (140, 116)];

    // the mask yields 15 strips; one more than that as the minimum rejects the object
    let cfg = Config {
        min_processing_height: 90,
        min_strip_height: 2,
        min_strip_gap: 2,
        min_strips: 16,
        ..Default::default()
    };
    let mut ex = ExplorerV1::new(cfg, Format::Gray, DIMS).unwrap();
    for (x, y) in positions {
        let mut frame = square_frame(x, y);
        ex.set_input_swap(&mut frame).unwrap();
    }
    assert!(!ex.have_object());

    let cfg = Config {
        min_strips: 15,
        ..cfg
    };
    let mut ex = ExplorerV1::new(cfg, Format::Gray, DIMS).unwrap();
    for (x, y) in positions {
        let mut frame = square_frame(x, y);
        ex.set_input_swap(&mut frame).unwrap();
    }
    assert!(ex.have_object());
}
