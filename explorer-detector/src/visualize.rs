//! # Debug visualization
//!
//! Renders the detection state of the last frame on top of the decimated input: strips,
//! component chains, rejected candidates and the winning object.

use crate::{trajectories, ExplorerV1, NONE};
use fmo::prelude::v1::*;
use fmo::{image, processing};

const PALE: [u8; 3] = [0xFF, 0x88, 0x88];
const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
const RED: [u8; 3] = [0x00, 0x00, 0xFF];

pub(crate) fn visualize(ex: &mut ExplorerV1) -> Result<&Image> {
    // cover the visualization image with the highest-resolution decimated image
    let src = match ex.ignored.first() {
        Some(level) => &level.image,
        None => &ex.level.image1,
    };
    processing::scale_nearest(&src.gray_view()?, &mut ex.vis_cache, ex.dims)?;
    image::convert(&ex.vis_cache, &mut ex.visualized, Format::Bgr)?;

    for strip in &ex.strips {
        processing::draw_rect(
            &mut ex.visualized,
            Pos::new(strip.x - strip.half_width, strip.y - strip.half_height),
            Pos::new(strip.x + strip.half_width, strip.y + strip.half_height),
            PALE,
        );
    }

    // connect components in each trajectory with lines
    for traj in &ex.trajectories {
        let mut comp = &ex.components[traj.first as usize];
        while comp.next != NONE {
            let next = &ex.components[comp.next as usize];
            let s1 = ex.strips[comp.last as usize];
            let s2 = ex.strips[next.first as usize];
            processing::draw_line(&mut ex.visualized, s1.center(), s2.center(), PALE);
            comp = next;
        }
    }

    // rejected candidates in black, other chains pale, the winning object in red
    for (i, traj) in ex.trajectories.iter().enumerate() {
        if let Some(b) =
            trajectories::trajectory_bounds(&ex.strips, &ex.components, &ex.next_strip, traj)
        {
            let color = if Some(i) == ex.best {
                RED
            } else if traj.score != 0.0 {
                PALE
            } else {
                BLACK
            };
            processing::draw_rect(&mut ex.visualized, b.min, b.max, color);
        }
    }

    Ok(&ex.visualized)
}
