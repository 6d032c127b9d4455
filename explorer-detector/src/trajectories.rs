//! # Trajectory building and scoring
//!
//! Links components across the sorted-by-x sequence into trajectories using geometric
//! consistency rules, then scores each trajectory by the displacement it covers.

use crate::components::Component;
use crate::NONE;
use fmo::prelude::v1::*;
use nalgebra as na;

/// Chain of components approximating one object's path across the frame.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Trajectory {
    /// Index of the first component in the chain.
    pub first: u16,
    /// Index of the last component in the chain, filled in by analysis.
    pub last: u16,
    /// Maximum strip-to-strip width among the chained components.
    pub max_width: i32,
    /// Total number of linked strips.
    pub num_strips: usize,
    /// Scalar displacement; 0 means the trajectory was rejected.
    pub score: f32,
}

/// Link components into trajectories.
///
/// Components must be ordered by the x coordinate of their leftmost strip; the early loop
/// termination below is only correct under that ordering, so it is verified up front and
/// the frame fails instead of silently mislinking.
pub(crate) fn find_trajectories(
    strips: &[Strip],
    components: &mut [Component],
    out: &mut Vec<Trajectory>,
) -> Result<()> {
    out.clear();

    for w in components.windows(2) {
        if strips[w[0].first as usize].x > strips[w[1].first as usize].x {
            bail!("find_trajectories: components not sorted by leftmost strip");
        }
    }

    for i in 0..components.len() {
        if components[i].trajectory == NONE {
            // the component does not have a trajectory yet, root a new one at it
            components[i].trajectory = out.len() as u16;
            out.push(Trajectory {
                first: i as u16,
                last: i as u16,
                ..Default::default()
            });
        }

        let me = components[i];
        let my_last = strips[me.last as usize];
        let my_width = my_last.x - strips[me.first as usize].x;

        let traj = &mut out[me.trajectory as usize];
        traj.max_width = traj.max_width.max(my_width);
        let max_width = traj.max_width;

        components[i].next = NONE;
        for j in i + 1..components.len() {
            let cand = components[j];
            let cand_first = strips[cand.first as usize];

            // candidate must not be farther than the maximum component width so far;
            // sorted by x, so the scan may end here
            let dx = cand_first.x - my_last.x;
            if dx > max_width {
                break;
            }

            // candidate must not be part of another trajectory
            if cand.trajectory != NONE {
                continue;
            }

            // candidate must begin after this component has ended, and the link angle
            // must not exceed ~63 degrees
            let dy = (cand_first.y - my_last.y).abs();
            if dy > 2 * dx {
                continue;
            }

            // candidate must have a consistent approximate height
            if me.approx_half_height > 2 * cand.approx_half_height
                || cand.approx_half_height > 2 * me.approx_half_height
            {
                continue;
            }

            components[j].trajectory = me.trajectory;
            components[i].next = j as u16;
            break;
        }
    }

    Ok(())
}

/// Score trajectories by the displacement between their extreme strips.
///
/// A trajectory whose total linked strip count falls short of `min_strips` is rejected
/// with a score of 0; otherwise the score is the Euclidean distance from the first strip
/// of the first component to the last strip of the last one.
pub(crate) fn analyze_trajectories(
    strips: &[Strip],
    components: &[Component],
    trajectories: &mut Vec<Trajectory>,
    min_strips: usize,
) {
    for traj in trajectories.iter_mut() {
        let mut num_strips = 0;
        let mut last = traj.first as usize;
        loop {
            num_strips += components[last].num_strips as usize;
            if components[last].next == NONE {
                break;
            }
            last = components[last].next as usize;
        }
        traj.last = last as u16;
        traj.num_strips = num_strips;

        if num_strips < min_strips {
            traj.score = 0.0;
            continue;
        }

        let first = strips[components[traj.first as usize].first as usize];
        let last = strips[components[last].last as usize];
        let d = na::Vector2::new((last.x - first.x) as f32, (last.y - first.y) as f32);
        traj.score = d.norm();
    }
}

/// Visit every strip of a trajectory, component by component.
pub(crate) fn for_each_strip(
    strips: &[Strip],
    components: &[Component],
    next_strip: &[u16],
    traj: &Trajectory,
    mut f: impl FnMut(&Strip),
) {
    let mut comp = traj.first as usize;
    loop {
        let c = &components[comp];
        let mut s = c.first as usize;
        loop {
            f(&strips[s]);
            if s as u16 == c.last {
                break;
            }
            s = next_strip[s] as usize;
        }
        if c.next == NONE {
            break;
        }
        comp = c.next as usize;
    }
}

/// Bounding extent over all strips of a trajectory.
pub(crate) fn trajectory_bounds(
    strips: &[Strip],
    components: &[Component],
    next_strip: &[u16],
    traj: &Trajectory,
) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;

    for_each_strip(strips, components, next_strip, traj, |s| {
        let min = Pos::new(s.x - s.half_width, s.y - s.half_height);
        let max = Pos::new(s.x + s.half_width, s.y + s.half_height);
        match &mut bounds {
            Some(b) => {
                b.include(min);
                b.include(max);
            }
            None => bounds = Some(Bounds { min, max }),
        }
    });

    bounds
}
