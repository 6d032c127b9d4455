//! # Strip-to-component linking
//!
//! Joins strips into connected chains using the contact predicate: two strips are in
//! contact when they sit in adjacent columns and their vertical extents overlap. Chains are
//! stored as index links into the strip arena, with [`NONE`](crate::NONE) as terminator, so
//! that rebuilding them every frame stays allocation-free.

use crate::NONE;
use fmo::prelude::v1::*;

/// Chain of contact-linked strips.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Component {
    /// Index of the first strip in the chain.
    pub first: u16,
    /// Index of the last strip in the chain.
    pub last: u16,
    pub num_strips: u16,
    /// Half-height of the first strip, used for trajectory consistency checks.
    pub approx_half_height: i32,
    /// Owning trajectory, or `NONE` until assignment.
    pub trajectory: u16,
    /// Next component in the trajectory, or `NONE`.
    pub next: u16,
}

/// Build components from strips sorted by x coordinate.
///
/// Each strip extends the most recently opened component whose last strip sits in the
/// previous column and overlaps vertically; otherwise it opens a new component. Because
/// strips arrive sorted by x, components end up ordered by their leftmost strip.
pub(crate) fn find_components(
    strips: &[Strip],
    step: i32,
    next_strip: &mut Vec<u16>,
    out: &mut Vec<Component>,
) {
    out.clear();
    next_strip.clear();
    next_strip.resize(strips.len(), NONE);

    for (i, strip) in strips.iter().enumerate() {
        let joined = out.iter_mut().rev().any(|comp| {
            let last = &strips[comp.last as usize];
            if last.x + step == strip.x && Strip::overlap_y(last, strip) {
                next_strip[comp.last as usize] = i as u16;
                comp.last = i as u16;
                comp.num_strips += 1;
                true
            } else {
                false
            }
        });

        if !joined {
            out.push(Component {
                first: i as u16,
                last: i as u16,
                num_strips: 1,
                approx_half_height: strip.half_height,
                trajectory: NONE,
                next: NONE,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contacting_strips_form_one_component() {
        let strips = [
            Strip::new(2, 10, 2, 6),
            Strip::new(6, 14, 2, 6),
            Strip::new(10, 18, 2, 6),
        ];

        let mut next = vec![];
        let mut comps = vec![];
        find_components(&strips, 4, &mut next, &mut comps);

        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].first, 0);
        assert_eq!(comps[0].last, 2);
        assert_eq!(comps[0].num_strips, 3);
        assert_eq!(comps[0].approx_half_height, 6);
        assert_eq!(next, vec![1, 2, NONE]);
    }

    #[test]
    fn distant_strips_stay_separate() {
        // adjacent columns but no vertical overlap, then a column gap
        let strips = [
            Strip::new(2, 10, 2, 4),
            Strip::new(6, 30, 2, 4),
            Strip::new(14, 30, 2, 4),
        ];

        let mut next = vec![];
        let mut comps = vec![];
        find_components(&strips, 4, &mut next, &mut comps);

        assert_eq!(comps.len(), 3);
        assert!(next.iter().all(|&n| n == NONE));
    }

    #[test]
    fn same_column_strips_open_new_components() {
        let strips = [Strip::new(2, 10, 2, 4), Strip::new(2, 30, 2, 4)];

        let mut next = vec![];
        let mut comps = vec![];
        find_components(&strips, 4, &mut next, &mut comps);
        assert_eq!(comps.len(), 2);
    }
}
