//! # Strip clusters
//!
//! The cluster strategy applies contact-chain construction directly over strips, without
//! the component indirection. Every cluster carries an explicit validity verdict; invalid
//! clusters are retained for diagnostics but never promoted to a detection.

use crate::NONE;
use fmo::prelude::v1::*;

/// Why a cluster was kept or discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterStatus {
    /// Valid candidate.
    Good,
    /// Fewer linked strips than the configured minimum.
    TooFewStrips,
    /// Taller than wide by far; fast-moving streaks are elongated along x.
    SmallAspect,
}

/// Chain of contact-linked strips with a validity verdict.
#[derive(Clone, Copy, Debug)]
pub struct Cluster {
    /// Index of the first strip in the chain.
    pub first: u16,
    /// Index of the last strip in the chain.
    pub last: u16,
    pub num_strips: usize,
    pub status: ClusterStatus,
}

impl Cluster {
    pub fn valid(&self) -> bool {
        self.status == ClusterStatus::Good
    }
}

/// Chain strips sorted by x into clusters and classify each.
pub(crate) fn find_clusters(
    strips: &[Strip],
    step: i32,
    min_strips: usize,
    next_strip: &mut Vec<u16>,
    out: &mut Vec<Cluster>,
) {
    out.clear();
    next_strip.clear();
    next_strip.resize(strips.len(), NONE);

    for (i, strip) in strips.iter().enumerate() {
        let joined = out.iter_mut().rev().any(|cluster| {
            let last = &strips[cluster.last as usize];
            if last.x + step == strip.x && Strip::overlap_y(last, strip) {
                next_strip[cluster.last as usize] = i as u16;
                cluster.last = i as u16;
                cluster.num_strips += 1;
                true
            } else {
                false
            }
        });

        if !joined {
            out.push(Cluster {
                first: i as u16,
                last: i as u16,
                num_strips: 1,
                status: ClusterStatus::Good,
            });
        }
    }

    for cluster in out.iter_mut() {
        if cluster.num_strips < min_strips {
            cluster.status = ClusterStatus::TooFewStrips;
            continue;
        }

        let first = strips[cluster.first as usize];
        let last = strips[cluster.last as usize];
        let span = last.x - first.x;
        let mut height = 0;
        let mut s = cluster.first as usize;
        loop {
            height = height.max(2 * strips[s].half_height);
            if s as u16 == cluster.last {
                break;
            }
            s = next_strip[s] as usize;
        }

        if 2 * span < height {
            cluster.status = ClusterStatus::SmallAspect;
        }
    }
}

/// Bounding extent over all strips of a cluster.
pub(crate) fn cluster_bounds(strips: &[Strip], next_strip: &[u16], cluster: &Cluster) -> Bounds {
    let mut s = cluster.first as usize;
    let mut bounds = Bounds::point(strips[s].center());
    loop {
        let strip = &strips[s];
        bounds.include(Pos::new(strip.x - strip.half_width, strip.y - strip.half_height));
        bounds.include(Pos::new(strip.x + strip.half_width, strip.y + strip.half_height));
        if s as u16 == cluster.last {
            break;
        }
        s = next_strip[s] as usize;
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lone_strips_are_too_few() {
        let strips = [Strip::new(2, 10, 2, 6), Strip::new(30, 10, 2, 6)];

        let mut next = vec![];
        let mut clusters = vec![];
        find_clusters(&strips, 4, 2, &mut next, &mut clusters);

        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.status == ClusterStatus::TooFewStrips));
        assert!(clusters.iter().all(|c| !c.valid()));
    }

    #[test]
    fn tall_narrow_chains_have_small_aspect() {
        // two adjacent columns of very tall strips
        let strips = [Strip::new(2, 50, 2, 40), Strip::new(6, 50, 2, 40)];

        let mut next = vec![];
        let mut clusters = vec![];
        find_clusters(&strips, 4, 2, &mut next, &mut clusters);

        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].status, ClusterStatus::SmallAspect);
    }

    #[test]
    fn elongated_chains_are_good() {
        let strips: Vec<_> = (0..6).map(|i| Strip::new(2 + 4 * i, 20, 2, 6)).collect();

        let mut next = vec![];
        let mut clusters = vec![];
        find_clusters(&strips, 4, 2, &mut next, &mut clusters);

        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].valid());

        let bounds = cluster_bounds(&strips, &next, &clusters[0]);
        assert_eq!(bounds.min, Pos::new(0, 14));
        assert_eq!(bounds.max, Pos::new(24, 26));
    }
}
