// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance-grid point identity.
//!
//! Every coordinate is rounded to the nearest multiple of the snap tolerance
//! and the integer pair becomes the point's [`PointKey`]. Key equality is the
//! only "same point" test used by the rest of the engine.
//!
//! The first point seen for a key becomes that key's representative, so the
//! earliest drawn position wins over later near-duplicates.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::types::{Point, Wall};

/// Integer grid identity of a snapped point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointKey {
    pub x: i64,
    pub z: i64,
}

impl PointKey {
    /// Grid cell of `point` for the given tolerance.
    #[inline]
    pub fn from_point(point: &Point, tolerance: f64) -> Self {
        Self {
            x: (point.x / tolerance).round() as i64,
            z: (point.z / tolerance).round() as i64,
        }
    }
}

/// Maps points to grid keys and remembers one representative per key.
#[derive(Debug, Clone)]
pub struct PointSnapper {
    tolerance: f64,
    representatives: FxHashMap<PointKey, Point>,
}

impl PointSnapper {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            representatives: FxHashMap::default(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Grid key of `point`. Does not register it.
    #[inline]
    pub fn key(&self, point: &Point) -> PointKey {
        PointKey::from_point(point, self.tolerance)
    }

    /// Registers `point` and returns its key. The first point registered for a
    /// key stays its representative.
    pub fn insert(&mut self, point: Point) -> PointKey {
        let key = self.key(&point);
        self.representatives.entry(key).or_insert(point);
        key
    }

    /// Registers `point` and returns the representative of its key.
    pub fn snap(&mut self, point: Point) -> Point {
        let key = self.key(&point);
        *self.representatives.entry(key).or_insert(point)
    }

    pub fn representative(&self, key: PointKey) -> Option<Point> {
        self.representatives.get(&key).copied()
    }

    /// Number of distinct keys registered so far.
    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }
}

/// Returns a copy of `walls` with every endpoint replaced by its key's
/// representative. Running it on its own output changes nothing.
pub fn snap_walls(walls: &[Wall], tolerance: f64) -> Vec<Wall> {
    let mut snapper = PointSnapper::new(tolerance);
    walls
        .iter()
        .map(|wall| {
            let mut snapped = wall.clone();
            snapped.start = snapper.snap(wall.start);
            snapped.end = snapper.snap(wall.end);
            snapped
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_points_share_a_key() {
        let snapper = PointSnapper::new(0.001);
        let a = snapper.key(&Point::new(1.0, 2.0));
        let b = snapper.key(&Point::new(1.0003, 1.9998));
        let c = snapper.key(&Point::new(1.002, 2.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn first_point_is_representative() {
        let mut snapper = PointSnapper::new(0.01);
        let first = Point::new(0.001, 0.002);
        snapper.insert(first);
        let snapped = snapper.snap(Point::new(-0.002, 0.0));
        assert_eq!(snapped, first);
        assert_eq!(snapper.len(), 1);
    }

    #[test]
    fn snapping_walls_is_idempotent() {
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(4.0002, 0.0)),
            Wall::new(2, Point::new(3.9999, 0.0003), Point::new(4.0, 3.0)),
        ];
        let once = snap_walls(&walls, 0.001);
        let twice = snap_walls(&once, 0.001);
        assert_eq!(once, twice);
        assert_eq!(once[0].end, once[1].start);
    }

    #[test]
    fn coarse_tolerance_merges_more() {
        let snapper = PointSnapper::new(0.1);
        assert_eq!(
            snapper.key(&Point::new(2.0, 2.0)),
            snapper.key(&Point::new(2.04, 1.97))
        );
    }
}
