// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room containment.
//!
//! A room is nested in another when every one of its vertices lies inside
//! the other's polygon. Among all containing rooms the smallest one is the
//! parent, which turns the relation into a forest.

use crate::types::Point;

/// Even-odd ray casting along +x.
///
/// Points exactly on an edge may land on either side.
pub fn point_in_polygon(point: &Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[j];
        if (a.z > point.z) != (b.z > point.z)
            && point.x < (b.x - a.x) * (point.z - a.z) / (b.z - a.z) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// True when every vertex of `inner` is inside `outer`.
pub fn polygon_contains(outer: &[Point], inner: &[Point]) -> bool {
    !inner.is_empty() && inner.iter().all(|p| point_in_polygon(p, outer))
}

/// A room as seen by the nesting pass.
#[derive(Debug, Clone, Copy)]
pub struct NestingCandidate<'a> {
    pub vertices: &'a [Point],
    pub area: f64,
    /// Invalid rooms neither contain nor get contained.
    pub is_valid: bool,
}

/// Parent index per room: the smallest-area valid room that contains it.
///
/// A parent must be strictly larger than its child, so two identical loops
/// never nest in each other.
pub fn detect_parents(rooms: &[NestingCandidate<'_>]) -> Vec<Option<usize>> {
    let parents: Vec<Option<usize>> = rooms
        .iter()
        .enumerate()
        .map(|(child_index, child)| {
            if !child.is_valid {
                return None;
            }
            rooms
                .iter()
                .enumerate()
                .filter(|&(i, parent)| {
                    i != child_index
                        && parent.is_valid
                        && parent.area > child.area
                        && polygon_contains(parent.vertices, child.vertices)
                })
                .min_by(|a, b| a.1.area.total_cmp(&b.1.area))
                .map(|(i, _)| i)
        })
        .collect();

    tracing::debug!(
        rooms = rooms.len(),
        nested = parents.iter().filter(|p| p.is_some()).count(),
        "Detected room nesting"
    );

    parents
}
