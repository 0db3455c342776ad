// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segment optimizer: cleans up hand-drawn wall sets.
//!
//! Each pass runs these steps in order:
//! 1. Clustering: endpoints within the cluster tolerance move onto one
//!    representative, closing small gaps
//! 2. Axis snap (optional): near-horizontal/vertical walls are straightened
//!    by unifying the shared coordinate of their endpoints
//! 3. Cleanup: short walls and duplicate walls (same endpoints, either
//!    direction) are dropped
//! 4. Collinear merge: two same-direction walls meeting at a vertex that no
//!    other wall touches become one wall
//!
//! Passes repeat until one changes nothing (bounded by
//! `max_optimizer_passes`), so the optimizer applied to its own output is a
//! no-op.

use std::f64::consts::FRAC_PI_2;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::metrics::cross;
use crate::snap::PointKey;
use crate::types::{Point, Wall};

/// Counters from one optimizer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStats {
    pub input_count: usize,
    pub removed_invalid: usize,
    pub axis_snapped: usize,
    pub snapped_endpoints: usize,
    pub removed_short: usize,
    pub removed_duplicates: usize,
    pub merged: usize,
    pub passes: usize,
    pub output_count: usize,
}

/// Result of [`optimize_walls`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedWalls {
    pub walls: Vec<Wall>,
    pub stats: OptimizationStats,
}

/// Runs the optimizer passes to a fixpoint.
pub fn optimize_walls(walls: &[Wall], config: &EngineConfig) -> OptimizedWalls {
    let mut stats = OptimizationStats {
        input_count: walls.len(),
        ..Default::default()
    };

    let mut walls: Vec<Wall> = walls.iter().filter(|w| w.is_finite()).cloned().collect();
    stats.removed_invalid = stats.input_count - walls.len();

    let max_passes = config.max_optimizer_passes.max(1);
    loop {
        stats.passes += 1;

        let snapped = cluster_endpoints(&mut walls, config.cluster_tolerance);
        let axis_snapped = if config.axis_snap {
            snap_to_axes(&mut walls, config)
        } else {
            0
        };

        let before = walls.len();
        walls = remove_short_walls(walls, config.min_wall_length);
        let removed_short = before - walls.len();

        let before = walls.len();
        walls = remove_duplicate_walls(walls, config.snap_tolerance);
        let removed_duplicates = before - walls.len();

        let merged = merge_collinear_walls(&mut walls, config);

        stats.axis_snapped += axis_snapped;
        stats.snapped_endpoints += snapped;
        stats.removed_short += removed_short;
        stats.removed_duplicates += removed_duplicates;
        stats.merged += merged;

        let changed = axis_snapped + snapped + removed_short + removed_duplicates + merged > 0;
        if !changed {
            break;
        }
        if stats.passes >= max_passes {
            tracing::warn!(
                passes = stats.passes,
                "Segment optimizer stopped before reaching a fixpoint"
            );
            break;
        }
    }

    stats.output_count = walls.len();
    tracing::debug!(
        input = stats.input_count,
        output = stats.output_count,
        snapped = stats.snapped_endpoints,
        merged = stats.merged,
        passes = stats.passes,
        "Optimized wall segments"
    );

    OptimizedWalls { walls, stats }
}

// ─── Axis snap ──────────────────────────────────────────────────────────────

/// Straightens walls within the angle tolerance of an axis.
///
/// Endpoints joined by a near-horizontal wall share one `z`, endpoints joined
/// by a near-vertical wall share one `x`; each group takes the coordinate of
/// its first-seen endpoint. Working on endpoint groups rather than single
/// walls keeps connected walls connected. Returns the number of endpoints
/// moved.
fn snap_to_axes(walls: &mut [Wall], config: &EngineConfig) -> usize {
    let tolerance = config.angle_tolerance();
    let mut index_of: FxHashMap<PointKey, usize> = FxHashMap::default();
    let mut points: Vec<Point> = Vec::new();
    let mut endpoint_ids = Vec::with_capacity(walls.len());

    for wall in walls.iter() {
        let mut id = |p: Point| {
            *index_of
                .entry(PointKey::from_point(&p, config.snap_tolerance))
                .or_insert_with(|| {
                    points.push(p);
                    points.len() - 1
                })
        };
        endpoint_ids.push((id(wall.start), id(wall.end)));
    }

    let mut same_x = DisjointSet::new(points.len());
    let mut same_z = DisjointSet::new(points.len());
    for (wall, &(a, b)) in walls.iter().zip(&endpoint_ids) {
        let d = wall.direction();
        let angle = d.y.atan2(d.x).abs();
        if angle < tolerance || angle > std::f64::consts::PI - tolerance {
            same_z.union(a, b);
        } else if (angle - FRAC_PI_2).abs() < tolerance {
            same_x.union(a, b);
        }
    }

    let mut moved = 0;
    for (wall, &(a, b)) in walls.iter_mut().zip(&endpoint_ids) {
        for (endpoint, index) in [(&mut wall.start, a), (&mut wall.end, b)] {
            let target = Point::new(
                points[same_x.find(index)].x,
                points[same_z.find(index)].z,
            );
            if endpoint.distance_to(&target) > 0.0 {
                *endpoint = target;
                moved += 1;
            }
        }
    }
    moved
}

/// Union-find where the smallest index is always the root.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

// ─── Clustering ─────────────────────────────────────────────────────────────

/// Moves every endpoint onto the first representative within `tolerance`.
/// Returns the number of endpoints that actually moved.
fn cluster_endpoints(walls: &mut [Wall], tolerance: f64) -> usize {
    let cell = |p: &Point| {
        (
            (p.x / tolerance).floor() as i64,
            (p.z / tolerance).floor() as i64,
        )
    };

    let mut representatives: Vec<Point> = Vec::new();
    let mut grid: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
    let mut moved = 0;

    for wall in walls.iter_mut() {
        for endpoint in [&mut wall.start, &mut wall.end] {
            let (cx, cz) = cell(&*endpoint);
            let mut nearest: Option<usize> = None;
            for dx in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cz + dz)) else {
                        continue;
                    };
                    for &r in bucket {
                        if representatives[r].distance_to(endpoint) <= tolerance
                            && nearest.map_or(true, |n| r < n)
                        {
                            nearest = Some(r);
                        }
                    }
                }
            }

            match nearest {
                Some(r) => {
                    let target = representatives[r];
                    if endpoint.distance_to(&target) > 0.0 {
                        *endpoint = target;
                        moved += 1;
                    }
                }
                None => {
                    grid.entry((cx, cz)).or_default().push(representatives.len());
                    representatives.push(*endpoint);
                }
            }
        }
    }

    moved
}

// ─── Cleanup ────────────────────────────────────────────────────────────────

fn remove_short_walls(walls: Vec<Wall>, min_length: f64) -> Vec<Wall> {
    walls
        .into_iter()
        .filter(|w| w.length() >= min_length)
        .collect()
}

/// Keeps the first wall for every unordered endpoint-key pair.
fn remove_duplicate_walls(walls: Vec<Wall>, tolerance: f64) -> Vec<Wall> {
    let mut seen: FxHashSet<(PointKey, PointKey)> = FxHashSet::default();
    walls
        .into_iter()
        .filter(|w| {
            let a = PointKey::from_point(&w.start, tolerance);
            let b = PointKey::from_point(&w.end, tolerance);
            seen.insert((a.min(b), a.max(b)))
        })
        .collect()
}

// ─── Collinear merge ────────────────────────────────────────────────────────

/// Merges collinear wall pairs until none remain. Returns the merge count.
fn merge_collinear_walls(walls: &mut Vec<Wall>, config: &EngineConfig) -> usize {
    let mut merged = 0;
    while let Some(merge) = find_collinear_pair(walls, config) {
        let kept = &mut walls[merge.keep];
        if merge.at_end {
            kept.end = merge.far;
        } else {
            kept.start = merge.far;
        }
        walls.remove(merge.remove);
        merged += 1;
    }
    merged
}

/// Two walls to fuse: `keep` is extended to `far` (the far end of `remove`)
/// on its end side when `at_end`, else on its start side.
struct CollinearMerge {
    keep: usize,
    remove: usize,
    at_end: bool,
    far: Point,
}

/// First mergeable pair in wall order.
fn find_collinear_pair(walls: &[Wall], config: &EngineConfig) -> Option<CollinearMerge> {
    let tol = config.snap_tolerance;
    let sin_tol = config.angle_tolerance().sin();

    let mut incident: FxHashMap<PointKey, Vec<usize>> = FxHashMap::default();
    for (i, wall) in walls.iter().enumerate() {
        incident
            .entry(PointKey::from_point(&wall.start, tol))
            .or_default()
            .push(i);
        incident
            .entry(PointKey::from_point(&wall.end, tol))
            .or_default()
            .push(i);
    }

    for (i, wall) in walls.iter().enumerate() {
        for (at_end, joint, far_i) in [(true, wall.end, wall.start), (false, wall.start, wall.end)] {
            let joint_key = PointKey::from_point(&joint, tol);
            let Some(touching) = incident.get(&joint_key) else {
                continue;
            };
            if touching.len() != 2 {
                continue;
            }
            let Some(&j) = touching.iter().find(|&&k| k != i) else {
                continue;
            };
            let other = &walls[j];
            let far_j = if PointKey::from_point(&other.start, tol) == joint_key {
                other.end
            } else {
                other.start
            };
            if PointKey::from_point(&far_i, tol) == PointKey::from_point(&far_j, tol) {
                continue;
            }

            let d_in = far_i.vector_to(&joint);
            let d_out = joint.vector_to(&far_j);
            let collinear = cross(&d_in, &d_out).abs() <= sin_tol * d_in.norm() * d_out.norm();
            if collinear && d_in.dot(&d_out) > 0.0 {
                return Some(CollinearMerge {
                    keep: i,
                    remove: j,
                    at_end,
                    far: far_j,
                });
            }
        }
    }
    None
}
