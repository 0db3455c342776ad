// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interior/exterior wall classification.
//!
//! A wall is interior when another room shares it (same endpoints, or a
//! parallel wall running alongside it) or when its midpoint lies inside
//! another room. Everything else faces outside.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::metrics::cross;
use crate::nesting::point_in_polygon;
use crate::snap::PointKey;
use crate::types::{Point, Wall, WallId};

/// Minimum overlap, as a fraction of the shorter wall, for two parallel
/// walls to count as the same wall.
const MIN_OVERLAP_FRACTION: f64 = 0.3;

/// Wall type classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WallType {
    Exterior,
    Interior,
}

/// Classification of one wall of one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallClassification {
    pub wall_id: WallId,
    pub is_interior: bool,
    /// Configured thickness for this wall type.
    pub thickness: f64,
}

impl WallClassification {
    pub fn wall_type(&self) -> WallType {
        if self.is_interior {
            WallType::Interior
        } else {
            WallType::Exterior
        }
    }
}

/// A room as seen by the classifier.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierRoom<'a> {
    pub walls: &'a [Wall],
    pub vertices: &'a [Point],
    /// Open chains enclose nothing, so only their walls are compared.
    pub closed: bool,
}

/// Classifies every wall of every room. The result is indexed like `rooms`.
pub fn classify_walls(
    rooms: &[ClassifierRoom<'_>],
    config: &EngineConfig,
) -> Vec<Vec<WallClassification>> {
    let classified: Vec<Vec<WallClassification>> = rooms
        .iter()
        .enumerate()
        .map(|(index, room)| {
            room.walls
                .iter()
                .map(|wall| {
                    let is_interior = rooms
                        .iter()
                        .enumerate()
                        .filter(|&(other, _)| other != index)
                        .any(|(_, other)| is_shared_or_enclosed(wall, other, config));
                    WallClassification {
                        wall_id: wall.id,
                        is_interior,
                        thickness: if is_interior {
                            config.interior_thickness
                        } else {
                            config.exterior_thickness
                        },
                    }
                })
                .collect()
        })
        .collect();

    tracing::debug!(
        rooms = rooms.len(),
        interior = classified
            .iter()
            .flatten()
            .filter(|c| c.is_interior)
            .count(),
        "Classified walls"
    );

    classified
}

fn is_shared_or_enclosed(wall: &Wall, other: &ClassifierRoom<'_>, config: &EngineConfig) -> bool {
    if other
        .walls
        .iter()
        .any(|candidate| walls_coincide(wall, candidate, config))
    {
        return true;
    }
    other.closed && other.vertices.len() >= 3 && point_in_polygon(&wall.midpoint(), other.vertices)
}

/// Same endpoint pair in either direction, or parallel walls overlapping
/// along most of the shorter one.
pub fn walls_coincide(a: &Wall, b: &Wall, config: &EngineConfig) -> bool {
    let tol = config.snap_tolerance;
    let (a0, a1) = (
        PointKey::from_point(&a.start, tol),
        PointKey::from_point(&a.end, tol),
    );
    let (b0, b1) = (
        PointKey::from_point(&b.start, tol),
        PointKey::from_point(&b.end, tol),
    );
    if (a0 == b0 && a1 == b1) || (a0 == b1 && a1 == b0) {
        return true;
    }
    walls_overlap(a, b, config)
}

/// Parallel walls within the coincidence tolerance whose extents overlap.
fn walls_overlap(a: &Wall, b: &Wall, config: &EngineConfig) -> bool {
    let da = a.direction();
    let db = b.direction();
    let (la, lb) = (da.norm(), db.norm());
    if la <= 0.0 || lb <= 0.0 {
        return false;
    }

    // parallel in either direction
    if cross(&da, &db).abs() > config.angle_tolerance().sin() * la * lb {
        return false;
    }

    let perpendicular = point_to_segment_distance(&b.midpoint(), &a.start, &a.end);
    if perpendicular > config.coincidence_tolerance {
        return false;
    }

    // project both onto a's direction
    let axis = da / la;
    let project = |p: &Point| p.x * axis.x + p.z * axis.y;
    let (min_a, max_a) = min_max(project(&a.start), project(&a.end));
    let (min_b, max_b) = min_max(project(&b.start), project(&b.end));

    let overlap = (max_a.min(max_b) - min_a.max(min_b)).max(0.0);
    overlap > la.min(lb) * MIN_OVERLAP_FRACTION
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    (a.min(b), a.max(b))
}

/// Distance from `point` to the segment `start`-`end`.
pub fn point_to_segment_distance(point: &Point, start: &Point, end: &Point) -> f64 {
    let d = start.vector_to(end);
    let length_sq = d.norm_squared();
    if length_sq < 1e-20 {
        return point.distance_to(start);
    }
    let t = (start.vector_to(point).dot(&d) / length_sq).clamp(0.0, 1.0);
    let projected = Point::new(start.x + t * d.x, start.z + t * d.y);
    point.distance_to(&projected)
}
