// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for floor plan topology: points, walls, ids and bounds.
//!
//! Coordinates live on the room-plan plane: `x` to the right, `z` forward,
//! both in meters. The vertical axis (`y`) only appears when a floor mesh is
//! generated.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default wall height in meters when the input omits it.
pub const DEFAULT_WALL_HEIGHT: f64 = 2.7;

/// Default wall thickness in meters when the input omits it.
pub const DEFAULT_WALL_THICKNESS: f64 = 0.15;

/// A point on the floor plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Vector from `self` to `other`.
    pub fn vector_to(&self, other: &Point) -> Vector2<f64> {
        Vector2::new(other.x - self.x, other.z - self.z)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        self.vector_to(other).norm()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.z + other.z) / 2.0)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }
}

/// Caller-assigned wall identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WallId(pub u64);

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wall#{}", self.0)
    }
}

/// Engine-assigned room identifier (trace order).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RoomId(pub usize);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

fn default_height() -> f64 {
    DEFAULT_WALL_HEIGHT
}

fn default_thickness() -> f64 {
    DEFAULT_WALL_THICKNESS
}

/// A drawn wall segment.
///
/// Height and thickness are carried through for rendering; topology only
/// looks at the endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wall {
    pub id: WallId,
    pub start: Point,
    pub end: Point,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_thickness")]
    pub thickness: f64,
}

impl Wall {
    pub fn new(id: u64, start: Point, end: Point) -> Self {
        Self {
            id: WallId(id),
            start,
            end,
            height: DEFAULT_WALL_HEIGHT,
            thickness: DEFAULT_WALL_THICKNESS,
        }
    }

    pub fn with_dimensions(mut self, height: f64, thickness: f64) -> Self {
        self.height = height;
        self.thickness = thickness;
        self
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn midpoint(&self) -> Point {
        self.start.midpoint(&self.end)
    }

    pub fn direction(&self) -> Vector2<f64> {
        self.start.vector_to(&self.end)
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }
}

/// Axis-aligned bounds on the floor plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

impl BoundingBox {
    /// Bounds of a point set, or `None` if the set is empty.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox {
            min_x: first.x,
            min_z: first.z,
            max_x: first.x,
            max_z: first.z,
        };
        for p in &points[1..] {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_z = bbox.min_z.min(p.z);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_z = bbox.max_z.max(p.z);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_z - self.min_z
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_z: 0.0,
            max_x: 0.0,
            max_z: 0.0,
        }
    }
}
