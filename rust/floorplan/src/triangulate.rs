// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation.
//!
//! Ear clipping for simple (possibly concave) polygons, falling back to a
//! fan from the first remaining vertex when no ear can be found. Triangles
//! index into the caller's vertex order and are always counter-clockwise.

use serde::{Deserialize, Serialize};

use crate::metrics::{cross, signed_area};
use crate::types::Point;

/// Relative threshold below which a corner counts as straight.
const CONVEX_EPSILON: f64 = 1e-12;

/// Which strategy produced a triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriangulationMethod {
    /// Fewer than three vertices, no triangles.
    Empty,
    /// Exactly three vertices.
    Single,
    EarClipping,
    /// Ear clipping got stuck; the rest was fanned.
    FanFallback,
}

/// Triangle indices into the input vertex list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triangulation {
    pub triangles: Vec<[usize; 3]>,
    pub method: TriangulationMethod,
}

impl Triangulation {
    fn empty() -> Self {
        Self {
            triangles: Vec::new(),
            method: TriangulationMethod::Empty,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sum of triangle areas.
    pub fn area(&self, vertices: &[Point]) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| triangle_area(&vertices[a], &vertices[b], &vertices[c]).abs())
            .sum()
    }

    /// Flattened `[i0, j0, k0, i1, ...]` index buffer.
    pub fn flat_indices(&self) -> Vec<usize> {
        self.triangles.iter().flatten().copied().collect()
    }
}

/// Triangulates a simple polygon given in either orientation.
pub fn triangulate(vertices: &[Point]) -> Triangulation {
    let n = vertices.len();
    if n < 3 {
        return Triangulation::empty();
    }

    let mut remaining: Vec<usize> = (0..n).collect();
    if signed_area(vertices) < 0.0 {
        remaining.reverse();
    }

    if n == 3 {
        return Triangulation {
            triangles: vec![[remaining[0], remaining[1], remaining[2]]],
            method: TriangulationMethod::Single,
        };
    }

    let mut triangles = Vec::with_capacity(n - 2);
    let mut cursor = 0;
    let mut misses = 0;

    while remaining.len() > 3 {
        let m = remaining.len();
        if misses >= m {
            tracing::debug!(
                vertices = n,
                remaining = m,
                "No ear found, falling back to fan triangulation"
            );
            for i in 1..m - 1 {
                triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
            }
            return Triangulation {
                triangles,
                method: TriangulationMethod::FanFallback,
            };
        }

        let i = cursor % m;
        let prev = remaining[(i + m - 1) % m];
        let current = remaining[i];
        let next = remaining[(i + 1) % m];

        if is_ear(vertices, &remaining, prev, current, next) {
            triangles.push([prev, current, next]);
            remaining.remove(i);
            misses = 0;
            cursor = if i == 0 { 0 } else { i - 1 };
        } else {
            cursor = i + 1;
            misses += 1;
        }
    }

    triangles.push([remaining[0], remaining[1], remaining[2]]);
    Triangulation {
        triangles,
        method: TriangulationMethod::EarClipping,
    }
}

fn is_ear(vertices: &[Point], remaining: &[usize], prev: usize, current: usize, next: usize) -> bool {
    let a = &vertices[prev];
    let b = &vertices[current];
    let c = &vertices[next];

    let e1 = a.vector_to(b);
    let e2 = b.vector_to(c);
    if cross(&e1, &e2) <= CONVEX_EPSILON * e1.norm() * e2.norm() {
        return false;
    }

    !remaining
        .iter()
        .filter(|&&r| r != prev && r != current && r != next)
        .any(|&r| point_in_triangle(&vertices[r], a, b, c))
}

/// Barycentric containment test, inclusive of the boundary.
pub fn point_in_triangle(p: &Point, a: &Point, b: &Point, c: &Point) -> bool {
    let v0 = a.vector_to(c);
    let v1 = a.vector_to(b);
    let v2 = a.vector_to(p);

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < 1e-20 {
        return false;
    }
    let inv = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv;
    let v = (dot00 * dot12 - dot01 * dot02) * inv;

    u >= 0.0 && v >= 0.0 && u + v <= 1.0
}

/// Signed triangle area, positive when counter-clockwise.
pub fn triangle_area(a: &Point, b: &Point, c: &Point) -> f64 {
    cross(&a.vector_to(b), &a.vector_to(c)) / 2.0
}
