// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shape metrics for traced room polygons.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, Point, Wall};

/// Areas below this are treated as zero when choosing the centroid formula.
const AREA_EPSILON: f64 = 1e-12;

/// Shape metrics of one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeMetrics {
    pub area: f64,
    pub perimeter: f64,
    pub centroid: Point,
    pub bounding_box: BoundingBox,
    /// 4π·area / perimeter². 1.0 for a circle, ~0.785 for a square.
    pub compactness: f64,
    /// 1.0 when every turn has the same sign.
    pub convexity: f64,
    /// 1.0 for a perfect rectangle, 0.0 for anything without four vertices.
    pub rectangularity: f64,
    /// Bounding-box width / height.
    pub aspect_ratio: f64,
    /// Interior angle per vertex (radians, [0, 2π)).
    pub interior_angles: Vec<f64>,
}

/// Computes all metrics for a CCW vertex loop. Perimeter sums `walls`.
pub fn compute_metrics(vertices: &[Point], walls: &[Wall]) -> ShapeMetrics {
    let area = polygon_area(vertices);
    let perimeter = walls.iter().map(Wall::length).sum();
    let bounding_box = BoundingBox::from_points(vertices).unwrap_or_default();

    ShapeMetrics {
        area,
        perimeter,
        centroid: centroid(vertices),
        bounding_box,
        compactness: compactness(area, perimeter),
        convexity: convexity(vertices),
        rectangularity: rectangularity(vertices),
        aspect_ratio: aspect_ratio(&bounding_box),
        interior_angles: interior_angles(vertices),
    }
}

/// Signed shoelace area. Positive for counter-clockwise loops.
pub fn signed_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        sum += a.x * b.z - b.x * a.z;
    }
    sum / 2.0
}

pub fn polygon_area(vertices: &[Point]) -> f64 {
    signed_area(vertices).abs()
}

/// Sum of the closed loop's edge lengths.
pub fn loop_perimeter(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| vertices[i].distance_to(&vertices[(i + 1) % n]))
        .sum()
}

/// Area-weighted centroid, or the vertex average for degenerate loops.
pub fn centroid(vertices: &[Point]) -> Point {
    if vertices.is_empty() {
        return Point::new(0.0, 0.0);
    }

    let area = signed_area(vertices);
    if area.abs() < AREA_EPSILON {
        return vertex_average(vertices);
    }

    let n = vertices.len();
    let (mut cx, mut cz) = (0.0, 0.0);
    for i in 0..n {
        let a = &vertices[i];
        let b = &vertices[(i + 1) % n];
        let cross = a.x * b.z - b.x * a.z;
        cx += (a.x + b.x) * cross;
        cz += (a.z + b.z) * cross;
    }
    let factor = 1.0 / (6.0 * area);
    Point::new(cx * factor, cz * factor)
}

fn vertex_average(vertices: &[Point]) -> Point {
    let n = vertices.len() as f64;
    let (sx, sz) = vertices
        .iter()
        .fold((0.0, 0.0), |(sx, sz), p| (sx + p.x, sz + p.z));
    Point::new(sx / n, sz / n)
}

pub fn compactness(area: f64, perimeter: f64) -> f64 {
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * PI * area / (perimeter * perimeter)
}

/// 1 − (sign changes between consecutive turn cross products) / n.
pub fn convexity(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }

    let crosses: Vec<f64> = (0..n)
        .map(|i| {
            let prev = &vertices[(i + n - 1) % n];
            let v = &vertices[i];
            let next = &vertices[(i + 1) % n];
            cross(&prev.vector_to(v), &v.vector_to(next))
        })
        .filter(|c| c.abs() > AREA_EPSILON)
        .collect();

    let m = crosses.len();
    if m == 0 {
        return 1.0;
    }
    let sign_changes = (0..m)
        .filter(|&i| (crosses[i] > 0.0) != (crosses[(i + 1) % m] > 0.0))
        .count();

    1.0 - sign_changes as f64 / n as f64
}

/// Average of the right-angle score and the opposite-side ratio score.
/// Only defined for quadrilaterals.
pub fn rectangularity(vertices: &[Point]) -> f64 {
    if vertices.len() != 4 {
        return 0.0;
    }

    let angles = interior_angles(vertices);
    let mean_deviation =
        angles.iter().map(|a| (a - FRAC_PI_2).abs()).sum::<f64>() / angles.len() as f64;
    let angle_score = (1.0 - mean_deviation / FRAC_PI_2).max(0.0);

    let sides: Vec<f64> = (0..4)
        .map(|i| vertices[i].distance_to(&vertices[(i + 1) % 4]))
        .collect();
    let side_score = (side_ratio(sides[0], sides[2]) + side_ratio(sides[1], sides[3])) / 2.0;

    (angle_score + side_score) / 2.0
}

fn side_ratio(a: f64, b: f64) -> f64 {
    let longer = a.max(b);
    if longer <= 0.0 {
        return 0.0;
    }
    a.min(b) / longer
}

pub fn aspect_ratio(bbox: &BoundingBox) -> f64 {
    let height = bbox.height();
    if height.abs() < AREA_EPSILON {
        return 0.0;
    }
    bbox.width() / height
}

/// Interior angle at each vertex of a CCW loop, in [0, 2π).
///
/// Reflex corners come out above π.
pub fn interior_angles(vertices: &[Point]) -> Vec<f64> {
    let n = vertices.len();
    if n < 3 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let v = &vertices[i];
            let a = v.vector_to(&vertices[(i + n - 1) % n]);
            let b = v.vector_to(&vertices[(i + 1) % n]);
            cross(&b, &a).atan2(b.dot(&a)).rem_euclid(TAU)
        })
        .collect()
}

#[inline]
pub(crate) fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]
    }

    fn l_shape() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(6.0, 3.0),
            Point::new(3.0, 3.0),
            Point::new(3.0, 6.0),
            Point::new(0.0, 6.0),
        ]
    }

    fn walls_of(vertices: &[Point]) -> Vec<Wall> {
        crate::trace::generate_connected_walls(vertices, 2.7, 0.15)
    }

    #[test]
    fn rectangle_metrics() {
        let vertices = rect(6.0, 4.0);
        let m = compute_metrics(&vertices, &walls_of(&vertices));
        assert_relative_eq!(m.area, 24.0, epsilon = 1e-9);
        assert_relative_eq!(m.perimeter, 20.0, epsilon = 1e-9);
        assert_relative_eq!(m.compactness, 4.0 * PI * 24.0 / 400.0, epsilon = 1e-9);
        assert_relative_eq!(m.compactness, 0.754, epsilon = 1e-3);
        assert_relative_eq!(m.rectangularity, 1.0, epsilon = 1e-3);
        assert_relative_eq!(m.convexity, 1.0);
        assert_relative_eq!(m.aspect_ratio, 1.5, epsilon = 1e-9);
        assert_relative_eq!(m.centroid.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(m.centroid.z, 2.0, epsilon = 1e-9);
        for angle in &m.interior_angles {
            assert_relative_eq!(*angle, FRAC_PI_2, epsilon = 1e-9);
        }
    }

    #[test]
    fn area_ignores_orientation_and_start() {
        let ccw = l_shape();
        let mut cw = ccw.clone();
        cw.reverse();
        let mut rotated = ccw.clone();
        rotated.rotate_left(2);
        assert_relative_eq!(polygon_area(&ccw), 27.0, epsilon = 1e-9);
        assert_relative_eq!(polygon_area(&cw), 27.0, epsilon = 1e-9);
        assert_relative_eq!(polygon_area(&rotated), 27.0, epsilon = 1e-9);
        assert!(signed_area(&cw) < 0.0);
    }

    #[test]
    fn l_shape_is_not_convex() {
        let vertices = l_shape();
        assert!(convexity(&vertices) < 1.0);
        assert_eq!(rectangularity(&vertices), 0.0);
        let angles = interior_angles(&vertices);
        // reflex corner at (3, 3)
        assert_relative_eq!(angles[3], 3.0 * FRAC_PI_2, epsilon = 1e-9);
        let total: f64 = angles.iter().sum();
        assert_relative_eq!(total, 4.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn l_shape_centroid() {
        let c = centroid(&l_shape());
        // 6x3 bottom slab (18, centroid (3, 1.5)) + 3x3 top-left block (9, centroid (1.5, 4.5))
        assert_relative_eq!(c.x, (18.0 * 3.0 + 9.0 * 1.5) / 27.0, epsilon = 1e-9);
        assert_relative_eq!(c.z, (18.0 * 1.5 + 9.0 * 4.5) / 27.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(signed_area(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0)]), 0.0);
        let collinear = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
        ];
        let c = centroid(&collinear);
        assert_relative_eq!(c.x, 1.0);
        assert_eq!(compactness(0.0, 0.0), 0.0);
        assert_eq!(aspect_ratio(&BoundingBox::default()), 0.0);
    }

    #[test]
    fn skewed_quad_scores_below_rectangle() {
        let quad = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(5.0, 2.0),
            Point::new(0.0, 3.0),
        ];
        assert!(rectangularity(&quad) < 0.95);
        assert_relative_eq!(loop_perimeter(&rect(2.0, 1.0)), 6.0);
    }
}
