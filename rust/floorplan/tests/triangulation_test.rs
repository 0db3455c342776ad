// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ear clipping checked against earcut on room-like polygons.

use approx::assert_relative_eq;
use floorplan_topology::metrics::polygon_area;
use floorplan_topology::triangulate::triangle_area;
use floorplan_topology::{triangulate, Point, TriangulationMethod};

fn earcut_area(vertices: &[Point]) -> f64 {
    let flat: Vec<f64> = vertices.iter().flat_map(|p| [p.x, p.z]).collect();
    let indices = earcutr::earcut(&flat, &[], 2).unwrap();
    indices
        .chunks(3)
        .map(|t| triangle_area(&vertices[t[0]], &vertices[t[1]], &vertices[t[2]]).abs())
        .sum()
}

fn polygons() -> Vec<(&'static str, Vec<Point>)> {
    vec![
        (
            "rectangle",
            vec![
                Point::new(0.0, 0.0),
                Point::new(6.0, 0.0),
                Point::new(6.0, 4.0),
                Point::new(0.0, 4.0),
            ],
        ),
        (
            "l-shape",
            vec![
                Point::new(0.0, 0.0),
                Point::new(6.0, 0.0),
                Point::new(6.0, 3.0),
                Point::new(3.0, 3.0),
                Point::new(3.0, 6.0),
                Point::new(0.0, 6.0),
            ],
        ),
        (
            "u-shape",
            vec![
                Point::new(0.0, 0.0),
                Point::new(9.0, 0.0),
                Point::new(9.0, 6.0),
                Point::new(6.0, 6.0),
                Point::new(6.0, 2.0),
                Point::new(3.0, 2.0),
                Point::new(3.0, 6.0),
                Point::new(0.0, 6.0),
            ],
        ),
        (
            "t-shape",
            vec![
                Point::new(3.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(5.0, 4.0),
                Point::new(8.0, 4.0),
                Point::new(8.0, 6.0),
                Point::new(0.0, 6.0),
                Point::new(0.0, 4.0),
                Point::new(3.0, 4.0),
            ],
        ),
        (
            "bay window",
            vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(5.0, 1.5),
                Point::new(5.8, 2.0),
                Point::new(5.8, 3.0),
                Point::new(5.0, 3.5),
                Point::new(5.0, 5.0),
                Point::new(0.0, 5.0),
            ],
        ),
    ]
}

#[test]
fn triangle_areas_sum_to_polygon_area() {
    for (name, vertices) in polygons() {
        let t = triangulate(&vertices);
        assert_eq!(t.method, TriangulationMethod::EarClipping, "{name}");
        assert_eq!(t.len(), vertices.len() - 2, "{name}");
        assert_relative_eq!(
            t.area(&vertices),
            polygon_area(&vertices),
            max_relative = 1e-6
        );
    }
}

#[test]
fn matches_earcut_reference() {
    for (_, vertices) in polygons() {
        let ours = triangulate(&vertices).area(&vertices);
        assert_relative_eq!(ours, earcut_area(&vertices), max_relative = 1e-6);
    }
}

#[test]
fn clockwise_input_matches_too() {
    for (name, mut vertices) in polygons() {
        vertices.reverse();
        let t = triangulate(&vertices);
        assert_relative_eq!(
            t.area(&vertices),
            polygon_area(&vertices),
            max_relative = 1e-6
        );
        for &[a, b, c] in &t.triangles {
            assert!(
                triangle_area(&vertices[a], &vertices[b], &vertices[c]) >= 0.0,
                "{name}: clockwise triangle"
            );
        }
    }
}
