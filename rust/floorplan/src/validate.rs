// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology validation.
//!
//! Screens raw walls (non-finite, zero-length, out-of-range dimensions) and
//! checks vertex degrees of the connectivity graph. A wall set is valid when
//! it has at least three usable walls, no open edges and no loop that
//! collapses to zero area. Branching junctions are reported as warnings
//! since adjoining rooms legitimately share them.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{partition, Diagnostic, Dimension};
use crate::graph::{ConnectivityGraph, SkipReason};
use crate::trace::{trace_loops, TracedLoop};
use crate::types::Wall;

/// Summary numbers for a validated wall set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyMetrics {
    /// Total length of usable walls.
    pub perimeter: f64,
    /// Walls that made it into the graph.
    pub wall_count: usize,
    pub vertex_count: usize,
    /// Sum of closed loop areas.
    pub area: f64,
}

/// Standalone validation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyValidation {
    pub is_valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub metrics: TopologyMetrics,
}

impl TopologyValidation {
    /// Error and warning messages for display.
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .map(ToString::to_string)
            .collect()
    }
}

/// Builds the graph for `walls`, traces it and validates the result.
pub fn validate_walls(walls: &[Wall], config: &EngineConfig) -> TopologyValidation {
    let graph = ConnectivityGraph::build(walls, config.snap_tolerance);
    let loops = trace_loops(&graph);
    summarize(walls, &graph, &loops, config)
}

/// Validation report for an already built graph and its traced loops.
pub(crate) fn summarize(
    walls: &[Wall],
    graph: &ConnectivityGraph,
    loops: &[TracedLoop],
    config: &EngineConfig,
) -> TopologyValidation {
    let mut diagnostics = sanitize(walls, graph);
    diagnostics.extend(check_dimensions(walls, config));

    if graph.edge_count() < 3 {
        diagnostics.push(Diagnostic::TooFewWalls {
            count: graph.edge_count(),
        });
    }
    diagnostics.extend(validate_graph(graph));

    let mut area = 0.0;
    for traced in loops.iter().filter(|l| l.polygon.closed) {
        let loop_area = traced.polygon.area();
        if loop_area < config.area_epsilon() {
            diagnostics.push(Diagnostic::ZeroAreaPolygon { area: loop_area });
        }
        area += loop_area;
        diagnostics.extend(
            traced
                .diagnostics
                .iter()
                .filter(|d| matches!(d, Diagnostic::SelfTouchingLoop { .. }))
                .cloned(),
        );
    }

    let (errors, warnings) = partition(diagnostics);
    let is_valid = errors.is_empty();

    if !is_valid {
        tracing::debug!(
            errors = errors.len(),
            warnings = warnings.len(),
            "Wall set failed validation"
        );
    }

    TopologyValidation {
        is_valid,
        errors,
        warnings,
        metrics: TopologyMetrics {
            perimeter: graph.total_length(),
            wall_count: graph.edge_count(),
            vertex_count: graph.vertex_count(),
            area,
        },
    }
}

/// Degree check: one diagnostic per vertex whose degree is not 2.
pub fn validate_graph(graph: &ConnectivityGraph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (index, vertex) in graph.vertices().iter().enumerate() {
        match graph.degree(index) {
            2 => {}
            1 => diagnostics.push(Diagnostic::OpenEdge {
                point: vertex.position,
                wall_id: graph.edge(vertex.edges[0]).wall_id,
            }),
            degree => diagnostics.push(Diagnostic::ComplexJunction {
                point: vertex.position,
                degree,
                wall_ids: graph.incident_walls(index),
            }),
        }
    }
    diagnostics
}

/// Diagnostics for walls the graph builder had to leave out.
pub fn sanitize(walls: &[Wall], graph: &ConnectivityGraph) -> Vec<Diagnostic> {
    graph
        .skipped()
        .iter()
        .map(|&(index, reason)| {
            let wall = &walls[index];
            match reason {
                SkipReason::ZeroLength => Diagnostic::ZeroLengthWall {
                    wall_id: wall.id,
                    length: wall.length(),
                },
                SkipReason::NonFinite => Diagnostic::NonFiniteCoordinate { wall_id: wall.id },
            }
        })
        .collect()
}

/// Length, height and thickness bound checks.
pub fn check_dimensions(walls: &[Wall], config: &EngineConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for wall in walls.iter().filter(|w| w.is_finite()) {
        let checks = [
            (
                Dimension::Length,
                wall.length(),
                0.0,
                config.max_wall_length,
            ),
            (
                Dimension::Height,
                wall.height,
                config.min_wall_height,
                config.max_wall_height,
            ),
            (
                Dimension::Thickness,
                wall.thickness,
                0.0,
                config.max_wall_thickness,
            ),
        ];
        for (dimension, value, min, max) in checks {
            let out_of_range = !value.is_finite() || value < min || value > max;
            // thickness must be strictly positive
            let zero_thickness = dimension == Dimension::Thickness && value <= 0.0;
            if out_of_range || zero_thickness {
                diagnostics.push(Diagnostic::InvalidDimension {
                    wall_id: wall.id,
                    dimension,
                    value,
                    min,
                    max,
                });
            }
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;
    use crate::trace::generate_connected_walls;
    use crate::types::Point;
    use approx::assert_relative_eq;

    fn rectangle() -> Vec<Wall> {
        generate_connected_walls(
            &[
                Point::new(0.0, 0.0),
                Point::new(6.0, 0.0),
                Point::new(6.0, 4.0),
                Point::new(0.0, 4.0),
            ],
            2.7,
            0.15,
        )
    }

    #[test]
    fn closed_rectangle_is_valid() {
        let report = validate_walls(&rectangle(), &EngineConfig::default());
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.metrics.wall_count, 4);
        assert_eq!(report.metrics.vertex_count, 4);
        assert_relative_eq!(report.metrics.perimeter, 20.0, epsilon = 1e-9);
        assert_relative_eq!(report.metrics.area, 24.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_wall_leaves_open_edges() {
        let mut walls = rectangle();
        walls.pop();
        let report = validate_walls(&walls, &EngineConfig::default());
        assert!(!report.is_valid);
        let open = report
            .errors
            .iter()
            .filter(|d| matches!(d, Diagnostic::OpenEdge { .. }))
            .count();
        assert_eq!(open, 2);
        assert!(report
            .messages()
            .iter()
            .any(|m| m.starts_with("open edge at")));
    }

    #[test]
    fn too_few_walls() {
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(1.0, 0.0)),
            Wall::new(2, Point::new(1.0, 0.0), Point::new(1.0, 1.0)),
        ];
        let report = validate_walls(&walls, &EngineConfig::default());
        assert!(!report.is_valid);
        assert!(report
            .errors
            .contains(&Diagnostic::TooFewWalls { count: 2 }));

        let empty = validate_walls(&[], &EngineConfig::default());
        assert!(!empty.is_valid);
        assert_eq!(empty.metrics.vertex_count, 0);
    }

    #[test]
    fn junction_is_warning_only() {
        // two rooms sharing the wall at x = 4
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(4.0, 0.0)),
            Wall::new(2, Point::new(4.0, 0.0), Point::new(8.0, 0.0)),
            Wall::new(3, Point::new(8.0, 0.0), Point::new(8.0, 4.0)),
            Wall::new(4, Point::new(8.0, 4.0), Point::new(4.0, 4.0)),
            Wall::new(5, Point::new(4.0, 4.0), Point::new(0.0, 4.0)),
            Wall::new(6, Point::new(0.0, 4.0), Point::new(0.0, 0.0)),
            Wall::new(7, Point::new(4.0, 0.0), Point::new(4.0, 4.0)),
        ];
        let report = validate_walls(&walls, &EngineConfig::default());
        assert!(report.is_valid);
        let junctions: Vec<_> = report
            .warnings
            .iter()
            .filter_map(|d| match d {
                Diagnostic::ComplexJunction { degree, .. } => Some(*degree),
                _ => None,
            })
            .collect();
        assert_eq!(junctions, vec![3, 3]);
    }

    #[test]
    fn zero_length_wall_is_degenerate_warning() {
        let mut walls = rectangle();
        walls.push(Wall::new(99, Point::new(2.0, 2.0), Point::new(2.0, 2.0)));
        let report = validate_walls(&walls, &EngineConfig::default());
        assert!(report.is_valid);
        let warning = report
            .warnings
            .iter()
            .find(|d| matches!(d, Diagnostic::ZeroLengthWall { .. }))
            .unwrap();
        assert_eq!(warning.kind(), DiagnosticKind::DegenerateGeometry);
    }

    #[test]
    fn dimension_bounds() {
        let config = EngineConfig::default();
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(1.0, 0.0)).with_dimensions(12.0, 0.2),
            Wall::new(2, Point::new(0.0, 0.0), Point::new(1.0, 0.0)).with_dimensions(2.7, 0.0),
            Wall::new(3, Point::new(0.0, 0.0), Point::new(150.0, 0.0)),
        ];
        let diagnostics = check_dimensions(&walls, &config);
        let dims: Vec<Dimension> = diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::InvalidDimension { dimension, .. } => Some(*dimension),
                _ => None,
            })
            .collect();
        assert_eq!(
            dims,
            vec![Dimension::Height, Dimension::Thickness, Dimension::Length]
        );
        assert!(diagnostics.iter().all(|d| !d.is_error()));
    }

    #[test]
    fn collapsed_loop_has_zero_area() {
        // out and back along the same line, plus a third wall on it
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(2.0, 0.0)),
            Wall::new(2, Point::new(2.0, 0.0), Point::new(4.0, 0.0)),
            Wall::new(3, Point::new(4.0, 0.0), Point::new(0.0, 0.0)),
        ];
        let report = validate_walls(&walls, &EngineConfig::default());
        assert!(!report.is_valid);
        assert!(report
            .errors
            .iter()
            .any(|d| matches!(d, Diagnostic::ZeroAreaPolygon { .. })));
    }
}
