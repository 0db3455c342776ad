// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor plan analysis pipeline.
//!
//! [`FloorplanEngine`] ties the stages together:
//!
//! ```text
//! walls ─► optimize (optional) ─► graph ─► validate ─► trace loops
//!                                                          │
//!            rooms ◄─ classify walls ◄─ nesting ◄─ metrics + triangulation
//! ```
//!
//! Every call is a pure function of the wall list and the configuration;
//! the engine keeps no state between calls.

use serde::{Deserialize, Serialize};

use crate::classify::{classify_walls, ClassifierRoom, WallClassification};
use crate::config::EngineConfig;
use crate::error::{partition, Diagnostic, Result};
use crate::graph::ConnectivityGraph;
use crate::mesh::FloorMesh;
use crate::metrics::{compute_metrics, ShapeMetrics};
use crate::nesting::{detect_parents, NestingCandidate};
use crate::optimize::{optimize_walls, OptimizationStats, OptimizedWalls};
use crate::trace::{trace_loops, TracedLoop};
use crate::triangulate::{triangulate, Triangulation, TriangulationMethod};
use crate::types::{Point, RoomId, Wall, WallId};
use crate::validate::{summarize, TopologyValidation};

/// Everything known about one traced room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAnalysis {
    pub id: RoomId,
    /// Counter-clockwise, without repeating the first vertex.
    pub ordered_vertices: Vec<Point>,
    /// Wall between `ordered_vertices[i]` and the next vertex.
    pub wall_ids: Vec<WallId>,
    pub closed: bool,
    /// Indices into `ordered_vertices`, counter-clockwise on the plan.
    pub triangles: Vec<[usize; 3]>,
    pub triangulation: TriangulationMethod,
    pub mesh: FloorMesh,
    #[serde(flatten)]
    pub metrics: ShapeMetrics,
    pub is_valid: bool,
    pub validation_errors: Vec<Diagnostic>,
    pub validation_warnings: Vec<Diagnostic>,
    pub wall_classifications: Vec<WallClassification>,
    pub parent_room_id: Option<RoomId>,
    /// The room's walls in traversal order.
    #[serde(skip)]
    pub walls: Vec<Wall>,
}

/// Result of [`FloorplanEngine::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorplanAnalysis {
    pub rooms: Vec<RoomAnalysis>,
    pub validation: TopologyValidation,
    /// Display strings for every warning in `validation`.
    pub warnings: Vec<String>,
    /// Present when the segment optimizer ran.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub optimization: Option<OptimizationStats>,
}

impl FloorplanAnalysis {
    pub fn valid_rooms(&self) -> impl Iterator<Item = &RoomAnalysis> {
        self.rooms.iter().filter(|r| r.is_valid)
    }

    pub fn room(&self, id: RoomId) -> Option<&RoomAnalysis> {
        self.rooms.get(id.0)
    }
}

/// Topology and geometry engine for hand-drawn floor plans.
#[derive(Debug, Clone, Default)]
pub struct FloorplanEngine {
    config: EngineConfig,
}

impl FloorplanEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validation report only, without room analysis.
    pub fn validate(&self, walls: &[Wall]) -> TopologyValidation {
        crate::validate::validate_walls(walls, &self.config)
    }

    /// Runs the segment optimizer.
    pub fn optimize(&self, walls: &[Wall]) -> OptimizedWalls {
        optimize_walls(walls, &self.config)
    }

    /// Full analysis: rooms with metrics, triangulation, nesting and wall
    /// classification, plus the validation report.
    pub fn analyze(&self, walls: &[Wall]) -> FloorplanAnalysis {
        let config = &self.config;

        let (walls, optimization) = if config.optimize_segments {
            let optimized = self.optimize(walls);
            (optimized.walls, Some(optimized.stats))
        } else {
            (walls.to_vec(), None)
        };

        let graph = ConnectivityGraph::build(&walls, config.snap_tolerance);
        let loops = trace_loops(&graph);
        let validation = summarize(&walls, &graph, &loops, config);

        let mut rooms: Vec<RoomAnalysis> = loops
            .iter()
            .enumerate()
            .map(|(index, traced)| self.analyze_room(RoomId(index), traced, &walls, &graph))
            .collect();

        let parents = detect_parents(
            &rooms
                .iter()
                .map(|room| NestingCandidate {
                    vertices: &room.ordered_vertices,
                    area: room.metrics.area,
                    is_valid: room.is_valid,
                })
                .collect::<Vec<_>>(),
        );

        let classifications = classify_walls(
            &rooms
                .iter()
                .map(|room| ClassifierRoom {
                    walls: &room.walls,
                    vertices: &room.ordered_vertices,
                    closed: room.closed,
                })
                .collect::<Vec<_>>(),
            config,
        );

        for ((room, parent), classified) in rooms.iter_mut().zip(parents).zip(classifications) {
            room.parent_room_id = parent.map(RoomId);
            room.wall_classifications = classified;
        }

        tracing::debug!(
            walls = walls.len(),
            rooms = rooms.len(),
            valid = rooms.iter().filter(|r| r.is_valid).count(),
            "Analyzed floor plan"
        );

        let warnings = crate::error::messages(&validation.warnings);
        FloorplanAnalysis {
            rooms,
            validation,
            warnings,
            optimization,
        }
    }

    fn analyze_room(
        &self,
        id: RoomId,
        traced: &TracedLoop,
        walls: &[Wall],
        graph: &ConnectivityGraph,
    ) -> RoomAnalysis {
        let polygon = &traced.polygon;
        let room_walls: Vec<Wall> = traced
            .edges
            .iter()
            .map(|&e| walls[graph.edge(e).wall_index].clone())
            .collect();

        let mut diagnostics = traced.diagnostics.clone();

        let distinct = polygon.distinct_vertex_count();
        if distinct < 3 {
            diagnostics.push(Diagnostic::TooFewVertices { count: distinct });
        }

        let metrics = compute_metrics(&polygon.vertices, &room_walls);
        if polygon.closed && metrics.area < self.config.area_epsilon() {
            diagnostics.push(Diagnostic::ZeroAreaPolygon { area: metrics.area });
        }

        for key in &polygon.keys {
            if let Some(vertex) = graph.vertex_index(*key) {
                let degree = graph.degree(vertex);
                if degree > 2 {
                    diagnostics.push(Diagnostic::ComplexJunction {
                        point: graph.vertex(vertex).position,
                        degree,
                        wall_ids: graph.incident_walls(vertex),
                    });
                }
            }
        }

        let (errors, warnings) = partition(diagnostics);
        let is_valid = polygon.closed && errors.is_empty();

        let triangulation = if polygon.closed && polygon.len() >= 3 {
            triangulate(&polygon.vertices)
        } else {
            Triangulation {
                triangles: Vec::new(),
                method: TriangulationMethod::Empty,
            }
        };
        if triangulation.method == TriangulationMethod::FanFallback {
            tracing::warn!(room = %id, "Room triangulated with fan fallback");
        }
        let mesh =
            FloorMesh::from_triangulation(&polygon.vertices, &triangulation, self.config.uv_scale);

        RoomAnalysis {
            id,
            ordered_vertices: polygon.vertices.clone(),
            wall_ids: polygon.wall_ids.clone(),
            closed: polygon.closed,
            triangles: triangulation.triangles,
            triangulation: triangulation.method,
            mesh,
            metrics,
            is_valid,
            validation_errors: errors,
            validation_warnings: warnings,
            wall_classifications: Vec::new(),
            parent_room_id: None,
            walls: room_walls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::generate_connected_walls;
    use approx::assert_relative_eq;

    fn rect(x: f64, z: f64, w: f64, h: f64) -> Vec<Point> {
        vec![
            Point::new(x, z),
            Point::new(x + w, z),
            Point::new(x + w, z + h),
            Point::new(x, z + h),
        ]
    }

    fn with_ids(mut walls: Vec<Wall>, first: u64) -> Vec<Wall> {
        for w in &mut walls {
            w.id = WallId(w.id.0 + first);
        }
        walls
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig {
            snap_tolerance: -1.0,
            ..Default::default()
        };
        assert!(FloorplanEngine::new(config).is_err());
    }

    #[test]
    fn single_rectangle_room() {
        let engine = FloorplanEngine::default();
        let walls = generate_connected_walls(&rect(0.0, 0.0, 6.0, 4.0), 2.7, 0.15);
        let analysis = engine.analyze(&walls);

        assert!(analysis.validation.is_valid);
        assert_eq!(analysis.rooms.len(), 1);
        let room = &analysis.rooms[0];
        assert!(room.is_valid);
        assert!(room.closed);
        assert_eq!(room.id, RoomId(0));
        assert_relative_eq!(room.metrics.area, 24.0, epsilon = 1e-9);
        assert_relative_eq!(room.metrics.perimeter, 20.0, epsilon = 1e-9);
        assert_eq!(room.triangles.len(), 2);
        assert_eq!(room.mesh.triangle_count(), 2);
        assert_eq!(room.wall_classifications.len(), 4);
        assert!(room.wall_classifications.iter().all(|c| !c.is_interior));
        assert_eq!(room.parent_room_id, None);
        assert!(analysis.optimization.is_none());
    }

    #[test]
    fn open_chain_room_is_invalid() {
        let engine = FloorplanEngine::default();
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(4.0, 0.0)),
            Wall::new(2, Point::new(4.0, 0.0), Point::new(4.0, 3.0)),
        ];
        let analysis = engine.analyze(&walls);
        assert!(!analysis.validation.is_valid);
        assert_eq!(analysis.rooms.len(), 1);
        let room = &analysis.rooms[0];
        assert!(!room.is_valid);
        assert!(!room.closed);
        assert!(room.triangles.is_empty());
        assert!(room
            .validation_errors
            .iter()
            .any(|d| matches!(d, Diagnostic::OpenEdge { .. })));
    }

    #[test]
    fn nested_room_gets_parent_and_interior_walls() {
        let engine = FloorplanEngine::default();
        let mut walls = generate_connected_walls(&rect(0.0, 0.0, 10.0, 10.0), 2.7, 0.2);
        walls.extend(with_ids(
            generate_connected_walls(&rect(4.0, 4.0, 2.0, 2.0), 2.7, 0.1),
            100,
        ));
        let analysis = engine.analyze(&walls);
        assert_eq!(analysis.rooms.len(), 2);
        let outer = &analysis.rooms[0];
        let inner = &analysis.rooms[1];
        assert_relative_eq!(outer.metrics.area, 100.0, epsilon = 1e-9);
        assert_eq!(inner.parent_room_id, Some(outer.id));
        assert_eq!(outer.parent_room_id, None);
        assert!(inner.wall_classifications.iter().all(|c| c.is_interior));
        assert!(outer.wall_classifications.iter().all(|c| !c.is_interior));
    }

    #[test]
    fn optimizer_runs_when_enabled() {
        let engine = FloorplanEngine::new(EngineConfig {
            optimize_segments: true,
            ..Default::default()
        })
        .unwrap();
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(2.0, 0.0)),
            Wall::new(2, Point::new(2.0, 0.0), Point::new(4.0, 0.0)),
            Wall::new(3, Point::new(4.0, 0.0), Point::new(4.0, 4.0)),
            Wall::new(4, Point::new(4.0, 4.0), Point::new(0.0, 4.0)),
            Wall::new(5, Point::new(0.0, 4.0), Point::new(0.002, 0.001)),
        ];
        let analysis = engine.analyze(&walls);
        let stats = analysis.optimization.as_ref().unwrap();
        assert_eq!(stats.merged, 1);
        assert_eq!(analysis.rooms.len(), 1);
        assert!(analysis.rooms[0].is_valid);
        assert_eq!(analysis.rooms[0].ordered_vertices.len(), 4);
    }

    #[test]
    fn analysis_serializes_flat_metrics() {
        let engine = FloorplanEngine::default();
        let walls = generate_connected_walls(&rect(0.0, 0.0, 3.0, 3.0), 2.7, 0.15);
        let json = serde_json::to_value(engine.analyze(&walls)).unwrap();
        let room = &json["rooms"][0];
        assert_eq!(room["area"].as_f64().unwrap(), 9.0);
        assert!(room["orderedVertices"].is_array());
        assert!(room["wallClassifications"][0]["isInterior"].is_boolean());
        assert!(room["parentRoomId"].is_null());
        assert!(room.get("walls").is_none());
    }
}
