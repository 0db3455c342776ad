// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall connectivity graph.
//!
//! Builds an arena-indexed graph from an unordered wall list:
//! - **Vertices** = snapped wall endpoints (one per [`PointKey`])
//! - **Edges** = walls, referring back to their index in the input slice
//!
//! Each vertex keeps the list of incident edge indices, so neighbor lookup
//! during tracing is O(1). The graph is built fresh for every wall set and
//! never mutated afterwards.

use rustc_hash::FxHashMap;

use crate::snap::{PointKey, PointSnapper};
use crate::types::{Point, Wall, WallId};

/// A snapped point and the walls touching it.
#[derive(Debug, Clone)]
pub struct GraphVertex {
    pub key: PointKey,
    /// First-seen position for this key.
    pub position: Point,
    /// Incident edge indices.
    pub edges: Vec<usize>,
}

/// A wall between two distinct vertices.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    /// Index into the wall slice the graph was built from.
    pub wall_index: usize,
    pub wall_id: WallId,
    pub start: usize,
    pub end: usize,
}

impl GraphEdge {
    /// The endpoint opposite `vertex`.
    #[inline]
    pub fn other(&self, vertex: usize) -> usize {
        if self.start == vertex {
            self.end
        } else {
            self.start
        }
    }
}

/// Why a wall was left out of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Both endpoints snap to the same key.
    ZeroLength,
    /// NaN or infinite coordinates.
    NonFinite,
}

/// Adjacency structure over snapped wall endpoints.
#[derive(Debug, Clone)]
pub struct ConnectivityGraph {
    vertices: Vec<GraphVertex>,
    edges: Vec<GraphEdge>,
    key_to_vertex: FxHashMap<PointKey, usize>,
    skipped: Vec<(usize, SkipReason)>,
    tolerance: f64,
}

impl ConnectivityGraph {
    /// Builds the graph for `walls` with snap tolerance `tolerance`.
    ///
    /// Walls with non-finite coordinates or whose endpoints share a key are
    /// recorded in [`skipped`](Self::skipped) instead of becoming edges.
    pub fn build(walls: &[Wall], tolerance: f64) -> Self {
        let mut graph = Self {
            vertices: Vec::new(),
            edges: Vec::with_capacity(walls.len()),
            key_to_vertex: FxHashMap::default(),
            skipped: Vec::new(),
            tolerance,
        };
        let mut snapper = PointSnapper::new(tolerance);

        for (wall_index, wall) in walls.iter().enumerate() {
            if !wall.is_finite() {
                graph.skipped.push((wall_index, SkipReason::NonFinite));
                continue;
            }

            let start_key = snapper.insert(wall.start);
            let end_key = snapper.insert(wall.end);
            if start_key == end_key {
                graph.skipped.push((wall_index, SkipReason::ZeroLength));
                continue;
            }

            let start = graph.vertex_for(start_key, wall.start, &snapper);
            let end = graph.vertex_for(end_key, wall.end, &snapper);

            let edge_index = graph.edges.len();
            graph.edges.push(GraphEdge {
                wall_index,
                wall_id: wall.id,
                start,
                end,
            });
            graph.vertices[start].edges.push(edge_index);
            graph.vertices[end].edges.push(edge_index);
        }

        tracing::debug!(
            walls = walls.len(),
            vertices = graph.vertices.len(),
            edges = graph.edges.len(),
            skipped = graph.skipped.len(),
            "Built connectivity graph"
        );

        graph
    }

    fn vertex_for(&mut self, key: PointKey, point: Point, snapper: &PointSnapper) -> usize {
        if let Some(&index) = self.key_to_vertex.get(&key) {
            return index;
        }
        let index = self.vertices.len();
        let position = snapper.representative(key).unwrap_or(point);
        self.vertices.push(GraphVertex {
            key,
            position,
            edges: Vec::new(),
        });
        self.key_to_vertex.insert(key, index);
        index
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertices(&self) -> &[GraphVertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn vertex(&self, index: usize) -> &GraphVertex {
        &self.vertices[index]
    }

    pub fn edge(&self, index: usize) -> &GraphEdge {
        &self.edges[index]
    }

    /// Vertex index for a key, if any wall touches it.
    pub fn vertex_index(&self, key: PointKey) -> Option<usize> {
        self.key_to_vertex.get(&key).copied()
    }

    /// Number of walls incident to a vertex.
    pub fn degree(&self, vertex: usize) -> usize {
        self.vertices[vertex].edges.len()
    }

    pub fn incident_edges(&self, vertex: usize) -> &[usize] {
        &self.vertices[vertex].edges
    }

    /// Ids of the walls incident to a vertex.
    pub fn incident_walls(&self, vertex: usize) -> Vec<WallId> {
        self.vertices[vertex]
            .edges
            .iter()
            .map(|&e| self.edges[e].wall_id)
            .collect()
    }

    /// Vertex indices of an edge, as `(start, end)`.
    pub fn wall_endpoints(&self, edge: usize) -> (usize, usize) {
        let e = &self.edges[edge];
        (e.start, e.end)
    }

    /// Input walls left out of the graph, as `(wall_index, reason)`.
    pub fn skipped(&self) -> &[(usize, SkipReason)] {
        &self.skipped
    }

    /// Sum of edge lengths, measured between vertex representatives.
    pub fn total_length(&self) -> f64 {
        self.edges
            .iter()
            .map(|e| {
                self.vertices[e.start]
                    .position
                    .distance_to(&self.vertices[e.end].position)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle(w: f64, h: f64) -> Vec<Wall> {
        vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(w, 0.0)),
            Wall::new(2, Point::new(w, 0.0), Point::new(w, h)),
            Wall::new(3, Point::new(w, h), Point::new(0.0, h)),
            Wall::new(4, Point::new(0.0, h), Point::new(0.0, 0.0)),
        ]
    }

    #[test]
    fn rectangle_has_four_degree_two_vertices() {
        let graph = ConnectivityGraph::build(&rectangle(6.0, 4.0), 0.001);
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        for v in 0..graph.vertex_count() {
            assert_eq!(graph.degree(v), 2);
        }
        assert!((graph.total_length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn near_coincident_endpoints_join() {
        let walls = vec![
            Wall::new(1, Point::new(0.0, 0.0), Point::new(2.0, 0.0)),
            Wall::new(2, Point::new(2.0004, 0.0002), Point::new(2.0, 2.0)),
        ];
        let graph = ConnectivityGraph::build(&walls, 0.001);
        assert_eq!(graph.vertex_count(), 3);
        let shared = graph.edge(0).end;
        assert_eq!(graph.edge(1).start, shared);
        assert_eq!(graph.degree(shared), 2);
        // first-seen position wins
        assert_eq!(graph.vertex(shared).position, Point::new(2.0, 0.0));
    }

    #[test]
    fn degenerate_walls_are_skipped() {
        let walls = vec![
            Wall::new(1, Point::new(1.0, 1.0), Point::new(1.0, 1.0)),
            Wall::new(2, Point::new(f64::NAN, 0.0), Point::new(1.0, 0.0)),
            Wall::new(3, Point::new(0.0, 0.0), Point::new(1.0, 0.0)),
        ];
        let graph = ConnectivityGraph::build(&walls, 0.001);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.skipped(),
            &[(0, SkipReason::ZeroLength), (1, SkipReason::NonFinite)]
        );
    }

    #[test]
    fn t_junction_has_degree_three() {
        let mut walls = rectangle(4.0, 4.0);
        walls.push(Wall::new(5, Point::new(2.0, 0.0), Point::new(2.0, 4.0)));
        walls[0] = Wall::new(1, Point::new(0.0, 0.0), Point::new(2.0, 0.0));
        walls.push(Wall::new(6, Point::new(2.0, 0.0), Point::new(4.0, 0.0)));
        let graph = ConnectivityGraph::build(&walls, 0.001);
        let key = PointKey::from_point(&Point::new(2.0, 0.0), 0.001);
        let junction = graph.vertex_index(key).unwrap();
        assert_eq!(graph.degree(junction), 3);
    }
}
