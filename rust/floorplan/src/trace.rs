// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loop tracing: turns the unordered wall graph into ordered vertex loops.
//!
//! Rooms are the bounded faces of the wall graph. Every wall is walked at
//! most twice, once in each direction, so a divider shared by two rooms
//! lands in both. A walk always takes the sharpest left turn, which keeps
//! the face on its left: bounded faces come out counter-clockwise and the
//! outer boundary of each connected piece comes out clockwise and is
//! dropped.
//!
//! Each walk starts at the vertex with minimum x (then minimum z) among the
//! degree-2 vertices that still have unwalked sides, leaving by the lowest
//! heading. Walls hanging off the rest of the graph (dead ends and the
//! walls leading to them) bound no face; they are traced as open chains,
//! walked in both directions from their start.

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::graph::ConnectivityGraph;
use crate::metrics::signed_area;
use crate::snap::PointKey;
use crate::types::{Point, Wall, WallId};

/// Relative tolerance for comparing turn angles at a junction.
const TURN_EPSILON: f64 = 1e-9;

/// Floor for the zero-area test on traced faces.
const MIN_FACE_AREA: f64 = 1e-12;

/// An ordered vertex loop with the walls between consecutive vertices.
///
/// For a closed loop `wall_ids[i]` joins `vertices[i]` and `vertices[i + 1]`
/// (wrapping), so both lists have the same length. For an open chain there is
/// one more vertex than walls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Polygon {
    pub vertices: Vec<Point>,
    #[serde(skip)]
    pub keys: Vec<PointKey>,
    pub wall_ids: Vec<WallId>,
    pub closed: bool,
}

impl Polygon {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Shoelace sum over the vertex loop; positive when counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Number of distinct vertices, by key.
    pub fn distinct_vertex_count(&self) -> usize {
        let mut keys = self.keys.clone();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// Reverses traversal direction, keeping the first vertex in place for
    /// closed loops.
    fn reverse(&mut self) {
        if self.closed && !self.vertices.is_empty() {
            self.vertices[1..].reverse();
            self.keys[1..].reverse();
        } else {
            self.vertices.reverse();
            self.keys.reverse();
        }
        self.wall_ids.reverse();
    }
}

/// One trace result: the oriented polygon, the graph edges it consumed and
/// any structural problems found on the way.
#[derive(Debug, Clone)]
pub struct TracedLoop {
    pub polygon: Polygon,
    /// Graph edge indices in traversal order (matches `polygon.wall_ids`).
    pub edges: Vec<usize>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Traces every wall of `graph` into loops: closed faces first, then the
/// open chains left over.
pub fn trace_loops(graph: &ConnectivityGraph) -> Vec<TracedLoop> {
    let dangling = dangling_edges(graph);
    let mut loops = trace_faces(graph, &dangling);
    let closed = loops.len();

    let mut visited: Vec<bool> = dangling.iter().map(|&d| !d).collect();
    loop {
        let Some(start) = choose_start(graph, |v| {
            graph.incident_edges(v).iter().any(|&e| !visited[e])
        }) else {
            break;
        };
        loops.push(trace_chain(graph, start, &mut visited));
    }

    tracing::debug!(
        loops = loops.len(),
        closed,
        open = loops.len() - closed,
        "Traced wall loops"
    );

    loops
}

/// Builds the graph for `walls` and traces it.
pub fn trace_walls(walls: &[Wall], tolerance: f64) -> Vec<TracedLoop> {
    trace_loops(&ConnectivityGraph::build(walls, tolerance))
}

/// Builds a closed wall loop through `vertices`, in order.
///
/// Wall ids are assigned `0..n`. Fewer than two vertices produce no walls.
pub fn generate_connected_walls(vertices: &[Point], height: f64, thickness: f64) -> Vec<Wall> {
    let n = vertices.len();
    if n < 2 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            Wall::new(i as u64, vertices[i], vertices[(i + 1) % n])
                .with_dimensions(height, thickness)
        })
        .collect()
}

/// Edges that cannot lie on a cycle: peeled off from degree-1 vertices
/// until none are left.
fn dangling_edges(graph: &ConnectivityGraph) -> Vec<bool> {
    let mut dangling = vec![false; graph.edge_count()];
    let mut degree: Vec<usize> = (0..graph.vertex_count()).map(|v| graph.degree(v)).collect();
    let mut leaves: Vec<usize> = (0..graph.vertex_count())
        .filter(|&v| degree[v] == 1)
        .collect();

    while let Some(leaf) = leaves.pop() {
        let Some(&edge) = graph.incident_edges(leaf).iter().find(|&&e| !dangling[e]) else {
            continue;
        };
        dangling[edge] = true;
        degree[leaf] -= 1;
        let other = graph.edge(edge).other(leaf);
        degree[other] -= 1;
        if degree[other] == 1 {
            leaves.push(other);
        }
    }

    dangling
}

/// One direction of a graph edge: `2 * edge` runs start to end,
/// `2 * edge + 1` end to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HalfEdge(usize);

impl HalfEdge {
    fn leaving(graph: &ConnectivityGraph, edge: usize, vertex: usize) -> Self {
        if graph.edge(edge).start == vertex {
            HalfEdge(2 * edge)
        } else {
            HalfEdge(2 * edge + 1)
        }
    }

    fn edge(self) -> usize {
        self.0 / 2
    }

    fn twin(self) -> Self {
        HalfEdge(self.0 ^ 1)
    }

    fn origin(self, graph: &ConnectivityGraph) -> usize {
        let edge = graph.edge(self.edge());
        if self.0 % 2 == 0 {
            edge.start
        } else {
            edge.end
        }
    }
}

/// Outgoing half-edges around each vertex, counter-clockwise by heading.
struct Rotation {
    around: Vec<Vec<HalfEdge>>,
    /// Position of each half-edge in its origin's list.
    slot: Vec<usize>,
}

impl Rotation {
    fn build(graph: &ConnectivityGraph, dangling: &[bool]) -> Self {
        let around: Vec<Vec<HalfEdge>> = (0..graph.vertex_count())
            .map(|v| {
                let origin = graph.vertex(v).position;
                let mut out: Vec<(HalfEdge, f64, usize)> = graph
                    .incident_edges(v)
                    .iter()
                    .copied()
                    .filter(|&e| !dangling[e])
                    .map(|e| {
                        let far = graph.edge(e).other(v);
                        let d = origin.vector_to(&graph.vertex(far).position);
                        // parallel walls between the same two vertices must
                        // fan out in opposite orders at either end
                        let tie = if v < far { e } else { usize::MAX - e };
                        (HalfEdge::leaving(graph, e, v), d.y.atan2(d.x), tie)
                    })
                    .collect();
                out.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.cmp(&b.2)));
                out.into_iter().map(|(h, ..)| h).collect()
            })
            .collect();

        let mut slot = vec![0; graph.edge_count() * 2];
        for list in &around {
            for (i, h) in list.iter().enumerate() {
                slot[h.0] = i;
            }
        }
        Self { around, slot }
    }

    /// Half-edge to continue with after walking `h`: the sharpest left turn
    /// at its far end, i.e. the next outgoing half-edge clockwise from the
    /// way back.
    fn next(&self, graph: &ConnectivityGraph, h: HalfEdge) -> HalfEdge {
        let back = h.twin();
        let list = &self.around[back.origin(graph)];
        list[(self.slot[back.0] + list.len() - 1) % list.len()]
    }
}

/// Walks every face of the non-dangling part of `graph` and keeps the
/// bounded ones.
fn trace_faces(graph: &ConnectivityGraph, dangling: &[bool]) -> Vec<TracedLoop> {
    let rotation = Rotation::build(graph, dangling);
    let mut walked = vec![false; graph.edge_count() * 2];
    let area_epsilon = (graph.tolerance() * graph.tolerance()).max(MIN_FACE_AREA);
    let mut degenerate: Vec<Vec<usize>> = Vec::new();
    let mut faces = Vec::new();

    loop {
        let Some(start) = choose_start(graph, |v| {
            rotation.around[v].iter().any(|h| !walked[h.0])
        }) else {
            break;
        };
        // lists are sorted by heading, so this is the lowest unwalked one
        let Some(first) = rotation.around[start].iter().copied().find(|h| !walked[h.0]) else {
            break;
        };

        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        let mut h = first;
        loop {
            walked[h.0] = true;
            vertices.push(h.origin(graph));
            edges.push(h.edge());
            h = rotation.next(graph, h);
            if h == first {
                break;
            }
        }

        let positions: Vec<Point> = vertices.iter().map(|&v| graph.vertex(v).position).collect();
        let area = signed_area(&positions);
        if area < -area_epsilon {
            tracing::trace!(walls = edges.len(), "Skipping outer boundary");
            continue;
        }
        if area <= area_epsilon {
            // both sides of a collapsed loop enclose nothing; report it once
            let mut distinct = vertices.clone();
            distinct.sort_unstable();
            distinct.dedup();
            let mut walls = edges.clone();
            walls.sort_unstable();
            walls.dedup();
            if distinct.len() < 3 || degenerate.contains(&walls) {
                continue;
            }
            degenerate.push(walls);
        }

        faces.push(build_loop(graph, vertices, edges, true));
    }

    faces
}

/// Minimum (x, z) key among vertices accepted by `has_work`, preferring
/// degree-2 vertices.
fn choose_start(graph: &ConnectivityGraph, has_work: impl Fn(usize) -> bool) -> Option<usize> {
    let lowest = |prefer_degree_two: bool| {
        (0..graph.vertex_count())
            .filter(|&v| has_work(v))
            .filter(|&v| !prefer_degree_two || graph.degree(v) == 2)
            .min_by_key(|&v| {
                let key = graph.vertex(v).key;
                (key.x, key.z)
            })
    };

    lowest(true).or_else(|| lowest(false))
}

/// Traces an open chain through unvisited edges, both ways from `start`.
fn trace_chain(graph: &ConnectivityGraph, start: usize, visited: &mut [bool]) -> TracedLoop {
    let mut vertices = vec![start];
    let mut edges = Vec::new();

    if let Some(first) = first_edge(graph, start, visited) {
        visited[first] = true;
        edges.push(first);
        let mut previous = start;
        let mut current = graph.edge(first).other(start);

        while current != start {
            vertices.push(current);
            match next_edge(graph, previous, current, edges[edges.len() - 1], visited) {
                Some(edge) => {
                    visited[edge] = true;
                    edges.push(edge);
                    previous = current;
                    current = graph.edge(edge).other(current);
                }
                None => break,
            }
        }
    }

    extend_backward(graph, start, &mut vertices, &mut edges, visited);
    build_loop(graph, vertices, edges, false)
}

/// Unvisited edge at `start` with the lowest heading.
fn first_edge(graph: &ConnectivityGraph, start: usize, visited: &[bool]) -> Option<usize> {
    let origin = graph.vertex(start).position;
    graph
        .incident_edges(start)
        .iter()
        .copied()
        .filter(|&e| !visited[e])
        .map(|e| {
            let far = graph.vertex(graph.edge(e).other(start)).position;
            let d = origin.vector_to(&far);
            (e, d.y.atan2(d.x))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(e, _)| e)
}

/// Picks the wall to leave `current` by, having arrived from `previous`
/// along `incoming`.
fn next_edge(
    graph: &ConnectivityGraph,
    previous: usize,
    current: usize,
    incoming: usize,
    visited: &[bool],
) -> Option<usize> {
    let here = graph.vertex(current).position;
    let d_in = graph.vertex(previous).position.vector_to(&here);

    graph
        .incident_edges(current)
        .iter()
        .copied()
        .filter(|&e| e != incoming && !visited[e])
        // never walk straight back to where we came from
        .filter(|&e| graph.edge(e).other(current) != previous)
        .map(|e| {
            let far = graph.vertex(graph.edge(e).other(current)).position;
            let d_out = here.vector_to(&far);
            let cross = d_in.x * d_out.y - d_in.y * d_out.x;
            let dot = d_in.dot(&d_out);
            (e, cross.atan2(dot))
        })
        .max_by(|a, b| {
            if (a.1 - b.1).abs() <= TURN_EPSILON {
                // lower edge index wins ties
                b.0.cmp(&a.0)
            } else {
                a.1.total_cmp(&b.1)
            }
        })
        .map(|(e, _)| e)
}

/// Walks from `start` in the other direction and prepends that chain.
fn extend_backward(
    graph: &ConnectivityGraph,
    start: usize,
    vertices: &mut Vec<usize>,
    edges: &mut Vec<usize>,
    visited: &mut [bool],
) {
    let mut back_vertices = Vec::new();
    let mut back_edges = Vec::new();

    // Pretend we arrived at `start` from the first forward vertex, so the
    // turn rule continues the chain straight through it.
    let mut previous = vertices.get(1).copied();
    let mut incoming = edges.first().copied();
    let mut current = start;

    loop {
        let next = match (previous, incoming) {
            (Some(p), Some(e)) => next_edge(graph, p, current, e, visited),
            _ => first_edge(graph, current, visited),
        };
        let Some(edge) = next else { break };
        visited[edge] = true;
        back_edges.push(edge);
        let far = graph.edge(edge).other(current);
        if far == start {
            break;
        }
        back_vertices.push(far);
        previous = Some(current);
        incoming = Some(edge);
        current = far;
    }

    if back_edges.is_empty() {
        return;
    }

    back_vertices.reverse();
    back_edges.reverse();
    back_vertices.append(vertices);
    back_edges.append(edges);
    *vertices = back_vertices;
    *edges = back_edges;
}

fn build_loop(
    graph: &ConnectivityGraph,
    vertex_indices: Vec<usize>,
    mut edges: Vec<usize>,
    closed: bool,
) -> TracedLoop {
    let mut diagnostics = Vec::new();
    if !closed {
        tracing::warn!(
            walls = edges.len(),
            "Wall chain does not close into a loop"
        );
        if let (Some(&first), Some(&last)) = (vertex_indices.first(), vertex_indices.last()) {
            diagnostics.push(Diagnostic::UnclosedChain {
                start: graph.vertex(first).position,
                end: graph.vertex(last).position,
                walls: edges.len(),
            });
        }
        let ends = [
            (vertex_indices.first(), edges.first()),
            (vertex_indices.last(), edges.last()),
        ];
        for (vertex, edge) in ends {
            if let (Some(&vertex), Some(&edge)) = (vertex, edge) {
                if graph.degree(vertex) == 1 {
                    diagnostics.push(Diagnostic::OpenEdge {
                        point: graph.vertex(vertex).position,
                        wall_id: graph.edge(edge).wall_id,
                    });
                }
            }
        }
    }

    let mut polygon = Polygon {
        vertices: vertex_indices
            .iter()
            .map(|&v| graph.vertex(v).position)
            .collect(),
        keys: vertex_indices.iter().map(|&v| graph.vertex(v).key).collect(),
        wall_ids: edges.iter().map(|&e| graph.edge(e).wall_id).collect(),
        closed,
    };
    if polygon.signed_area() < 0.0 {
        polygon.reverse();
        edges.reverse();
    }

    if closed {
        let mut seen = polygon.keys.clone();
        seen.sort_unstable();
        for pair in seen.windows(2) {
            if pair[0] == pair[1] {
                if let Some(i) = polygon.keys.iter().position(|k| *k == pair[0]) {
                    diagnostics.push(Diagnostic::SelfTouchingLoop {
                        point: polygon.vertices[i],
                    });
                }
            }
        }
    }

    TracedLoop {
        polygon,
        edges,
        diagnostics,
    }
}
