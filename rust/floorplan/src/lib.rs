// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor plan topology and geometry engine
//!
//! Takes an unordered set of hand-drawn walls (2D segments on the `x`/`z`
//! floor plane) and:
//! 1. Snaps near-coincident endpoints onto a tolerance grid
//! 2. Builds a wall connectivity graph and checks vertex degrees
//! 3. Traces ordered, counter-clockwise room loops
//! 4. Computes shape metrics (area, perimeter, compactness, convexity, ...)
//! 5. Detects rooms nested inside other rooms
//! 6. Classifies walls as interior or exterior
//! 7. Triangulates each room into a floor mesh
//!
//! Malformed input never panics or aborts; problems come back as typed
//! [`Diagnostic`]s attached to the result.
//!
//! # Usage
//!
//! ```rust
//! use floorplan_topology::{generate_connected_walls, FloorplanEngine, Point};
//!
//! let walls = generate_connected_walls(
//!     &[
//!         Point::new(0.0, 0.0),
//!         Point::new(6.0, 0.0),
//!         Point::new(6.0, 4.0),
//!         Point::new(0.0, 4.0),
//!     ],
//!     2.7,
//!     0.15,
//! );
//!
//! let analysis = FloorplanEngine::default().analyze(&walls);
//! assert!(analysis.validation.is_valid);
//! assert_eq!(analysis.rooms.len(), 1);
//! assert!((analysis.rooms[0].metrics.area - 24.0).abs() < 1e-9);
//! ```

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod mesh;
pub mod metrics;
pub mod nesting;
pub mod optimize;
pub mod snap;
pub mod trace;
pub mod triangulate;
pub mod types;
pub mod validate;

// Re-export commonly used types and functions
pub use classify::{classify_walls, WallClassification, WallType};
pub use config::EngineConfig;
pub use engine::{FloorplanAnalysis, FloorplanEngine, RoomAnalysis};
pub use error::{ConfigError, Diagnostic, DiagnosticKind, Dimension, Result, Severity};
pub use graph::ConnectivityGraph;
pub use mesh::FloorMesh;
pub use metrics::{compute_metrics, ShapeMetrics};
pub use nesting::{detect_parents, point_in_polygon};
pub use optimize::{optimize_walls, OptimizationStats, OptimizedWalls};
pub use snap::{PointKey, PointSnapper};
pub use trace::{generate_connected_walls, trace_loops, Polygon, TracedLoop};
pub use triangulate::{triangulate, Triangulation, TriangulationMethod};
pub use types::{BoundingBox, Point, RoomId, Wall, WallId};
pub use validate::{validate_walls, TopologyMetrics, TopologyValidation};
