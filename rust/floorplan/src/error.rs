// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostics and error types.
//!
//! Malformed wall input never aborts the engine. Every problem found while
//! analyzing a wall set becomes a [`Diagnostic`] attached to the result; the
//! caller decides whether an invalid room blocks further action. The only
//! hard error is an unusable configuration ([`ConfigError`]).

use serde::{Deserialize, Serialize};

use crate::types::{Point, WallId};

/// Result type alias for configuration handling.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Broken connectivity: open edges, branching junctions, unclosed loops.
    StructuralError,
    /// Zero-length walls, zero-area polygons, non-finite coordinates.
    DegenerateGeometry,
    /// Wall length/height/thickness outside the configured bounds.
    InvalidDimension,
}

/// Whether a diagnostic invalidates the room it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Which wall dimension a bound check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Length,
    Height,
    Thickness,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Dimension::Length => "length",
            Dimension::Height => "height",
            Dimension::Thickness => "thickness",
        })
    }
}

/// A problem found in a wall set, with enough context to highlight it.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Diagnostic {
    /// A vertex touched by exactly one wall.
    #[error("open edge at ({:.3}, {:.3}): {wall_id} is not connected at this end", .point.x, .point.z)]
    OpenEdge { point: Point, wall_id: WallId },

    /// A vertex touched by more than two walls.
    #[error("complex junction at ({:.3}, {:.3}): {degree} walls meet", .point.x, .point.z)]
    ComplexJunction {
        point: Point,
        degree: usize,
        wall_ids: Vec<WallId>,
    },

    /// A closed loop passes through the same vertex more than once.
    #[error("loop touches itself at ({:.3}, {:.3})", .point.x, .point.z)]
    SelfTouchingLoop { point: Point },

    /// A wall chain that ends without returning to where it started.
    #[error(
        "chain of {walls} walls from ({:.3}, {:.3}) to ({:.3}, {:.3}) does not close",
        .start.x, .start.z, .end.x, .end.z
    )]
    UnclosedChain { start: Point, end: Point, walls: usize },

    /// Not enough walls to enclose any area.
    #[error("at least 3 walls are needed to enclose a room, found {count}")]
    TooFewWalls { count: usize },

    /// A wall whose endpoints coincide after snapping.
    #[error("{wall_id} has zero length ({length:.4} m) and was ignored")]
    ZeroLengthWall { wall_id: WallId, length: f64 },

    /// A wall with NaN or infinite coordinates.
    #[error("{wall_id} has non-finite coordinates and was ignored")]
    NonFiniteCoordinate { wall_id: WallId },

    /// A traced loop whose enclosed area is effectively zero.
    #[error("polygon encloses no area ({area:.6} m²)")]
    ZeroAreaPolygon { area: f64 },

    /// A traced loop with fewer than three distinct vertices.
    #[error("polygon has only {count} distinct vertices")]
    TooFewVertices { count: usize },

    /// A wall dimension outside the configured bounds.
    #[error("{wall_id} {dimension} {value:.3} m is outside [{min:.3}, {max:.3}]")]
    InvalidDimension {
        wall_id: WallId,
        dimension: Dimension,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Diagnostic::OpenEdge { .. }
            | Diagnostic::ComplexJunction { .. }
            | Diagnostic::SelfTouchingLoop { .. }
            | Diagnostic::UnclosedChain { .. }
            | Diagnostic::TooFewWalls { .. } => DiagnosticKind::StructuralError,
            Diagnostic::ZeroLengthWall { .. }
            | Diagnostic::NonFiniteCoordinate { .. }
            | Diagnostic::ZeroAreaPolygon { .. }
            | Diagnostic::TooFewVertices { .. } => DiagnosticKind::DegenerateGeometry,
            Diagnostic::InvalidDimension { .. } => DiagnosticKind::InvalidDimension,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::OpenEdge { .. }
            | Diagnostic::UnclosedChain { .. }
            | Diagnostic::TooFewWalls { .. }
            | Diagnostic::ZeroAreaPolygon { .. }
            | Diagnostic::TooFewVertices { .. } => Severity::Error,
            Diagnostic::ComplexJunction { .. }
            | Diagnostic::SelfTouchingLoop { .. }
            | Diagnostic::ZeroLengthWall { .. }
            | Diagnostic::NonFiniteCoordinate { .. }
            | Diagnostic::InvalidDimension { .. } => Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

/// Splits diagnostics into `(errors, warnings)`.
pub fn partition(diagnostics: Vec<Diagnostic>) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
    diagnostics.into_iter().partition(Diagnostic::is_error)
}

/// Human-readable rendering for UI display.
pub fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(ToString::to_string).collect()
}

/// Errors raised for an unusable engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A tolerance or length that must be strictly positive.
    #[error("{name} must be a positive finite number, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    /// A lower bound above its upper bound.
    #[error("{name}: minimum {min} exceeds maximum {max}")]
    InvertedRange {
        name: &'static str,
        min: f64,
        max: f64,
    },

    /// Cluster tolerance below the snap tolerance would un-merge snapped points.
    #[error("clusterTolerance ({cluster}) must be at least snapTolerance ({snap})")]
    ClusterBelowSnap { cluster: f64, snap: f64 },

    /// An environment override that failed to parse.
    #[error("environment variable {name}: cannot parse {value:?} as a number")]
    InvalidEnv { name: &'static str, value: String },

    /// Malformed JSON configuration.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_edge_is_structural_error() {
        let d = Diagnostic::OpenEdge {
            point: Point::new(1.0, 2.0),
            wall_id: WallId(3),
        };
        assert_eq!(d.kind(), DiagnosticKind::StructuralError);
        assert!(d.is_error());
        assert_eq!(
            d.to_string(),
            "open edge at (1.000, 2.000): wall#3 is not connected at this end"
        );
    }

    #[test]
    fn unclosed_chain_is_structural_error() {
        let d = Diagnostic::UnclosedChain {
            start: Point::new(-2.0, 0.0),
            end: Point::new(0.0, 0.0),
            walls: 1,
        };
        assert_eq!(d.kind(), DiagnosticKind::StructuralError);
        assert!(d.is_error());
        assert_eq!(
            d.to_string(),
            "chain of 1 walls from (-2.000, 0.000) to (0.000, 0.000) does not close"
        );
    }

    #[test]
    fn zero_length_is_degenerate_warning() {
        let d = Diagnostic::ZeroLengthWall {
            wall_id: WallId(9),
            length: 0.0,
        };
        assert_eq!(d.kind(), DiagnosticKind::DegenerateGeometry);
        assert_eq!(d.severity(), Severity::Warning);
    }

    #[test]
    fn diagnostics_serialize_with_kind_tag() {
        let d = Diagnostic::TooFewWalls { count: 2 };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "tooFewWalls");
        assert_eq!(json["count"], 2);
    }

    #[test]
    fn partition_splits_by_severity() {
        let (errors, warnings) = partition(vec![
            Diagnostic::TooFewWalls { count: 1 },
            Diagnostic::SelfTouchingLoop {
                point: Point::new(0.0, 0.0),
            },
        ]);
        assert_eq!(errors.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert_eq!(messages(&errors).len(), 1);
    }
}
