// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration.
//!
//! One tolerance set is threaded through every stage of the pipeline. The
//! struct deserializes from the camelCase JSON bundle the drawing layer
//! sends, and every field falls back to its default when omitted.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Configuration for topology analysis, optimization and wall classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Grid size for point identity (meters). Default: 0.001 (1mm)
    pub snap_tolerance: f64,
    /// Endpoint clustering radius used by the segment optimizer (meters).
    /// Must be >= `snap_tolerance`. Default: 0.005 (5mm)
    pub cluster_tolerance: f64,
    /// Walls shorter than this are dropped by the optimizer (meters).
    /// Default: 0.05 (5cm)
    pub min_wall_length: f64,
    /// Walls longer than this are reported as invalid dimensions (meters).
    /// Default: 100.0
    pub max_wall_length: f64,
    /// Angle below which two walls count as collinear/axis-aligned (degrees).
    /// Default: 1.0
    pub angle_snap_tolerance_degrees: f64,
    /// Thickness assigned to interior walls (meters). Default: 0.1
    pub interior_thickness: f64,
    /// Thickness assigned to exterior walls (meters). Default: 0.2
    pub exterior_thickness: f64,
    /// Max perpendicular offset for two walls to count as the same wall
    /// when classifying (meters). Default: 0.25
    pub coincidence_tolerance: f64,
    /// Accepted wall height range (meters). Default: 0.1 ..= 10.0
    pub min_wall_height: f64,
    pub max_wall_height: f64,
    /// Maximum accepted wall thickness (meters). Default: 1.0
    pub max_wall_thickness: f64,
    /// Straighten near-axis walls before clustering. Default: false
    pub axis_snap: bool,
    /// Run the segment optimizer before tracing rooms. Default: false
    pub optimize_segments: bool,
    /// Upper bound on optimizer fixpoint iterations. Default: 16
    pub max_optimizer_passes: usize,
    /// Meters per UV unit for floor mesh texture mapping. Default: 1.0
    pub uv_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 0.001,
            cluster_tolerance: 0.005,
            min_wall_length: 0.05,
            max_wall_length: 100.0,
            angle_snap_tolerance_degrees: 1.0,
            interior_thickness: 0.1,
            exterior_thickness: 0.2,
            coincidence_tolerance: 0.25,
            min_wall_height: 0.1,
            max_wall_height: 10.0,
            max_wall_thickness: 1.0,
            axis_snap: false,
            optimize_segments: false,
            max_optimizer_passes: 16,
            uv_scale: 1.0,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON configuration bundle and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with `FLOORPLAN_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Applies `FLOORPLAN_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        override_f64("FLOORPLAN_SNAP_TOLERANCE", &mut self.snap_tolerance)?;
        override_f64("FLOORPLAN_CLUSTER_TOLERANCE", &mut self.cluster_tolerance)?;
        override_f64("FLOORPLAN_MIN_WALL_LENGTH", &mut self.min_wall_length)?;
        override_f64(
            "FLOORPLAN_ANGLE_SNAP_TOLERANCE_DEGREES",
            &mut self.angle_snap_tolerance_degrees,
        )?;
        override_f64("FLOORPLAN_INTERIOR_THICKNESS", &mut self.interior_thickness)?;
        override_f64("FLOORPLAN_EXTERIOR_THICKNESS", &mut self.exterior_thickness)?;
        self.validate()?;
        Ok(self)
    }

    /// Checks that tolerances are positive and ranges are ordered.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("snapTolerance", self.snap_tolerance),
            ("clusterTolerance", self.cluster_tolerance),
            ("minWallLength", self.min_wall_length),
            ("maxWallLength", self.max_wall_length),
            ("angleSnapToleranceDegrees", self.angle_snap_tolerance_degrees),
            ("interiorThickness", self.interior_thickness),
            ("exteriorThickness", self.exterior_thickness),
            ("coincidenceTolerance", self.coincidence_tolerance),
            ("maxWallHeight", self.max_wall_height),
            ("maxWallThickness", self.max_wall_thickness),
            ("uvScale", self.uv_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        if self.cluster_tolerance < self.snap_tolerance {
            return Err(ConfigError::ClusterBelowSnap {
                cluster: self.cluster_tolerance,
                snap: self.snap_tolerance,
            });
        }
        if !(self.min_wall_height >= 0.0) || self.min_wall_height > self.max_wall_height {
            return Err(ConfigError::InvertedRange {
                name: "wallHeight",
                min: self.min_wall_height,
                max: self.max_wall_height,
            });
        }
        if self.min_wall_length > self.max_wall_length {
            return Err(ConfigError::InvertedRange {
                name: "wallLength",
                min: self.min_wall_length,
                max: self.max_wall_length,
            });
        }
        Ok(())
    }

    /// Angle tolerance in radians.
    pub fn angle_tolerance(&self) -> f64 {
        self.angle_snap_tolerance_degrees.to_radians()
    }

    /// Area below which a polygon counts as degenerate.
    ///
    /// Scales with the snap grid so a loop collapsed onto one grid line is
    /// caught regardless of tolerance.
    pub fn area_epsilon(&self) -> f64 {
        (self.snap_tolerance * self.snap_tolerance).max(1e-12)
    }
}

fn override_f64(name: &'static str, target: &mut f64) -> Result<()> {
    if let Ok(raw) = std::env::var(name) {
        *target = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name,
            value: raw.clone(),
        })?;
    }
    Ok(())
}
