// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor mesh buffers for the rendering layer.

use serde::{Deserialize, Serialize};

use crate::triangulate::Triangulation;
use crate::types::{BoundingBox, Point};

/// Flat, GPU-ready floor mesh lying at `y = 0` and facing up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorMesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Planar texture coordinates (u, v)
    pub uvs: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl FloorMesh {
    /// Builds the mesh for a triangulated room.
    ///
    /// Triangles that are counter-clockwise on the plan face `-Y` in 3D, so
    /// each triangle's winding is flipped to make the floor face `+Y`. UVs
    /// are `(x - min_x, z - min_z) / uv_scale`.
    pub fn from_triangulation(
        vertices: &[Point],
        triangulation: &Triangulation,
        uv_scale: f64,
    ) -> Self {
        if triangulation.is_empty() {
            return Self::default();
        }

        let bbox = BoundingBox::from_points(vertices).unwrap_or_default();
        let scale = if uv_scale > 0.0 { uv_scale } else { 1.0 };

        let mut mesh = FloorMesh {
            positions: Vec::with_capacity(vertices.len() * 3),
            normals: Vec::with_capacity(vertices.len() * 3),
            uvs: Vec::with_capacity(vertices.len() * 2),
            indices: Vec::with_capacity(triangulation.len() * 3),
        };

        for p in vertices {
            mesh.positions
                .extend_from_slice(&[p.x as f32, 0.0, p.z as f32]);
            mesh.normals.extend_from_slice(&[0.0, 1.0, 0.0]);
            mesh.uvs.extend_from_slice(&[
                ((p.x - bbox.min_x) / scale) as f32,
                ((p.z - bbox.min_z) / scale) as f32,
            ]);
        }

        for &[i, j, k] in &triangulation.triangles {
            mesh.indices
                .extend_from_slice(&[i as u32, k as u32, j as u32]);
        }

        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulate::triangulate;

    fn rect() -> Vec<Point> {
        vec![
            Point::new(1.0, 2.0),
            Point::new(5.0, 2.0),
            Point::new(5.0, 4.0),
            Point::new(1.0, 4.0),
        ]
    }

    #[test]
    fn buffers_have_matching_sizes() {
        let vertices = rect();
        let mesh = FloorMesh::from_triangulation(&vertices, &triangulate(&vertices), 1.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.normals.len(), 12);
        assert_eq!(mesh.uvs.len(), 8);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.positions.chunks(3).all(|p| p[1] == 0.0));
        assert!(mesh.normals.chunks(3).all(|n| n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn triangles_face_up() {
        let vertices = rect();
        let mesh = FloorMesh::from_triangulation(&vertices, &triangulate(&vertices), 1.0);
        let pos = |i: u32| {
            let i = i as usize * 3;
            [mesh.positions[i], mesh.positions[i + 1], mesh.positions[i + 2]]
        };
        for tri in mesh.indices.chunks(3) {
            let (a, b, c) = (pos(tri[0]), pos(tri[1]), pos(tri[2]));
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            // y component of e1 x e2
            let ny = e1[2] * e2[0] - e1[0] * e2[2];
            assert!(ny > 0.0);
        }
    }

    #[test]
    fn uvs_start_at_bbox_corner() {
        let vertices = rect();
        let mesh = FloorMesh::from_triangulation(&vertices, &triangulate(&vertices), 2.0);
        assert_eq!(&mesh.uvs[0..2], &[0.0, 0.0]);
        assert_eq!(&mesh.uvs[4..6], &[2.0, 1.0]);
    }

    #[test]
    fn empty_triangulation_gives_empty_mesh() {
        let vertices = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let mesh = FloorMesh::from_triangulation(&vertices, &triangulate(&vertices), 1.0);
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }
}
