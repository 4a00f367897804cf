//! Displaced regular-grid terrain mesh.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::Result;
use crate::heightmap::HeightField;
use crate::terrain::TerrainConfig;

/// Vertex for the terrain mesh, laid out for direct GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Grid of `(subdivisions + 1)²` vertices and `2 · subdivisions²` triangles
/// spanning `width × width` around the origin in the XZ-plane.
///
/// Vertex `(i, j)` sits at index `j * (subdivisions + 1) + i`; `i` walks +X and
/// `j` walks +Z. Built once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
    subdivisions: u32,
}

impl TerrainMesh {
    /// Displace a grid by `field`, sampled bilinearly at `(i / s, j / s)`.
    pub fn build(field: &HeightField, config: &TerrainConfig) -> Result<Self> {
        config.validate()?;

        let subdivisions = config.subdivisions;
        let side = subdivisions as usize + 1;
        let s = subdivisions as f64;

        let mut vertices = Vec::with_capacity(side * side);
        for j in 0..=subdivisions {
            for i in 0..=subdivisions {
                let u = i as f64 / s;
                let v = j as f64 / s;
                let y = field.sample_bilinear(u, v) * config.max_height;
                vertices.push(TerrainVertex {
                    position: [config.grid_coord(i) as f32, y as f32, config.grid_coord(j) as f32],
                    normal: [0.0, 1.0, 0.0],
                    uv: [u as f32, v as f32],
                });
            }
        }

        // Every cell is split along the same (i, j+1)–(i+1, j) diagonal.
        let mut indices = Vec::with_capacity(subdivisions as usize * subdivisions as usize * 6);
        for j in 0..subdivisions {
            for i in 0..subdivisions {
                let top_left = j * (subdivisions + 1) + i;
                let top_right = top_left + 1;
                let bottom_left = top_left + subdivisions + 1;
                let bottom_right = bottom_left + 1;

                indices.extend([top_left, bottom_left, top_right]);
                indices.extend([top_right, bottom_left, bottom_right]);
            }
        }

        calculate_normals(&mut vertices, &indices);

        log::debug!(
            "Built terrain mesh: {} vertices, {} triangles, width {}, max height {}",
            vertices.len(),
            indices.len() / 3,
            config.width,
            config.max_height
        );

        Ok(Self {
            vertices,
            indices,
            subdivisions,
        })
    }

    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Index into [`Self::vertices`] for grid coordinates `(i, j)`.
    #[inline]
    pub fn vertex_index(&self, i: u32, j: u32) -> usize {
        (j * (self.subdivisions + 1) + i) as usize
    }

    pub fn vertex(&self, i: u32, j: u32) -> &TerrainVertex {
        &self.vertices[self.vertex_index(i, j)]
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Area-weighted vertex normals: unnormalized face normals (whose length is
/// twice the triangle area) are summed per vertex, then normalized.
fn calculate_normals(vertices: &mut [TerrainVertex], indices: &[u32]) {
    let mut normals = vec![Vec3::ZERO; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let v0: Vec3 = vertices[a].position.into();
        let v1: Vec3 = vertices[b].position.into();
        let v2: Vec3 = vertices[c].position.into();

        let mut face = (v1 - v0).cross(v2 - v0);
        if face.y < 0.0 {
            face = -face;
        }
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    for (vertex, n) in vertices.iter_mut().zip(normals) {
        let n = n.try_normalize().unwrap_or(Vec3::Y);
        vertex.normal = n.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: f64, subdivisions: u32, max_height: f64) -> TerrainConfig {
        TerrainConfig {
            width,
            subdivisions,
            max_height,
        }
    }

    #[test]
    fn flat_field_yields_flat_plane() {
        let field = HeightField::flat(129, 0.0).unwrap();
        let mesh = TerrainMesh::build(&field, &config(300.0, 128, 30.0)).unwrap();

        assert_eq!(mesh.vertex_count(), 129 * 129);
        assert_eq!(mesh.triangle_count(), 32768);
        for v in &mesh.vertices {
            assert_eq!(v.position[1], 0.0);
            assert!((v.normal[1] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn grid_spans_width_centered_on_origin() {
        let field = HeightField::flat(2, 0.5).unwrap();
        let mesh = TerrainMesh::build(&field, &config(10.0, 4, 2.0)).unwrap();

        assert_eq!(mesh.vertex(0, 0).position, [-5.0, 1.0, -5.0]);
        assert_eq!(mesh.vertex(4, 4).position, [5.0, 1.0, 5.0]);
        assert_eq!(mesh.vertex(2, 0).position[0], 0.0);
        assert_eq!(mesh.vertex(4, 0).uv, [1.0, 0.0]);
        assert_eq!(mesh.vertex(0, 4).uv, [0.0, 1.0]);
    }

    #[test]
    fn heights_follow_field() {
        // Column 0 low, column 1 high: height rises along +X.
        let field = HeightField::from_samples(2, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        let mesh = TerrainMesh::build(&field, &config(8.0, 2, 4.0)).unwrap();

        assert_eq!(mesh.vertex(0, 1).position[1], 0.0);
        assert_eq!(mesh.vertex(1, 1).position[1], 2.0);
        assert_eq!(mesh.vertex(2, 1).position[1], 4.0);
    }

    #[test]
    fn normals_lean_away_from_slope() {
        let field = HeightField::from_samples(2, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        let mesh = TerrainMesh::build(&field, &config(8.0, 2, 4.0)).unwrap();

        let n = Vec3::from(mesh.vertex(1, 1).normal);
        assert!(n.y > 0.0);
        assert!(n.x < 0.0, "surface rising toward +X should tilt its normal toward -X");
        assert!(n.z.abs() < 1e-6);
        assert!((n.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn triangles_wind_upward() {
        let field = HeightField::flat(3, 0.2).unwrap();
        let mesh = TerrainMesh::build(&field, &config(6.0, 3, 1.0)).unwrap();

        for tri in mesh.indices.chunks_exact(3) {
            let a = Vec3::from(mesh.vertices[tri[0] as usize].position);
            let b = Vec3::from(mesh.vertices[tri[1] as usize].position);
            let c = Vec3::from(mesh.vertices[tri[2] as usize].position);
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn rebuild_is_deterministic() {
        let samples: Vec<f32> = (0..25).map(|i| (i as f32 * 0.37).fract()).collect();
        let field = HeightField::from_samples(5, samples).unwrap();
        let cfg = config(50.0, 16, 12.0);

        let a = TerrainMesh::build(&field, &cfg).unwrap();
        let b = TerrainMesh::build(&field, &cfg).unwrap();
        assert_eq!(a.indices, b.indices);
        assert_eq!(a.vertices, b.vertices);
    }

    #[test]
    fn rejects_zero_subdivisions() {
        let field = HeightField::flat(2, 0.0).unwrap();
        assert!(TerrainMesh::build(&field, &config(10.0, 0, 1.0)).is_err());
    }

    #[test]
    fn field_resolution_independent_of_mesh_density() {
        let field = HeightField::flat(7, 0.5).unwrap();
        let mesh = TerrainMesh::build(&field, &config(10.0, 32, 2.0)).unwrap();
        assert!(mesh.vertices.iter().all(|v| (v.position[1] - 1.0).abs() < 1e-6));
    }
}
