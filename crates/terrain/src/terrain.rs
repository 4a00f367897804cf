//! Terrain construction: one height field, one mesh, one height query.

use std::sync::Arc;

use image::DynamicImage;

use crate::error::{require_positive, Result, TerrainError};
use crate::heightmap::{HeightField, HeightmapSampler};
use crate::mesh::TerrainMesh;
use crate::placement::{ElevationBand, PlacementFilter, PlacementStyle};
use crate::query::{HeightQuery, HeightSource};

/// Largest subdivision count whose vertex indices still fit in a `u32`.
pub const MAX_SUBDIVISIONS: u32 = 65_534;

/// Configuration for terrain generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainConfig {
    /// Side length of the square terrain in world units.
    pub width: f64,
    /// Grid cells per side; the mesh has `subdivisions + 1` vertices per side.
    pub subdivisions: u32,
    /// World height of a sample with value 1.0.
    pub max_height: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 300.0,
            subdivisions: 128,
            max_height: 30.0,
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("terrain.width", self.width)?;
        require_positive("terrain.max_height", self.max_height)?;
        if self.subdivisions < 1 {
            return Err(TerrainError::config("terrain.subdivisions", "must be at least 1"));
        }
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(TerrainError::config(
                "terrain.subdivisions",
                format!("{} exceeds the u32 index limit of {MAX_SUBDIVISIONS}", self.subdivisions),
            ));
        }
        Ok(())
    }

    /// World X (or Z) of grid line `i`.
    #[inline]
    pub fn grid_coord(&self, i: u32) -> f64 {
        (i as f64 / self.subdivisions as f64) * self.width - self.half_width()
    }

    #[inline]
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }
}

/// A built terrain. The mesh and the height query are both derived from the
/// same shared [`HeightField`], so they cannot diverge.
#[derive(Debug, Clone)]
pub struct Terrain {
    field: Arc<HeightField>,
    config: TerrainConfig,
    mesh: TerrainMesh,
    query: HeightQuery,
}

impl Terrain {
    pub fn new(field: Arc<HeightField>, config: TerrainConfig) -> Result<Self> {
        let mesh = TerrainMesh::build(&field, &config)?;
        let query = HeightQuery::new(Arc::clone(&field), config.width, config.max_height)?;

        log::info!(
            "Terrain ready: {}x{} world units, {} subdivisions, {}x{} heightmap, {} triangles",
            config.width,
            config.width,
            config.subdivisions,
            field.size(),
            field.size(),
            mesh.triangle_count()
        );

        Ok(Self {
            field,
            config,
            mesh,
            query,
        })
    }

    /// Sample `image` at `resolution` and build the terrain on top of it.
    pub fn from_image(image: &DynamicImage, resolution: u32, config: TerrainConfig) -> Result<Self> {
        let field = HeightmapSampler::new(resolution)?.sample(image)?;
        Self::new(Arc::new(field), config)
    }

    pub fn field(&self) -> &Arc<HeightField> {
        &self.field
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn query(&self) -> &HeightQuery {
        &self.query
    }

    /// Filter that centers grid-space candidates on this terrain.
    pub fn placement_filter(&self, band: ElevationBand, style: PlacementStyle) -> PlacementFilter {
        PlacementFilter::new(self.config.half_width(), band, style)
    }
}

impl HeightSource for Terrain {
    fn elevation(&self, x: f64, z: f64) -> f64 {
        self.query.elevation(x, z)
    }
}
