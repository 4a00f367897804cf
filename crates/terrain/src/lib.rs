//! Heightmap terrain engine for the island scene.
//!
//! Leaf-first:
//! - [`heightmap`]: decode a raster image into a normalized [`HeightField`]
//! - [`mesh`]: displaced regular-grid [`TerrainMesh`] for the renderer
//! - [`query`]: [`HeightQuery`], world-space elevation over the same field
//! - [`scatter`]: Poisson-disk candidate points over a [`ScatterRegion`]
//! - [`placement`]: elevation-band filtering into [`Placement`] transforms

pub mod error;
pub mod heightmap;
pub mod mesh;
pub mod placement;
pub mod query;
pub mod scatter;
pub mod synth;
pub mod terrain;

pub use error::*;
pub use heightmap::*;
pub use mesh::*;
pub use placement::*;
pub use query::*;
pub use scatter::*;
pub use synth::*;
pub use terrain::*;

// Re-export the math types that appear in public signatures.
pub use glam::{DVec2, DVec3, Mat4};
pub use image::imageops::FilterType;
