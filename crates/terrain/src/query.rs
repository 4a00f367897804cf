//! World-space height queries over a [`HeightField`].

use std::sync::Arc;

use crate::error::{require_positive, Result};
use crate::heightmap::HeightField;

/// Anything that can answer "how high is the ground at `(x, z)`?".
pub trait HeightSource {
    fn elevation(&self, x: f64, z: f64) -> f64;
}

impl<F> HeightSource for F
where
    F: Fn(f64, f64) -> f64,
{
    fn elevation(&self, x: f64, z: f64) -> f64 {
        self(x, z)
    }
}

/// Pure elevation lookup with the same width/height scaling as the mesh.
///
/// Coordinates outside the terrain are clamped to its edge rather than
/// rejected. Repeated queries at one coordinate always return the same bits.
#[derive(Debug, Clone)]
pub struct HeightQuery {
    field: Arc<HeightField>,
    width: f64,
    max_height: f64,
}

impl HeightQuery {
    pub fn new(field: Arc<HeightField>, width: f64, max_height: f64) -> Result<Self> {
        require_positive("terrain.width", width)?;
        require_positive("terrain.max_height", max_height)?;
        Ok(Self {
            field,
            width,
            max_height,
        })
    }

    pub fn field(&self) -> &Arc<HeightField> {
        &self.field
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    /// Interpolated ground height at world `(x, z)`.
    pub fn elevation(&self, x: f64, z: f64) -> f64 {
        let half = self.width / 2.0;
        let u = (x + half) / self.width;
        let v = (z + half) / self.width;
        self.field.sample_bilinear(u, v) * self.max_height
    }

    /// Whether `(x, z)` lies on the terrain's XZ extent (edges included).
    pub fn contains(&self, x: f64, z: f64) -> bool {
        let half = self.width / 2.0;
        (-half..=half).contains(&x) && (-half..=half).contains(&z)
    }
}

impl HeightSource for HeightQuery {
    fn elevation(&self, x: f64, z: f64) -> f64 {
        HeightQuery::elevation(self, x, z)
    }
}
