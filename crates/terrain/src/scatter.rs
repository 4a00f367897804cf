//! Poisson-disk scattering of candidate points over a rectangular grid region.
//!
//! Classic active-list growth: start from one random point, repeatedly pick a
//! random active point and try up to `tries` candidates in the annulus
//! `[min_distance, max_distance]` around it. A candidate survives if it lies in
//! the region and no existing point is closer than `min_distance`. An active
//! point that exhausts its tries is retired. Every iteration either adds a
//! point or retires one, and the region can only hold finitely many points,
//! so the fill always terminates.

use std::f64::consts::{SQRT_2, TAU};

use glam::DVec2;
use rand::Rng;

use crate::error::{require_finite, require_positive, Result, TerrainError};

/// Upper bound on acceleration-grid cells for a single fill.
const MAX_GRID_CELLS: usize = 1 << 24;

/// Grid-space domain plus spacing parameters for one scatter pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterRegion {
    width: f64,
    height: f64,
    min_distance: f64,
    max_distance: f64,
    tries: u32,
}

impl ScatterRegion {
    /// `[width, height]` in grid units. `tries` is the number of candidates
    /// attempted around an active point before it is retired.
    pub fn new(
        width: f64,
        height: f64,
        min_distance: f64,
        max_distance: f64,
        tries: u32,
    ) -> Result<Self> {
        require_positive("scatter.grid.width", width)?;
        require_positive("scatter.grid.height", height)?;
        require_positive("scatter.min_distance", min_distance)?;
        require_finite("scatter.max_distance", max_distance)?;
        require_positive("scatter.max_distance", max_distance)?;
        if max_distance < min_distance {
            return Err(TerrainError::config(
                "scatter.max_distance",
                format!("{max_distance} is smaller than min_distance {min_distance}"),
            ));
        }

        let region = Self {
            width,
            height,
            min_distance,
            max_distance,
            tries,
        };
        let (cols, rows) = region.grid_dims();
        let cells = cols.saturating_mul(rows);
        if cells > MAX_GRID_CELLS {
            return Err(TerrainError::RegionTooLarge { cells });
        }
        Ok(region)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Whether `p` lies inside `[0, width) × [0, height)`.
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= 0.0 && p.x < self.width && p.y >= 0.0 && p.y < self.height
    }

    fn cell_size(&self) -> f64 {
        self.min_distance / SQRT_2
    }

    fn grid_dims(&self) -> (usize, usize) {
        let cell = self.cell_size();
        let cols = ((self.width / cell).ceil() as usize).max(1);
        let rows = ((self.height / cell).ceil() as usize).max(1);
        (cols, rows)
    }

    /// Fill the region and return the points in insertion order.
    pub fn fill<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<DVec2> {
        let mut sampler = PoissonDisk::new(self);
        sampler.seed(rng);
        while sampler.step(rng) {}

        log::debug!(
            "Poisson fill over {}x{} (min {}, max {}, tries {}): {} points, {} candidates rejected",
            self.width,
            self.height,
            self.min_distance,
            self.max_distance,
            self.tries,
            sampler.points.len(),
            sampler.rejected
        );
        sampler.points
    }
}

/// In-progress fill. Each acceleration cell is smaller than `min_distance / √2`
/// across, so it can hold at most one point.
struct PoissonDisk<'a> {
    region: &'a ScatterRegion,
    cell_size: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Option<usize>>,
    points: Vec<DVec2>,
    active: Vec<usize>,
    rejected: usize,
}

impl<'a> PoissonDisk<'a> {
    fn new(region: &'a ScatterRegion) -> Self {
        let (cols, rows) = region.grid_dims();
        Self {
            region,
            cell_size: region.cell_size(),
            cols,
            rows,
            cells: vec![None; cols * rows],
            points: Vec::new(),
            active: Vec::new(),
            rejected: 0,
        }
    }

    fn seed<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let first = DVec2::new(
            rng.gen::<f64>() * self.region.width,
            rng.gen::<f64>() * self.region.height,
        );
        // gen::<f64>() is in [0, 1), so the seed is always inside the region.
        self.insert(first);
    }

    /// Grow from one active point. Returns `false` once the active list is empty.
    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.active.is_empty() {
            return false;
        }

        let slot = rng.gen_range(0..self.active.len());
        let origin = self.points[self.active[slot]];
        let span = self.region.max_distance - self.region.min_distance;

        for _ in 0..self.region.tries {
            let angle = rng.gen::<f64>() * TAU;
            let radius = self.region.min_distance + rng.gen::<f64>() * span;
            let candidate = origin + DVec2::new(angle.cos(), angle.sin()) * radius;

            if self.region.contains(candidate) && !self.too_close(candidate) {
                self.insert(candidate);
                return true;
            }
            self.rejected += 1;
        }

        self.active.swap_remove(slot);
        true
    }

    fn cell_of(&self, p: DVec2) -> (usize, usize) {
        let cx = ((p.x / self.cell_size) as usize).min(self.cols - 1);
        let cy = ((p.y / self.cell_size) as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn insert(&mut self, p: DVec2) {
        let index = self.points.len();
        let (cx, cy) = self.cell_of(p);
        self.cells[cy * self.cols + cx] = Some(index);
        self.points.push(p);
        self.active.push(index);
    }

    /// Any existing point strictly closer than `min_distance`?
    fn too_close(&self, p: DVec2) -> bool {
        let (cx, cy) = self.cell_of(p);
        let min_sq = self.region.min_distance * self.region.min_distance;
        // min_distance spans √2 cells, so two cells in each direction suffice.
        let x_range = cx.saturating_sub(2)..(cx + 3).min(self.cols);
        let y_range = cy.saturating_sub(2)..(cy + 3).min(self.rows);

        for y in y_range {
            for x in x_range.clone() {
                if let Some(i) = self.cells[y * self.cols + x] {
                    if self.points[i].distance_squared(p) < min_sq {
                        return true;
                    }
                }
            }
        }
        false
    }
}
