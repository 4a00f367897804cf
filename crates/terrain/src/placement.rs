//! Turning scatter candidates into placed object transforms.
//!
//! Candidates live in grid space `[0, w) × [0, h)`; the filter shifts them so
//! the grid is centered on the terrain, asks the [`HeightSource`] for the
//! ground height and keeps only points strictly inside the elevation band.
//! Rejected candidates are dropped, never resampled.

use std::f64::consts::TAU;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::{DVec2, DVec3, Mat4, Quat, Vec3};
use rand::Rng;

use crate::error::{require_finite, Result, TerrainError};
use crate::query::HeightSource;

/// Open elevation interval `(min, max)`: both bounds are excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationBand {
    min: f64,
    max: f64,
}

impl ElevationBand {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        require_finite("band.min_height", min)?;
        require_finite("band.max_height", max)?;
        if min >= max {
            return Err(TerrainError::config(
                "band.max_height",
                format!("{max} must be greater than min_height {min}"),
            ));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// `min < elevation < max`. NaN is never inside.
    #[inline]
    pub fn contains(&self, elevation: f64) -> bool {
        elevation > self.min && elevation < self.max
    }
}

/// How accepted candidates are dressed: vertical offset from the ground plus
/// the ranges random yaw and uniform scale are drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementStyle {
    pub vertical_offset: f64,
    pub rotation: Range<f64>,
    pub scale: Range<f64>,
}

impl PlacementStyle {
    /// Ranges are half-open; an empty range (`a..a`) always yields `a`.
    pub fn new(vertical_offset: f64, rotation: Range<f64>, scale: Range<f64>) -> Result<Self> {
        require_finite("style.vertical_offset", vertical_offset)?;
        check_range("style.rotation", &rotation)?;
        check_range("style.scale", &scale)?;
        if scale.start <= 0.0 {
            return Err(TerrainError::config(
                "style.scale",
                format!("scale must be positive, got {}", scale.start),
            ));
        }
        Ok(Self {
            vertical_offset,
            rotation,
            scale,
        })
    }

    /// Tree models: sunk slightly into the ground so trunks never float,
    /// any yaw, 3.5–4.5× scale.
    pub fn tree() -> Self {
        Self {
            vertical_offset: -0.01,
            rotation: 0.0..TAU,
            scale: 3.5..4.5,
        }
    }

    /// Camera-facing billboards: lifted above the ground, no yaw, 3–8× scale.
    pub fn sprite() -> Self {
        Self {
            vertical_offset: 2.0,
            rotation: 0.0..0.0,
            scale: 3.0..8.0,
        }
    }
}

fn check_range(field: &'static str, range: &Range<f64>) -> Result<()> {
    require_finite(field, range.start)?;
    require_finite(field, range.end)?;
    if range.end < range.start {
        return Err(TerrainError::config(
            field,
            format!("range {}..{} is reversed", range.start, range.end),
        ));
    }
    Ok(())
}

/// `start + t · (end − start)` with `t` uniform in `[0, 1)`; never panics on empty ranges.
#[inline]
fn draw<R: Rng + ?Sized>(rng: &mut R, range: &Range<f64>) -> f64 {
    range.start + rng.gen::<f64>() * (range.end - range.start)
}

/// A placed object, ready for an external scene layer to instantiate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// World position; `y` is ground height plus the style's vertical offset.
    pub position: DVec3,
    /// Ground height the placement was accepted at.
    pub elevation: f64,
    /// Yaw in radians.
    pub rotation_y: f64,
    /// Uniform scale factor.
    pub scale: f64,
}

impl Placement {
    /// Model matrix (scale, then yaw, then translation).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale as f32),
            Quat::from_rotation_y(self.rotation_y as f32),
            self.position.as_vec3(),
        )
    }
}

/// Per-instance data for GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl From<&Placement> for InstanceRaw {
    fn from(placement: &Placement) -> Self {
        Self {
            model: placement.to_matrix().to_cols_array_2d(),
        }
    }
}

impl From<Placement> for InstanceRaw {
    fn from(placement: Placement) -> Self {
        Self::from(&placement)
    }
}

/// Elevation-band filter over scatter candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementFilter {
    offset: f64,
    band: ElevationBand,
    style: PlacementStyle,
}

impl PlacementFilter {
    /// `offset` is subtracted from both candidate axes; pass half the terrain
    /// width to center a `[width, width]` grid on the terrain.
    pub fn new(offset: f64, band: ElevationBand, style: PlacementStyle) -> Self {
        Self {
            offset,
            band,
            style,
        }
    }

    pub fn band(&self) -> &ElevationBand {
        &self.band
    }

    pub fn style(&self) -> &PlacementStyle {
        &self.style
    }

    /// Evaluate one candidate. Random yaw and scale are only drawn when the
    /// candidate is accepted.
    pub fn evaluate<H, R>(&self, candidate: DVec2, heights: &H, rng: &mut R) -> Option<Placement>
    where
        H: HeightSource + ?Sized,
        R: Rng + ?Sized,
    {
        let x = candidate.x - self.offset;
        let z = candidate.y - self.offset;
        let elevation = heights.elevation(x, z);
        if !self.band.contains(elevation) {
            return None;
        }

        Some(Placement {
            position: DVec3::new(x, elevation + self.style.vertical_offset, z),
            elevation,
            rotation_y: draw(rng, &self.style.rotation),
            scale: draw(rng, &self.style.scale),
        })
    }

    /// Filter every candidate, preserving candidate order.
    pub fn apply<H, R>(&self, candidates: &[DVec2], heights: &H, rng: &mut R) -> Vec<Placement>
    where
        H: HeightSource + ?Sized,
        R: Rng + ?Sized,
    {
        let placed: Vec<Placement> = candidates
            .iter()
            .filter_map(|&c| self.evaluate(c, heights, rng))
            .collect();

        log::debug!(
            "Placement filter kept {}/{} candidates in band ({}, {})",
            placed.len(),
            candidates.len(),
            self.band.min,
            self.band.max
        );
        placed
    }
}

/// Single object resting at ground height plus `lift` (e.g. a platform deck).
pub fn anchor<H: HeightSource + ?Sized>(heights: &H, x: f64, z: f64, lift: f64) -> Placement {
    let elevation = heights.elevation(x, z);
    Placement {
        position: DVec3::new(x, elevation + lift, z),
        elevation,
        rotation_y: 0.0,
        scale: 1.0,
    }
}

/// Four structural legs under a box of `footprint` (width, height, depth)
/// centered on `deck`, at `deck.y + height / 2 - drop`.
///
/// Leg height does not follow the terrain: legs hang a fixed distance below
/// the deck.
pub fn corner_legs(deck: &Placement, footprint: DVec3, drop: f64) -> [Placement; 4] {
    let half = footprint / 2.0;
    let y = deck.position.y + half.y - drop;
    [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)].map(|(sx, sz)| Placement {
        position: DVec3::new(deck.position.x + sx * half.x, y, deck.position.z + sz * half.z),
        elevation: deck.elevation,
        rotation_y: 0.0,
        scale: 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn band(min: f64, max: f64) -> ElevationBand {
        ElevationBand::new(min, max).unwrap()
    }

    #[test]
    fn lower_boundary_is_rejected() {
        let filter = PlacementFilter::new(0.0, band(3.0, 6.0), PlacementStyle::tree());
        let ground = |_x: f64, _z: f64| 3.0;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(filter.evaluate(DVec2::new(1.0, 1.0), &ground, &mut rng).is_none());
    }

    #[test]
    fn upper_boundary_is_rejected() {
        let filter = PlacementFilter::new(0.0, band(3.0, 6.0), PlacementStyle::tree());
        let ground = |_x: f64, _z: f64| 6.0;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(filter.evaluate(DVec2::ZERO, &ground, &mut rng).is_none());
    }

    #[test]
    fn inside_band_is_placed_with_offset_and_centering() {
        let filter = PlacementFilter::new(150.0, band(3.0, 6.0), PlacementStyle::tree());
        let ground = |x: f64, _z: f64| if x < 0.0 { 4.0 } else { 10.0 };
        let mut rng = StdRng::seed_from_u64(0);

        let p = filter
            .evaluate(DVec2::new(100.0, 200.0), &ground, &mut rng)
            .unwrap();
        assert_eq!(p.position.x, -50.0);
        assert_eq!(p.position.z, 50.0);
        assert_eq!(p.elevation, 4.0);
        assert!((p.position.y - 3.99).abs() < 1e-12);
        assert!((0.0..TAU).contains(&p.rotation_y));
        assert!((3.5..4.5).contains(&p.scale));

        assert!(filter
            .evaluate(DVec2::new(200.0, 0.0), &ground, &mut rng)
            .is_none());
    }

    #[test]
    fn never_emits_outside_band() {
        let filter = PlacementFilter::new(50.0, band(3.0, 6.0), PlacementStyle::tree());
        // A ramp from 0 to 10 along X.
        let ground = |x: f64, _z: f64| (x + 50.0) / 10.0;
        let candidates: Vec<DVec2> = (0..100)
            .map(|i| DVec2::new(i as f64, (i * 7 % 100) as f64))
            .collect();
        let mut rng = StdRng::seed_from_u64(4);

        let placed = filter.apply(&candidates, &ground, &mut rng);
        assert!(!placed.is_empty());
        assert!(placed.len() < candidates.len());
        for p in &placed {
            assert!(p.elevation > 3.0 && p.elevation < 6.0);
        }
        // Candidates 31..=59 map to ground heights strictly inside (3, 6).
        assert_eq!(placed.len(), 29);
    }

    #[test]
    fn sprite_style_lifts_without_rotation() {
        let filter = PlacementFilter::new(0.0, band(0.0, 100.0), PlacementStyle::sprite());
        let ground = |_x: f64, _z: f64| 5.0;
        let mut rng = StdRng::seed_from_u64(8);
        let p = filter.evaluate(DVec2::ZERO, &ground, &mut rng).unwrap();
        assert_eq!(p.position.y, 7.0);
        assert_eq!(p.rotation_y, 0.0);
        assert!((3.0..8.0).contains(&p.scale));
    }

    #[test]
    fn band_and_style_validation() {
        assert!(ElevationBand::new(6.0, 3.0).is_err());
        assert!(ElevationBand::new(3.0, 3.0).is_err());
        assert!(ElevationBand::new(f64::NAN, 3.0).is_err());
        assert!(!band(3.0, 6.0).contains(f64::NAN));

        assert!(PlacementStyle::new(0.0, 1.0..0.0, 1.0..2.0).is_err());
        assert!(PlacementStyle::new(0.0, 0.0..1.0, 0.0..2.0).is_err());
        assert!(PlacementStyle::new(f64::INFINITY, 0.0..1.0, 1.0..2.0).is_err());
        assert!(PlacementStyle::new(-8.0, 0.0..0.0, 1.0..1.0).is_ok());
    }

    #[test]
    fn anchor_lifts_platform_above_ground() {
        let ground = |x: f64, z: f64| x.abs() * 0.1 + z * 0.0 + 2.0;
        let deck = anchor(&ground, -105.0, 15.0, 10.0);
        assert!((deck.elevation - 12.5).abs() < 1e-12);
        assert!((deck.position.y - 22.5).abs() < 1e-12);
        assert_eq!(deck.position.x, -105.0);
        assert_eq!(deck.position.z, 15.0);
    }

    #[test]
    fn legs_sit_at_footprint_corners() {
        let deck = Placement {
            position: DVec3::new(-105.0, 20.0, 15.0),
            elevation: 10.0,
            rotation_y: 0.0,
            scale: 1.0,
        };
        let legs = corner_legs(&deck, DVec3::new(30.0, 3.0, 30.0), 8.0);

        for leg in &legs {
            assert!((leg.position.y - 13.5).abs() < 1e-12);
            assert_eq!((leg.position.x - deck.position.x).abs(), 15.0);
            assert_eq!((leg.position.z - deck.position.z).abs(), 15.0);
        }
        let mut corners: Vec<(i64, i64)> = legs
            .iter()
            .map(|l| (l.position.x as i64, l.position.z as i64))
            .collect();
        corners.sort();
        corners.dedup();
        assert_eq!(corners.len(), 4);
    }

    #[test]
    fn instance_matrix_places_origin_at_position() {
        let p = Placement {
            position: DVec3::new(1.0, 2.0, 3.0),
            elevation: 2.0,
            rotation_y: std::f64::consts::FRAC_PI_2,
            scale: 2.0,
        };
        let raw = InstanceRaw::from(p);
        assert_eq!(raw.model[3][0], 1.0);
        assert_eq!(raw.model[3][1], 2.0);
        assert_eq!(raw.model[3][2], 3.0);

        let tip = p.to_matrix().transform_point3(Vec3::X);
        assert!((tip - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-5);
    }
}
