//! Heightmap decoding into a normalized scalar height field.
//!
//! The sampler resamples the source raster to a square grid with a smoothing
//! filter and keeps only the red channel, treating the image as greyscale.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::{Result, TerrainError};

/// Square grid of normalized heights in `[0, 1]`.
///
/// Row-major: `x` walks columns (image left → right), `y` walks rows
/// (image top → bottom). Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    size: usize,
    samples: Vec<f32>,
}

impl HeightField {
    /// Build from raw samples. `samples.len()` must be `size * size` and every
    /// value must lie in `[0, 1]`.
    pub fn from_samples(size: usize, samples: Vec<f32>) -> Result<Self> {
        if size == 0 {
            return Err(TerrainError::config("heightmap.resolution", "must be at least 1"));
        }
        if samples.len() != size * size {
            return Err(TerrainError::config(
                "heightmap.samples",
                format!("expected {} samples for a {size}x{size} grid, got {}", size * size, samples.len()),
            ));
        }
        if let Some((i, v)) = samples
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(TerrainError::config(
                "heightmap.samples",
                format!("sample {i} is {v}, outside [0, 1]"),
            ));
        }
        Ok(Self { size, samples })
    }

    /// Uniform field, mostly useful for tests and placeholder terrain.
    pub fn flat(size: usize, value: f32) -> Result<Self> {
        Self::from_samples(size, vec![value; size * size])
    }

    /// Side length in samples.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Raw sample at grid coordinates; out-of-range indices are clamped to the edge.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> f32 {
        let last = self.size - 1;
        self.samples[y.min(last) * self.size + x.min(last)]
    }

    /// Bilinear interpolation at normalized `(u, v)`, both clamped to `[0, 1]`.
    ///
    /// `u = 0` is the first column and `u = 1` the last; likewise `v` over rows.
    /// Any grid resolution is accepted: callers sample in normalized space, so
    /// mesh density and field resolution are independent.
    pub fn sample_bilinear(&self, u: f64, v: f64) -> f64 {
        if self.size == 1 {
            return self.samples[0] as f64;
        }
        let max = (self.size - 1) as f64;
        let gx = clamp_unit(u) * max;
        let gy = clamp_unit(v) * max;

        let x0 = (gx.floor() as usize).min(self.size - 2);
        let y0 = (gy.floor() as usize).min(self.size - 2);
        let fx = gx - x0 as f64;
        let fy = gy - y0 as f64;

        let h00 = self.sample(x0, y0) as f64;
        let h10 = self.sample(x0 + 1, y0) as f64;
        let h01 = self.sample(x0, y0 + 1) as f64;
        let h11 = self.sample(x0 + 1, y0 + 1) as f64;

        let top = h00 + (h10 - h00) * fx;
        let bottom = h01 + (h11 - h01) * fx;
        top + (bottom - top) * fy
    }
}

/// NaN maps to 0 so a bad coordinate can never index out of bounds.
#[inline]
fn clamp_unit(t: f64) -> f64 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Turns decoded raster images into [`HeightField`]s of a fixed resolution.
#[derive(Debug, Clone, Copy)]
pub struct HeightmapSampler {
    resolution: u32,
    filter: FilterType,
}

impl HeightmapSampler {
    /// Sampler producing `resolution × resolution` fields with triangle (bilinear) smoothing.
    pub fn new(resolution: u32) -> Result<Self> {
        if resolution == 0 {
            return Err(TerrainError::config("heightmap.resolution", "must be at least 1"));
        }
        Ok(Self {
            resolution,
            filter: FilterType::Triangle,
        })
    }

    /// Swap the resampling filter (e.g. `CatmullRom` for sharper ridges).
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Resample `image` and extract its red channel.
    pub fn sample(&self, image: &DynamicImage) -> Result<HeightField> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TerrainError::EmptyImage { width, height });
        }

        let resized = image.resize_exact(self.resolution, self.resolution, self.filter);
        let rgba = resized.to_rgba8();
        let samples = rgba.pixels().map(|p| p.0[0] as f32 / 255.0).collect();

        log::debug!(
            "Sampled {}x{} heightmap into {}x{} field",
            width,
            height,
            self.resolution,
            self.resolution
        );
        HeightField::from_samples(self.resolution as usize, samples)
    }

    /// Decode an encoded image (PNG, JPEG) and sample it.
    pub fn decode(&self, bytes: &[u8]) -> Result<HeightField> {
        self.decode_with(bytes, image::load_from_memory)
    }

    /// Decode with a caller-supplied decoder, then sample.
    pub fn decode_with<F, E>(&self, bytes: &[u8], decoder: F) -> Result<HeightField>
    where
        F: FnOnce(&[u8]) -> std::result::Result<DynamicImage, E>,
        E: Into<TerrainError>,
    {
        let image = decoder(bytes).map_err(Into::into)?;
        self.sample(&image)
    }

    /// Read and decode a heightmap file.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<HeightField> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        log::info!("Loaded heightmap {:?} ({} bytes)", path, bytes.len());
        self.decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn gradient_field() -> HeightField {
        // 0.0 0.5
        // 0.5 1.0
        HeightField::from_samples(2, vec![0.0, 0.5, 0.5, 1.0]).unwrap()
    }

    #[test]
    fn bilinear_hits_grid_points_exactly() {
        let f = gradient_field();
        assert_eq!(f.sample_bilinear(0.0, 0.0), 0.0);
        assert_eq!(f.sample_bilinear(1.0, 0.0), 0.5);
        assert_eq!(f.sample_bilinear(0.0, 1.0), 0.5);
        assert_eq!(f.sample_bilinear(1.0, 1.0), 1.0);
    }

    #[test]
    fn bilinear_interpolates_cell_center() {
        let f = gradient_field();
        assert!((f.sample_bilinear(0.5, 0.5) - 0.5).abs() < 1e-12);
        assert!((f.sample_bilinear(0.25, 0.0) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn bilinear_clamps_outside_unit_square() {
        let f = gradient_field();
        assert_eq!(f.sample_bilinear(-4.0, -1.0), 0.0);
        assert_eq!(f.sample_bilinear(7.0, 2.0), 1.0);
        assert_eq!(f.sample_bilinear(f64::NAN, 0.0), 0.0);
    }

    #[test]
    fn single_sample_field_is_constant() {
        let f = HeightField::flat(1, 0.25).unwrap();
        assert_eq!(f.sample_bilinear(0.3, 0.9), 0.25);
    }

    #[test]
    fn from_samples_rejects_bad_input() {
        assert!(HeightField::from_samples(0, vec![]).is_err());
        assert!(HeightField::from_samples(2, vec![0.0; 3]).is_err());
        assert!(HeightField::from_samples(1, vec![1.5]).is_err());
        assert!(HeightField::from_samples(1, vec![f32::NAN]).is_err());
    }

    #[test]
    fn sampler_extracts_red_channel() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255]));
        let field = HeightmapSampler::new(4)
            .unwrap()
            .sample(&DynamicImage::ImageRgba8(img))
            .unwrap();
        assert_eq!(field.size(), 4);
        assert!(field.samples().iter().all(|&v| (v - 1.0).abs() < 1.0 / 255.0));
    }

    #[test]
    fn sampler_ignores_green_and_blue() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 255, 255]));
        let field = HeightmapSampler::new(4)
            .unwrap()
            .sample(&DynamicImage::ImageRgba8(img))
            .unwrap();
        assert!(field.samples().iter().all(|&v| v < 1.0 / 255.0));
    }

    #[test]
    fn sampler_rejects_empty_image() {
        let img = DynamicImage::new_rgba8(0, 5);
        let err = HeightmapSampler::new(4).unwrap().sample(&img).unwrap_err();
        assert!(matches!(err, TerrainError::EmptyImage { width: 0, height: 5 }));
    }

    #[test]
    fn sampler_requires_nonzero_resolution() {
        assert!(HeightmapSampler::new(0).is_err());
    }

    #[test]
    fn decode_reads_png_bytes() {
        let img = RgbaImage::from_pixel(6, 6, Rgba([128, 10, 10, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let field = HeightmapSampler::new(3).unwrap().decode(&bytes).unwrap();
        assert_eq!(field.samples().len(), 9);
        assert!(field
            .samples()
            .iter()
            .all(|&v| (v - 128.0 / 255.0).abs() < 1.5 / 255.0));
    }

    #[test]
    fn decode_surfaces_garbage_as_error() {
        let err = HeightmapSampler::new(3)
            .unwrap()
            .decode(b"definitely not a png")
            .unwrap_err();
        assert!(matches!(err, TerrainError::Decode(_)));
    }

    #[test]
    fn decode_with_uses_injected_decoder() {
        let sampler = HeightmapSampler::new(2).unwrap();
        let field = sampler
            .decode_with(&[], |_| {
                Ok::<_, TerrainError>(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                    2,
                    2,
                    Rgba([0, 0, 0, 255]),
                )))
            })
            .unwrap();
        assert_eq!(field.samples(), &[0.0; 4]);
    }
}
