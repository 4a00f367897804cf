//! Island scene configuration. Loaded from a RON file at startup.

use std::f64::consts::TAU;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use terrain::{
    ElevationBand, FilterType, IslandNoise, PlacementStyle, ScatterRegion, TerrainConfig,
};

/// Default config file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "island.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IslandConfig {
    /// RNG seed for scattering. 0 picks a fresh seed from OS entropy.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub terrain: TerrainSection,
    #[serde(default)]
    pub heightmap: HeightmapSection,
    #[serde(default = "default_layers")]
    pub layers: Vec<ScatterLayer>,
    /// Launch platform; `None` skips it.
    #[serde(default = "default_platform")]
    pub platform: Option<PlatformSection>,
    /// Where to write the placement report (RON). `None` only logs a summary.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Default for IslandConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            terrain: TerrainSection::default(),
            heightmap: HeightmapSection::default(),
            layers: default_layers(),
            platform: default_platform(),
            output: None,
        }
    }
}

impl IslandConfig {
    /// Load from `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        Self::parse(&data).with_context(|| format!("parsing config {:?}", path))
    }

    pub fn parse(data: &str) -> Result<Self> {
        let config: Self = ron::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Convert every section into its validated library type once, so bad
    /// values fail at startup rather than halfway through the scene build.
    pub fn validate(&self) -> Result<()> {
        self.terrain.to_terrain_config().validate()?;
        self.heightmap.resolution(&self.terrain)?;
        for layer in &self.layers {
            layer
                .region()
                .and_then(|_| layer.band())
                .and_then(|_| layer.style())
                .with_context(|| format!("scatter layer `{}`", layer.name))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainSection {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_subdivisions")]
    pub subdivisions: u32,
    #[serde(default = "default_max_height")]
    pub max_height: f64,
}

fn default_width() -> f64 {
    300.0
}
fn default_subdivisions() -> u32 {
    128
}
fn default_max_height() -> f64 {
    30.0
}

impl Default for TerrainSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            subdivisions: default_subdivisions(),
            max_height: default_max_height(),
        }
    }
}

impl TerrainSection {
    pub fn to_terrain_config(&self) -> TerrainConfig {
        TerrainConfig {
            width: self.width,
            subdivisions: self.subdivisions,
            max_height: self.max_height,
        }
    }
}

/// Resampling filter applied when the heightmap is scaled to its resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoothing {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<Smoothing> for FilterType {
    fn from(s: Smoothing) -> Self {
        match s {
            Smoothing::Nearest => FilterType::Nearest,
            Smoothing::Triangle => FilterType::Triangle,
            Smoothing::CatmullRom => FilterType::CatmullRom,
            Smoothing::Gaussian => FilterType::Gaussian,
            Smoothing::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeightmapSection {
    /// Greyscale heightmap image. `None` synthesizes an island from noise.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Samples per side; defaults to `subdivisions + 1`.
    #[serde(default)]
    pub resolution: Option<u32>,
    #[serde(default)]
    pub smoothing: Smoothing,
    /// Seed for the synthesized island (ignored when `path` is set).
    #[serde(default)]
    pub noise_seed: u64,
}

impl HeightmapSection {
    pub fn resolution(&self, terrain: &TerrainSection) -> Result<u32> {
        let resolution = self
            .resolution
            .unwrap_or_else(|| terrain.subdivisions.saturating_add(1));
        anyhow::ensure!(resolution >= 1, "heightmap resolution must be at least 1");
        Ok(resolution)
    }

    pub fn noise(&self, resolution: u32) -> IslandNoise {
        IslandNoise {
            resolution: resolution as usize,
            seed: self.noise_seed,
            ..Default::default()
        }
    }
}

/// One scattered object family (trees, billboards, rocks...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterLayer {
    pub name: String,
    /// Grid dimensions in world units; centered on the terrain.
    #[serde(default = "default_grid")]
    pub grid: [f64; 2],
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,
    #[serde(default = "default_tries")]
    pub tries: u32,
    #[serde(default = "default_min_height")]
    pub min_height: f64,
    #[serde(default = "default_band_max_height")]
    pub max_height: f64,
    #[serde(default = "default_vertical_offset")]
    pub vertical_offset: f64,
    /// Yaw range in radians, `(start, end)`.
    #[serde(default = "default_rotation")]
    pub rotation: (f64, f64),
    #[serde(default = "default_scale")]
    pub scale: (f64, f64),
}

fn default_grid() -> [f64; 2] {
    [default_width(), default_width()]
}
fn default_min_distance() -> f64 {
    4.0
}
fn default_max_distance() -> f64 {
    8.0
}
fn default_tries() -> u32 {
    10
}
fn default_min_height() -> f64 {
    3.0
}
fn default_band_max_height() -> f64 {
    6.0
}
fn default_vertical_offset() -> f64 {
    -0.01
}
fn default_rotation() -> (f64, f64) {
    (0.0, TAU)
}
fn default_scale() -> (f64, f64) {
    (3.5, 4.5)
}

fn default_layers() -> Vec<ScatterLayer> {
    vec![ScatterLayer {
        name: "trees".to_string(),
        grid: default_grid(),
        min_distance: default_min_distance(),
        max_distance: default_max_distance(),
        tries: default_tries(),
        min_height: default_min_height(),
        max_height: default_band_max_height(),
        vertical_offset: default_vertical_offset(),
        rotation: default_rotation(),
        scale: default_scale(),
    }]
}

impl ScatterLayer {
    pub fn region(&self) -> terrain::Result<ScatterRegion> {
        ScatterRegion::new(
            self.grid[0],
            self.grid[1],
            self.min_distance,
            self.max_distance,
            self.tries,
        )
    }

    pub fn band(&self) -> terrain::Result<ElevationBand> {
        ElevationBand::new(self.min_height, self.max_height)
    }

    pub fn style(&self) -> terrain::Result<PlacementStyle> {
        PlacementStyle::new(
            self.vertical_offset,
            self.rotation.0..self.rotation.1,
            self.scale.0..self.scale.1,
        )
    }
}

/// Launch platform deck plus its four legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSection {
    pub x: f64,
    pub z: f64,
    /// Deck height above the ground at `(x, z)`.
    #[serde(default = "default_lift")]
    pub lift: f64,
    /// Deck box `(width, height, depth)`.
    #[serde(default = "default_footprint")]
    pub footprint: [f64; 3],
    /// How far below the deck's top edge the legs hang.
    #[serde(default = "default_leg_drop")]
    pub leg_drop: f64,
}

fn default_lift() -> f64 {
    10.0
}
fn default_footprint() -> [f64; 3] {
    [30.0, 3.0, 30.0]
}
fn default_leg_drop() -> f64 {
    8.0
}

fn default_platform() -> Option<PlatformSection> {
    Some(PlatformSection {
        x: -105.0,
        z: 15.0,
        lift: default_lift(),
        footprint: default_footprint(),
        leg_drop: default_leg_drop(),
    })
}
