//! Island scene assembly: terrain first, then everything that sits on it.

use std::sync::Arc;

use anyhow::{Context, Result};
use glam::DVec3;
use rand::Rng;
use terrain::{anchor, corner_legs, HeightField, HeightmapSampler, Placement, Terrain};

use crate::config::{IslandConfig, PlatformSection, ScatterLayer};

/// Placements produced by one scatter layer.
#[derive(Debug, Clone)]
pub struct LayerPlacements {
    pub name: String,
    /// Candidates the Poisson fill produced before elevation filtering.
    pub candidates: usize,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone)]
pub struct PlatformPlacements {
    pub deck: Placement,
    pub legs: [Placement; 4],
}

/// Everything the renderer needs to instantiate the island.
#[derive(Debug)]
pub struct IslandScene {
    pub terrain: Terrain,
    pub layers: Vec<LayerPlacements>,
    pub platform: Option<PlatformPlacements>,
}

impl IslandScene {
    /// Build terrain, then scatter each layer and place the platform on it.
    pub fn build<R: Rng + ?Sized>(config: &IslandConfig, rng: &mut R) -> Result<Self> {
        let field = load_field(config)?;
        let terrain = Terrain::new(Arc::new(field), config.terrain.to_terrain_config())
            .context("building terrain")?;

        let layers = config
            .layers
            .iter()
            .map(|layer| scatter_layer(&terrain, layer, rng))
            .collect::<Result<Vec<_>>>()?;

        let platform = config
            .platform
            .as_ref()
            .map(|p| place_platform(&terrain, p));

        Ok(Self {
            terrain,
            layers,
            platform,
        })
    }

    pub fn placement_count(&self) -> usize {
        let platform = self.platform.as_ref().map_or(0, |p| 1 + p.legs.len());
        self.layers.iter().map(|l| l.placements.len()).sum::<usize>() + platform
    }
}

fn load_field(config: &IslandConfig) -> Result<HeightField> {
    let resolution = config.heightmap.resolution(&config.terrain)?;
    match &config.heightmap.path {
        Some(path) => {
            let sampler = HeightmapSampler::new(resolution)?
                .with_filter(config.heightmap.smoothing.into());
            sampler
                .open(path)
                .with_context(|| format!("loading heightmap {:?}", path))
        }
        None => {
            log::info!(
                "No heightmap configured; synthesizing a {}x{} island (noise seed {})",
                resolution,
                resolution,
                config.heightmap.noise_seed
            );
            config
                .heightmap
                .noise(resolution)
                .generate()
                .context("synthesizing heightmap")
        }
    }
}

fn scatter_layer<R: Rng + ?Sized>(
    terrain: &Terrain,
    layer: &ScatterLayer,
    rng: &mut R,
) -> Result<LayerPlacements> {
    let context = || format!("scatter layer `{}`", layer.name);
    let region = layer.region().with_context(context)?;
    let filter = terrain.placement_filter(
        layer.band().with_context(context)?,
        layer.style().with_context(context)?,
    );

    let candidates = region.fill(rng);
    let placements = filter.apply(&candidates, terrain, rng);

    if placements.is_empty() {
        log::warn!(
            "Layer `{}` placed nothing: no terrain inside ({}, {})",
            layer.name,
            layer.min_height,
            layer.max_height
        );
    } else {
        log::info!(
            "Layer `{}`: {} of {} candidates placed",
            layer.name,
            placements.len(),
            candidates.len()
        );
    }

    Ok(LayerPlacements {
        name: layer.name.clone(),
        candidates: candidates.len(),
        placements,
    })
}

fn place_platform(terrain: &Terrain, platform: &PlatformSection) -> PlatformPlacements {
    let deck = anchor(terrain, platform.x, platform.z, platform.lift);
    let legs = corner_legs(&deck, DVec3::from_array(platform.footprint), platform.leg_drop);
    log::info!(
        "Launch platform at ({:.1}, {:.1}, {:.1}), ground {:.2}",
        deck.position.x,
        deck.position.y,
        deck.position.z,
        deck.elevation
    );
    PlatformPlacements { deck, legs }
}
