//! Island terrain driver: builds the terrain, scatters objects over it and
//! reports where everything goes.
//!
//! Usage: `island [config.ron]` (defaults to `island.ron` in the current directory).

mod config;
mod report;
mod scene;

use std::path::PathBuf;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::{IslandConfig, DEFAULT_CONFIG_FILE};
use crate::report::SceneReport;
use crate::scene::IslandScene;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = IslandConfig::load(&config_path)?;

    let seed = match config.seed {
        0 => rand::rngs::OsRng.next_u64(),
        s => s,
    };
    log::info!("Scatter seed {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let scene = IslandScene::build(&config, &mut rng)?;
    log::info!(
        "Island built: {} vertices, {} triangles, {} placements",
        scene.terrain.mesh().vertex_count(),
        scene.terrain.mesh().triangle_count(),
        scene.placement_count()
    );

    if let Some(path) = &config.output {
        SceneReport::new(&scene, seed).write(path)?;
    }

    Ok(())
}
