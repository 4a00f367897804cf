//! Placement report written for downstream scene tooling.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use terrain::Placement;

use crate::scene::IslandScene;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub position: [f64; 3],
    pub elevation: f64,
    pub rotation_y: f64,
    pub scale: f64,
}

impl From<&Placement> for PlacementRecord {
    fn from(p: &Placement) -> Self {
        Self {
            position: p.position.to_array(),
            elevation: p.elevation,
            rotation_y: p.rotation_y,
            scale: p.scale,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerReport {
    pub name: String,
    pub candidates: usize,
    pub placements: Vec<PlacementRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneReport {
    pub seed: u64,
    pub terrain_width: f64,
    pub vertices: usize,
    pub triangles: usize,
    pub layers: Vec<LayerReport>,
    pub platform: Option<PlacementRecord>,
    pub platform_legs: Vec<PlacementRecord>,
}

impl SceneReport {
    pub fn new(scene: &IslandScene, seed: u64) -> Self {
        let mesh = scene.terrain.mesh();
        Self {
            seed,
            terrain_width: scene.terrain.config().width,
            vertices: mesh.vertex_count(),
            triangles: mesh.triangle_count(),
            layers: scene
                .layers
                .iter()
                .map(|l| LayerReport {
                    name: l.name.clone(),
                    candidates: l.candidates,
                    placements: l.placements.iter().map(PlacementRecord::from).collect(),
                })
                .collect(),
            platform: scene.platform.as_ref().map(|p| PlacementRecord::from(&p.deck)),
            platform_legs: scene
                .platform
                .as_ref()
                .map(|p| p.legs.iter().map(PlacementRecord::from).collect())
                .unwrap_or_default(),
        }
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let text = self.to_ron()?;
        std::fs::write(path, text).with_context(|| format!("writing report {:?}", path))?;
        log::info!("Wrote placement report to {:?}", path);
        Ok(())
    }
}
