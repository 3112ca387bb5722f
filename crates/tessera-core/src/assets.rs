use std::path::Path;

use anyhow::{Context, Result};
use tessera_types::models::Asset;
use tracing::info;

/// Read-only list of placeable elements. Designs reference entries by id but
/// never validate against it; the catalog exists for display.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets: Vec<Asset>,
}

impl AssetCatalog {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// Loads a JSON array of assets.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading asset catalog {}", path.display()))?;
        let assets: Vec<Asset> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing asset catalog {}", path.display()))?;
        info!("Loaded {} assets from {}", assets.len(), path.display());
        Ok(Self { assets })
    }

    pub fn builtin() -> Self {
        let entry = |id: &str, name: &str, category: &str, width: u32, height: u32| Asset {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            width,
            height,
            image_url: format!("/static/assets/{}.png", id),
        };

        Self::new(vec![
            entry("armchair", "Armchair", "furniture", 96, 88),
            entry("sofa", "Sofa", "furniture", 180, 90),
            entry("side-table", "Side Table", "furniture", 56, 56),
            entry("bookshelf", "Bookshelf", "furniture", 120, 160),
            entry("floor-lamp", "Floor Lamp", "lighting", 40, 150),
            entry("string-lights", "String Lights", "lighting", 200, 30),
            entry("monstera", "Monstera", "plants", 80, 110),
            entry("cactus", "Cactus", "plants", 40, 64),
            entry("rug-round", "Round Rug", "decor", 200, 200),
            entry("wall-art", "Wall Art", "decor", 100, 80),
            entry("cat", "Sleeping Cat", "pets", 64, 40),
        ])
    }

    pub fn load_assets(&self) -> Vec<Asset> {
        self.assets.clone()
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.id == id)
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
