use std::collections::HashMap;

use chrono::Utc;
use tessera_types::models::{DEFAULT_BACKGROUND_COLOR, Design, PlacedAsset};
use uuid::Uuid;

use crate::color::validate_hex_color;
use crate::error::{Result, TesseraError};

/// Drawable area of every design. Coordinates are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: i32,
    pub height: i32,
}

impl Canvas {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Snaps a point onto the nearest edge instead of rejecting it.
    pub fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        (x.clamp(0, self.width), y.clamp(0, self.height))
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Working set of designs being edited, and the edit operations on them.
///
/// Assets are addressed by list index. Removing one shifts every later index
/// down, so callers must not hold indices across a removal.
pub struct DesignManager {
    canvas: Canvas,
    designs: HashMap<Uuid, Design>,
}

impl DesignManager {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            designs: HashMap::new(),
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn create_design(&mut self, user_id: Uuid, theme_id: Uuid, username: &str) -> &Design {
        let now = Utc::now();
        let design = Design {
            id: Uuid::new_v4(),
            user_id,
            username: username.to_string(),
            theme_id,
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            assets: Vec::new(),
            created_at: now,
            updated_at: now,
            submitted: false,
            submitted_at: None,
            vote_count: 0,
            next_z_index: 0,
        };
        self.open_design(design)
    }

    /// Puts a persisted design into the working set, replacing any copy.
    pub fn open_design(&mut self, mut design: Design) -> &Design {
        // Records written before the counter existed start after their highest z.
        let floor = design.assets.iter().map(|a| a.z_index + 1).max().unwrap_or(0);
        design.next_z_index = design.next_z_index.max(floor);

        let id = design.id;
        self.designs.insert(id, design);
        &self.designs[&id]
    }

    pub fn get_design(&self, design_id: Uuid) -> Option<&Design> {
        self.designs.get(&design_id)
    }

    pub fn close_design(&mut self, design_id: Uuid) -> Option<Design> {
        self.designs.remove(&design_id)
    }

    pub fn open_count(&self) -> usize {
        self.designs.len()
    }

    pub fn place_asset(&mut self, design_id: Uuid, asset_id: &str, x: i32, y: i32) -> Result<&Design> {
        let (x, y) = self.canvas.clamp(x, y);
        let design = self.design_mut(design_id)?;

        let z_index = design.next_z_index;
        design.next_z_index += 1;
        design.assets.push(PlacedAsset {
            id: Uuid::new_v4(),
            asset_id: asset_id.to_string(),
            x,
            y,
            rotation: 0,
            z_index,
        });

        touch(design);
        Ok(design)
    }

    pub fn move_asset(&mut self, design_id: Uuid, index: usize, x: i32, y: i32) -> Result<&Design> {
        let (x, y) = self.canvas.clamp(x, y);
        let design = self.design_mut(design_id)?;

        let asset = asset_mut(design, index)?;
        asset.x = x;
        asset.y = y;

        touch(design);
        Ok(design)
    }

    pub fn rotate_asset(&mut self, design_id: Uuid, index: usize) -> Result<&Design> {
        let design = self.design_mut(design_id)?;

        let asset = asset_mut(design, index)?;
        asset.rotation = (asset.rotation + 90) % 360;

        touch(design);
        Ok(design)
    }

    pub fn remove_asset(&mut self, design_id: Uuid, index: usize) -> Result<&Design> {
        let design = self.design_mut(design_id)?;

        asset_mut(design, index)?;
        design.assets.remove(index);

        touch(design);
        Ok(design)
    }

    pub fn update_background_color(&mut self, design_id: Uuid, color: &str) -> Result<&Design> {
        let color = validate_hex_color(color)?;
        let design = self.design_mut(design_id)?;

        design.background_color = color;

        touch(design);
        Ok(design)
    }

    fn design_mut(&mut self, design_id: Uuid) -> Result<&mut Design> {
        self.designs
            .get_mut(&design_id)
            .ok_or(TesseraError::DesignNotFound(design_id))
    }
}

fn asset_mut(design: &mut Design, index: usize) -> Result<&mut PlacedAsset> {
    let len = design.assets.len();
    design
        .assets
        .get_mut(index)
        .ok_or(TesseraError::InvalidAssetIndex { index, len })
}

/// `updated_at` never moves backwards, even if the wall clock does.
fn touch(design: &mut Design) {
    let now = Utc::now();
    if now > design.updated_at {
        design.updated_at = now;
    }
}
