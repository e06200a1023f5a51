use crate::error::{GridError, Result};
use crate::grid::position::ChunkLayout;
use serde::{Deserialize, Serialize};

/// Tunables for a ship grid and the systems that run over it.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells along each side of a chunk.
    pub chunk_size: u32,
    /// Chunks per layer along x.
    pub width_in_chunks: u32,
    /// Chunks per layer along y.
    pub height_in_chunks: u32,
    /// Simulated seconds between structural break checks.
    pub break_check_interval: f32,
    /// Cells of slack around the ship's extents that the pathfinder may use.
    pub path_padding: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            width_in_chunks: 16,
            height_in_chunks: 16,
            break_check_interval: 0.1,
            path_padding: 2,
        }
    }
}

impl GridConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: GridConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout()?;
        if self.break_check_interval.is_nan() || self.break_check_interval <= 0.0 {
            return Err(GridError::InvalidConfig(format!(
                "break_check_interval must be positive (got {})",
                self.break_check_interval
            )));
        }
        if self.path_padding < 0 {
            return Err(GridError::InvalidConfig(format!(
                "path_padding must not be negative (got {})",
                self.path_padding
            )));
        }
        Ok(())
    }

    pub fn layout(&self) -> Result<ChunkLayout> {
        ChunkLayout::new(self.chunk_size, self.width_in_chunks, self.height_in_chunks)
    }
}
