use crate::grid::device::DeliveryMode;
use crate::grid::model::{
    GridConfig, DEFAULT_CELL_SIZE, DEFAULT_DEBOUNCE_DELAY_MS, DEFAULT_GRID_HEIGHT,
    DEFAULT_GRID_WIDTH,
};
use crate::grid::persist::default_store_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_grid_width() -> usize {
    DEFAULT_GRID_WIDTH
}

fn default_grid_height() -> usize {
    DEFAULT_GRID_HEIGHT
}

fn default_cell_size() -> u32 {
    DEFAULT_CELL_SIZE
}

fn default_debounce_delay_ms() -> u64 {
    DEFAULT_DEBOUNCE_DELAY_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Device state URL, e.g. `http://192.168.1.40/json`. When unset the
    /// canvas works offline until an endpoint is configured.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// When enabled the logger starts at debug level and honours `RUST_LOG`.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives a copy of the log output.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Where the canvas store lives. Defaults to the platform data folder.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    /// Grid size used until the device or the store says otherwise.
    #[serde(default = "default_grid_width")]
    pub grid_width: usize,
    #[serde(default = "default_grid_height")]
    pub grid_height: usize,
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,
    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,
    #[serde(default)]
    pub delivery: DeliveryMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            debug_logging: false,
            log_file: None,
            store_path: None,
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            cell_size: default_cell_size(),
            debounce_delay_ms: default_debounce_delay_ms(),
            delivery: DeliveryMode::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn grid_defaults(&self) -> GridConfig {
        GridConfig {
            cell_size: self.cell_size,
            debounce_delay_ms: self.debounce_delay_ms,
            ..GridConfig::default()
        }
        .with_dimensions(self.grid_width, self.grid_height)
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path.clone().unwrap_or_else(default_store_path)
    }
}
