use crate::grid::color::{join_colors, split_colors, PixelColor};
use crate::grid::history::HistoryLog;
use crate::grid::model::is_supported_dimension;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const KEY_PIXELS: &str = "pixels";
pub const KEY_CURRENT_COLOR: &str = "currentColor";
pub const KEY_PALETTE: &str = "palette";
pub const KEY_GRID_WIDTH: &str = "gridWidth";
pub const KEY_GRID_HEIGHT: &str = "gridHeight";
pub const KEY_DEBOUNCE_DELAY: &str = "debounceDelay";
pub const KEY_HISTORY: &str = "history";
pub const KEY_ENDPOINT: &str = "endpoint";

pub const STORE_FILE_NAME: &str = "led_canvas_store.json";

/// Flat string key-value storage. Writes to different keys are independent;
/// there is no transaction spanning several keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Store kept entirely in memory. Counts writes so callers can observe
/// whether an operation touched storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    writes: usize,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Make every subsequent write fail, as a full or read-only disk would.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            bail!("memory store rejected write to '{key}'");
        }
        self.writes += 1;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.fail_writes {
            bail!("memory store rejected removal of '{key}'");
        }
        self.writes += 1;
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk, rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("read store file {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("deserialize store file {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// A store that starts empty and overwrites whatever is at `path` on the
    /// first write.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("create store parent folder {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries).context("serialize store")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("write store file {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.write_file()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.write_file()?;
        }
        Ok(())
    }
}

pub fn default_store_path() -> PathBuf {
    dirs_next::data_dir()
        .map(|dir| dir.join("led_canvas"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_FILE_NAME)
}

/// Typed access to the canvas keys. Every failure is logged and degraded to
/// "no value" on reads or a skipped write; nothing is propagated.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, "failed to read stored value: {err:#}");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            tracing::warn!(key, "skipping store write: {err:#}");
        }
    }

    fn read_number<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparseable stored number");
                None
            }
        }
    }

    pub fn load_pixels(&self) -> Option<Vec<PixelColor>> {
        self.read(KEY_PIXELS).map(|raw| split_colors(&raw))
    }

    pub fn save_pixels(&mut self, pixels: &[PixelColor]) {
        self.write(KEY_PIXELS, &join_colors(pixels));
    }

    pub fn load_current_color(&self) -> Option<PixelColor> {
        let raw = self.read(KEY_CURRENT_COLOR)?;
        PixelColor::parse(&raw)
            .map_err(|err| tracing::warn!("ignoring stored current color: {err}"))
            .ok()
    }

    pub fn save_current_color(&mut self, color: PixelColor) {
        self.write(KEY_CURRENT_COLOR, &color.to_string());
    }

    pub fn load_palette(&self) -> Option<Vec<PixelColor>> {
        self.read(KEY_PALETTE)
            .map(|raw| split_colors(&raw))
            .filter(|palette| !palette.is_empty())
    }

    pub fn save_palette(&mut self, palette: &[PixelColor]) {
        self.write(KEY_PALETTE, &join_colors(palette));
    }

    pub fn load_dimensions(&self) -> Option<(usize, usize)> {
        let width = self.read_number::<usize>(KEY_GRID_WIDTH)?;
        let height = self.read_number::<usize>(KEY_GRID_HEIGHT)?;
        if !is_supported_dimension(width) || !is_supported_dimension(height) {
            tracing::warn!(width, height, "ignoring unsupported stored grid dimensions");
            return None;
        }
        Some((width, height))
    }

    pub fn save_dimensions(&mut self, width: usize, height: usize) {
        self.write(KEY_GRID_WIDTH, &width.to_string());
        self.write(KEY_GRID_HEIGHT, &height.to_string());
    }

    pub fn load_debounce_delay(&self) -> Option<u64> {
        self.read_number(KEY_DEBOUNCE_DELAY)
    }

    pub fn save_debounce_delay(&mut self, delay_ms: u64) {
        self.write(KEY_DEBOUNCE_DELAY, &delay_ms.to_string());
    }

    pub fn load_history(&self) -> HistoryLog {
        self.read(KEY_HISTORY)
            .map(|raw| HistoryLog::from_json_or_empty(&raw))
            .unwrap_or_default()
    }

    pub fn save_history(&mut self, history: &HistoryLog) {
        match history.to_json() {
            Ok(json) => self.write(KEY_HISTORY, &json),
            Err(err) => tracing::error!("skipping history write: {err:#}"),
        }
    }

    pub fn load_endpoint(&self) -> Option<String> {
        self.read(KEY_ENDPOINT).filter(|e| !e.trim().is_empty())
    }

    pub fn save_endpoint(&mut self, endpoint: Option<&str>) {
        let result = match endpoint {
            Some(endpoint) => self.store.set(KEY_ENDPOINT, endpoint),
            None => self.store.remove(KEY_ENDPOINT),
        };
        if let Err(err) = result {
            tracing::warn!(key = KEY_ENDPOINT, "skipping store write: {err:#}");
        }
    }
}
