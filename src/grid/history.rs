use crate::grid::color::PixelColor;
use crate::grid::model::PixelBuffer;
use crate::grid::store::PixelGrid;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const HISTORY_CAP: usize = 50;

/// The inverse of one mutation. Snapshots are owned copies, never views of
/// the live buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryAction {
    Draw {
        index: usize,
        #[serde(rename = "color")]
        previous_color: PixelColor,
    },
    Clear {
        #[serde(rename = "pixels")]
        previous_pixels: PixelBuffer,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryLog {
    actions: VecDeque<HistoryAction>,
}

impl HistoryLog {
    pub fn record(&mut self, action: HistoryAction) {
        self.actions.push_back(action);
        while self.actions.len() > HISTORY_CAP {
            self.actions.pop_front();
        }
    }

    /// Revert the most recent action on `grid`. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self, grid: &mut PixelGrid) -> bool {
        let Some(action) = self.actions.pop_back() else {
            return false;
        };
        match action {
            HistoryAction::Draw {
                index,
                previous_color,
            } => {
                if !grid.restore_pixel(index, previous_color) {
                    tracing::warn!(index, "undo target is outside the current grid");
                }
            }
            HistoryAction::Clear { previous_pixels } => grid.restore_buffer(&previous_pixels),
        }
        true
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryAction> {
        self.actions.back()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.actions).context("serialize history log")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let list: Vec<HistoryAction> =
            serde_json::from_str(raw).context("deserialize history log")?;
        let mut log = Self::default();
        for action in list {
            log.record(action);
        }
        Ok(log)
    }

    /// Like [`HistoryLog::from_json`] but corrupt data yields an empty log.
    pub fn from_json_or_empty(raw: &str) -> Self {
        Self::from_json(raw).unwrap_or_else(|err| {
            tracing::error!("discarding stored history: {err:#}");
            Self::default()
        })
    }
}
