use crate::grid::color::PixelColor;
use crate::grid::history::HistoryAction;
use crate::grid::model::{clamp_dimension, fit_to_len, grid_len, PixelBuffer};

/// Authoritative pixel buffer. The buffer length always equals
/// `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: PixelBuffer,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize) -> Self {
        let mut grid = Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
        grid.setup(width, height, None);
        grid
    }

    /// Re-derive the buffer for new dimensions, seeding it position-wise from
    /// `seed` when given. Missing positions are black.
    pub fn setup(&mut self, width: usize, height: usize, seed: Option<&[PixelColor]>) {
        self.width = clamp_dimension(width);
        self.height = clamp_dimension(height);
        let len = self.len();
        if let Some(seed) = seed {
            if seed.len() != len {
                tracing::debug!(
                    stored = seed.len(),
                    expected = len,
                    "reconciling stored pixels with grid size"
                );
            }
        }
        self.pixels = fit_to_len(seed.unwrap_or(&[]), len);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        grid_len(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[PixelColor] {
        &self.pixels
    }

    pub fn get(&self, index: usize) -> Option<PixelColor> {
        self.pixels.get(index).copied()
    }

    /// Overwrite one cell. Returns the inverse action, or `None` when the
    /// color is unchanged or the index is outside the grid.
    pub fn set_pixel(&mut self, index: usize, color: PixelColor) -> Option<HistoryAction> {
        let Some(slot) = self.pixels.get_mut(index) else {
            tracing::warn!(index, len = self.len(), "ignoring pixel update outside grid");
            return None;
        };
        if *slot == color {
            return None;
        }
        let previous_color = std::mem::replace(slot, color);
        Some(HistoryAction::Draw {
            index,
            previous_color,
        })
    }

    /// Replace the whole buffer, fitting `pixels` to the grid size.
    pub fn replace_all(&mut self, pixels: &[PixelColor]) -> HistoryAction {
        let fitted = fit_to_len(pixels, self.len());
        let previous_pixels = std::mem::replace(&mut self.pixels, fitted);
        HistoryAction::Clear { previous_pixels }
    }

    pub fn clear(&mut self) -> HistoryAction {
        let black = vec![PixelColor::BLACK; self.len()];
        let previous_pixels = std::mem::replace(&mut self.pixels, black);
        HistoryAction::Clear { previous_pixels }
    }

    pub(crate) fn restore_pixel(&mut self, index: usize, color: PixelColor) -> bool {
        match self.pixels.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    pub(crate) fn restore_buffer(&mut self, snapshot: &[PixelColor]) {
        if snapshot.len() != self.len() {
            tracing::warn!(
                snapshot = snapshot.len(),
                expected = self.len(),
                "restoring snapshot taken for a different grid size"
            );
        }
        self.pixels = fit_to_len(snapshot, self.len());
    }
}
