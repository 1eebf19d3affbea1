use crate::grid::color::PixelColor;

pub const DEFAULT_GRID_WIDTH: usize = 16;
pub const DEFAULT_GRID_HEIGHT: usize = 16;
pub const DEFAULT_CELL_SIZE: u32 = 20;
pub const DEFAULT_DEBOUNCE_DELAY_MS: u64 = 100;
/// Largest accepted width or height. Keeps `width * height` small enough to
/// allocate and well clear of overflow.
pub const MAX_GRID_DIMENSION: usize = 256;

/// Row-major pixel colors for the whole grid.
pub type PixelBuffer = Vec<PixelColor>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    /// On-screen size of one cell. Never sent to the device.
    pub cell_size: u32,
    pub debounce_delay_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            cell_size: DEFAULT_CELL_SIZE,
            debounce_delay_ms: DEFAULT_DEBOUNCE_DELAY_MS,
        }
    }
}

impl GridConfig {
    pub fn len(&self) -> usize {
        grid_len(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_of(&self, row: usize, column: usize) -> Option<usize> {
        (row < self.height && column < self.width).then(|| row * self.width + column)
    }

    pub fn with_dimensions(mut self, width: usize, height: usize) -> Self {
        self.width = clamp_dimension(width);
        self.height = clamp_dimension(height);
        self
    }
}

pub fn is_supported_dimension(value: usize) -> bool {
    (1..=MAX_GRID_DIMENSION).contains(&value)
}

/// Clamp a width or height into `1..=MAX_GRID_DIMENSION`.
pub fn clamp_dimension(value: usize) -> usize {
    if value > MAX_GRID_DIMENSION {
        tracing::warn!(
            value,
            max = MAX_GRID_DIMENSION,
            "clamping oversized grid dimension"
        );
    }
    value.clamp(1, MAX_GRID_DIMENSION)
}

/// Cell count for clamped dimensions.
pub fn grid_len(width: usize, height: usize) -> usize {
    width
        .checked_mul(height)
        .unwrap_or(MAX_GRID_DIMENSION * MAX_GRID_DIMENSION)
}

/// Copy `source` position-wise into a buffer of exactly `len` entries,
/// truncating extra entries and padding missing ones with black.
pub fn fit_to_len(source: &[PixelColor], len: usize) -> PixelBuffer {
    let mut fitted: PixelBuffer = source.iter().copied().take(len).collect();
    fitted.resize(len, PixelColor::BLACK);
    fitted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_truncates_and_pads() {
        let red = PixelColor::rgb(255, 0, 0);
        assert_eq!(fit_to_len(&[red, red, red], 2), vec![red, red]);
        assert_eq!(
            fit_to_len(&[red], 3),
            vec![red, PixelColor::BLACK, PixelColor::BLACK]
        );
    }

    #[test]
    fn dimensions_are_clamped_to_supported_range() {
        let config = GridConfig::default().with_dimensions(0, usize::MAX);
        assert_eq!((config.width, config.height), (1, MAX_GRID_DIMENSION));
        assert_eq!(config.len(), MAX_GRID_DIMENSION);
        assert!(!is_supported_dimension(MAX_GRID_DIMENSION + 1));
        assert!(is_supported_dimension(MAX_GRID_DIMENSION));
    }

    #[test]
    fn index_is_row_major() {
        let config = GridConfig::default().with_dimensions(4, 3);
        assert_eq!(config.index_of(0, 0), Some(0));
        assert_eq!(config.index_of(2, 1), Some(9));
        assert_eq!(config.index_of(3, 0), None);
        assert_eq!(config.index_of(0, 4), None);
    }

    #[test]
    fn dimensions_are_clamped_to_one() {
        let config = GridConfig::default().with_dimensions(0, 0);
        assert_eq!((config.width, config.height), (1, 1));
        assert_eq!(config.len(), 1);
    }
}
