use crate::grid::color::PixelColor;
use crate::grid::state::StatusFlags;

/// Notification sent to subscribers after the controller state changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    Pixels,
    Dimensions { width: usize, height: usize },
    Palette,
    CurrentColor { color: PixelColor },
    DebounceDelay { delay_ms: u64 },
    History { len: usize },
    Status(StatusFlags),
    Endpoint { endpoint: Option<String> },
}
