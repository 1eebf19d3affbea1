#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    /// Restoring persisted state. Config-change hooks are suppressed.
    Initializing,
    /// Waiting on device negotiation.
    Loading,
    Ready,
}

impl ControllerPhase {
    pub fn is_loading(self) -> bool {
        !matches!(self, Self::Ready)
    }
}

pub fn can_transition(from: ControllerPhase, to: ControllerPhase) -> bool {
    matches!(
        (from, to),
        (ControllerPhase::Initializing, ControllerPhase::Loading)
            | (ControllerPhase::Initializing, ControllerPhase::Ready)
            | (ControllerPhase::Loading, ControllerPhase::Ready)
            | (ControllerPhase::Ready, ControllerPhase::Loading)
    ) || from == to
}

/// Flags the UI shows next to the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusFlags {
    pub loading: bool,
    pub error: Option<String>,
    pub ignore_device: bool,
}

impl StatusFlags {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
