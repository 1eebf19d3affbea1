pub mod grid;
pub mod logging;
pub mod settings;
pub mod shortcut;
