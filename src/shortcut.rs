use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Backspace,
    Delete,
}

/// A key press as reported by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// Command key on macOS, Super/Windows elsewhere.
    pub meta: bool,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Shortcut {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        normalize(self.key) == normalize(event.key)
            && self.ctrl == event.ctrl
            && self.shift == event.shift
            && self.alt == event.alt
            && self.meta == event.meta
    }
}

fn normalize(key: Key) -> Key {
    match key {
        Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// Parse a chord like "Ctrl+Z" or "Cmd+Shift+Z" into a [`Shortcut`].
pub fn parse_shortcut(s: &str) -> Option<Shortcut> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut meta = false;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" | "OPTION" => alt = true,
            "CMD" | "COMMAND" | "META" | "SUPER" => meta = true,
            "" => {}
            _ => key = Some(parse_key(&upper)?),
        }
    }

    key.map(|key| Shortcut {
        key,
        ctrl,
        shift,
        alt,
        meta,
    })
}

fn parse_key(upper: &str) -> Option<Key> {
    match upper {
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "ENTER" | "RETURN" => Some(Key::Enter),
        "BACKSPACE" => Some(Key::Backspace),
        "DELETE" | "DEL" => Some(Key::Delete),
        _ => {
            let mut chars = upper.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Some(Key::Char(c)),
                _ => None,
            }
        }
    }
}

/// Undo bindings, built once and kept for the life of the process.
static UNDO_BINDINGS: Lazy<Vec<Shortcut>> = Lazy::new(|| {
    ["Ctrl+Z", "Cmd+Z"]
        .iter()
        .filter_map(|chord| parse_shortcut(chord))
        .collect()
});

pub fn undo_bindings() -> &'static [Shortcut] {
    &UNDO_BINDINGS
}

pub fn is_undo_chord(event: &KeyEvent) -> bool {
    UNDO_BINDINGS.iter().any(|binding| binding.matches(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifiers_and_key() {
        let shortcut = parse_shortcut("Cmd+Shift+z").expect("parse");
        assert_eq!(shortcut.key, Key::Char('Z'));
        assert!(shortcut.meta && shortcut.shift);
        assert!(!shortcut.ctrl && !shortcut.alt);
        assert_eq!(parse_shortcut("Ctrl+F13"), None);
        assert_eq!(parse_shortcut("Ctrl+"), None);
    }

    #[test]
    fn undo_matches_ctrl_or_cmd_z_only() {
        let mut event = KeyEvent::plain(Key::Char('z'));
        assert!(!is_undo_chord(&event));

        event.ctrl = true;
        assert!(is_undo_chord(&event));

        event.ctrl = false;
        event.meta = true;
        assert!(is_undo_chord(&event));

        event.shift = true;
        assert!(!is_undo_chord(&event));
        assert_eq!(undo_bindings().len(), 2);
    }
}
