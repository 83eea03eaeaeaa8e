/// A key press as the palette sees it: the key name plus the two modifiers
/// that matter. Printable keys are their character (`"k"`, `"?"`), named keys
/// use DOM-style names (`"Escape"`, `"Enter"`, `"ArrowDown"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub key: String,
    pub meta: bool,
    pub ctrl: bool,
}

impl KeyInput {
    pub fn plain(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            meta: false,
            ctrl: false,
        }
    }

    pub fn ctrl(key: impl Into<String>) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn meta(key: impl Into<String>) -> Self {
        Self {
            meta: true,
            ..Self::plain(key)
        }
    }

    /// Ctrl on Linux/Windows, Cmd on macOS.
    #[must_use]
    pub fn has_command_modifier(&self) -> bool {
        self.meta || self.ctrl
    }

    /// The character this key types, if it is a single printable one.
    #[must_use]
    pub fn printable(&self) -> Option<char> {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Some(c),
            _ => None,
        }
    }
}
