use crate::domain::command::Command;
use crate::domain::key::KeyInput;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::trace;

/// Key that opens and closes the palette together with ctrl or meta.
pub const TOGGLE_KEY: &str = "k";
pub const ESCAPE_KEY: &str = "Escape";

/// What a key press means to the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDecision {
    ToggleOpen,
    Close,
    InvokeCommand(String),
    Ignore,
}

impl KeyDecision {
    /// Whether the host should suppress the key's default handling.
    #[must_use]
    pub fn consumes_event(&self) -> bool {
        matches!(self, KeyDecision::ToggleOpen | KeyDecision::InvokeCommand(_))
    }
}

/// Maps a key press and the palette's visibility to a decision.
///
/// Rules apply in order: ctrl/meta+`k` toggles regardless of state; Escape
/// closes an open palette; while closed, ctrl/meta plus a key bound as a
/// single-key shortcut invokes that command. Everything else is ignored.
#[must_use]
pub fn match_shortcut(input: &KeyInput, open: bool, commands: &[Command]) -> KeyDecision {
    if input.has_command_modifier() && input.key == TOGGLE_KEY {
        return KeyDecision::ToggleOpen;
    }

    if open && input.key == ESCAPE_KEY {
        return KeyDecision::Close;
    }

    if !open && input.has_command_modifier() {
        if let Some(cmd) = shortcut_target(&input.key, commands) {
            return KeyDecision::InvokeCommand(cmd.id().to_string());
        }
    }

    trace!(key = %input.key, open, "key ignored");
    KeyDecision::Ignore
}

/// The first command whose single-key shortcut is `key`.
///
/// Ids are not unique when duplicates are kept, so callers that need the
/// matched command itself should take it from here rather than by id.
#[must_use]
pub fn shortcut_target<'a>(key: &str, commands: &'a [Command]) -> Option<&'a Command> {
    commands.iter().find(|cmd| {
        cmd.shortcut()
            .is_some_and(|shortcut| shortcut.matches_key(key))
    })
}

fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(c) => return Some(c.to_string()),
        KeyCode::Esc => "Escape",
        KeyCode::Enter => "Enter",
        KeyCode::Backspace => "Backspace",
        KeyCode::Tab => "Tab",
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Delete => "Delete",
        _ => return None,
    };
    Some(name.to_string())
}

/// Converts a terminal key event. Releases and unnamed keys yield `None`.
#[must_use]
pub fn key_input_from_event(event: KeyEvent) -> Option<KeyInput> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    Some(KeyInput {
        key: key_name(event.code)?,
        meta: event
            .modifiers
            .intersects(KeyModifiers::SUPER | KeyModifiers::META),
        ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
    })
}
