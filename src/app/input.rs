use crate::domain::key::KeyInput;

/// Edits and movement inside an open palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteInput {
    Type(char),
    Backspace,
    SelectNext,
    SelectPrev,
    Execute,
}

/// Maps a key the shortcut matcher ignored while the palette is open.
#[must_use]
pub fn map_palette_key(input: &KeyInput) -> Option<PaletteInput> {
    match input.key.as_str() {
        "ArrowDown" => Some(PaletteInput::SelectNext),
        "ArrowUp" => Some(PaletteInput::SelectPrev),
        "Enter" => Some(PaletteInput::Execute),
        "Backspace" => Some(PaletteInput::Backspace),
        _ if input.has_command_modifier() => None,
        _ => input.printable().map(PaletteInput::Type),
    }
}
