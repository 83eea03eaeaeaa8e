use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaletteError>;

#[derive(Debug, Error)]
pub enum PaletteError {
    /// Two commands in the registry share an id and the policy is `reject`.
    #[error("duplicate command id '{id}'")]
    DuplicateCommandId { id: String },

    #[error("unknown command '{id}'")]
    UnknownCommand { id: String },

    /// A selection was made while the palette is not showing.
    #[error("command palette is closed")]
    PaletteClosed,

    /// The engine already holds a key subscription.
    #[error("a key event source is already attached")]
    AlreadyAttached,

    /// The command's action failed. The palette has already closed, and when
    /// this comes from a key press that key was consumed.
    #[error("command '{id}' failed: {source}")]
    Action {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid config at {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
