//! Keyboard-driven command palette: a command registry, a shortcut matcher,
//! a query filter, a bounded recency list, and the engine that ties them
//! together.

pub mod app;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;

pub use app::config::PaletteConfig;
pub use app::engine::{EngineDeps, KeyOutcome, PaletteEngine};
pub use domain::command::{Command, CommandAction, CommandGroup, Shortcut};
pub use domain::key::KeyInput;
pub use error::{PaletteError, Result};
