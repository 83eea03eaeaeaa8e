pub mod config;
pub mod engine;
pub mod filter;
pub mod input;
pub mod keymap;
pub mod recency;
pub mod registry;
pub mod state;
