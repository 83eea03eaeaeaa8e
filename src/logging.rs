//! Tracing setup for hosts embedding the palette.

use std::env;
use tracing_subscriber::EnvFilter;

/// Targets that make up this crate's own logs.
pub fn our_crates() -> &'static [&'static str] {
    &["caseos_palette", "palette_demo"]
}

/// Filter directive setting `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|target| format!("{target}={lvl}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Picks the filter directive: explicit `directive`, then `RUST_LOG`, then
/// crate-scoped `info`.
pub fn compute_spec(directive: Option<&str>) -> String {
    if let Some(spec) = directive {
        return spec.to_string();
    }
    env::var("RUST_LOG").unwrap_or_else(|_| level_spec_for("info"))
}

/// Installs a stderr subscriber. Returns `false` if one was already set.
pub fn init(directive: Option<&str>) -> bool {
    let filter = EnvFilter::new(compute_spec(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
