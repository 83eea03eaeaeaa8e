use crate::domain::ports::Router;
use anyhow::Result;
use tracing::info;

/// A router for hosts without real navigation: it logs the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRouter;

impl Router for TracingRouter {
    fn navigate(&self, path: &str) -> Result<()> {
        info!(path, "navigate");
        Ok(())
    }
}
