use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// What a module sees while the application boots.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// A feature area of the application: its HTTP surface plus lifecycle hooks.
///
/// The registry calls `init` on every module, then `start`, and on shutdown
/// `stop` in reverse registration order.
#[async_trait]
pub trait Module: Sync + Send {
    /// Registry key, also the last segment of the mount path.
    fn name(&self) -> &'static str;

    /// Where `routes` is nested on the server.
    fn mount_path(&self) -> String {
        format!("/api/{}", self.name())
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes relative to [`Module::mount_path`].
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI `paths` and `components.schemas`, paths relative to the mount path.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
