//! Bookshelf application library
//!
//! The catalog API module served by the HTTP layer, and the client used by the
//! CLI to drive it.

pub mod client;
pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use modules::books::models::BookStore;

/// Open the book store described by `settings`.
pub async fn open_store(settings: &Settings) -> anyhow::Result<Arc<BookStore>> {
    let store = BookStore::open_or_in_memory(settings.database.data_path.as_deref())
        .await
        .with_context(|| "failed to open book store")?;

    if settings.database.data_path.is_none() {
        tracing::warn!("no database.data_path configured; books are kept in memory only");
    }

    Ok(Arc::new(store))
}

/// Build a registry with every catalog module registered over `store`.
pub fn registry(store: Arc<BookStore>) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store)?;
    Ok(registry)
}

/// Run the API server until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = open_store(&settings).await?;
    let registry = registry(store)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}
