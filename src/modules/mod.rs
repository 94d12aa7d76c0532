pub mod books;

use std::sync::Arc;

use bookshelf_kernel::ModuleRegistry;

use books::models::BookStore;

/// Register all catalog modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: Arc<BookStore>) -> anyhow::Result<()> {
    registry.register(books::create_module(store))
}
