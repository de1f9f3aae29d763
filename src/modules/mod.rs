pub mod books;
pub mod genres;
pub mod stats;
pub mod status;

use shelf_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register every application module with the registry.
///
/// Genres and status are core: books and stats read from them.
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register_core(genres::create_module(state.clone()));
    registry.register_core(status::create_module(state.clone()));
    registry.register_custom(books::create_module(state.clone()));
    registry.register_custom(stats::create_module(state.clone()));
}
