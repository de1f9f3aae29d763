use std::sync::Arc;

use shelf_kernel::settings::Settings;

use crate::modules::books::catalog::Catalog;
use crate::modules::status::tracker::StatusTracker;

/// Shared handles passed to every module's routes.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub status: Arc<StatusTracker>,
    /// Recommendations returned when the request does not ask for a count.
    pub recommend_k: usize,
}

impl AppState {
    pub fn new(catalog: Catalog, status: StatusTracker, recommend_k: usize) -> Self {
        Self {
            catalog: Arc::new(catalog),
            status: Arc::new(status),
            recommend_k,
        }
    }

    /// In-memory catalog plus the status file named in settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Catalog::in_memory(),
            StatusTracker::new(&settings.storage.status_path),
            settings.recommend.default_k,
        )
    }
}
