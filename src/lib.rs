//! Shelf application library
//!
//! Book catalog, discovery pipeline, recommender, reading-status tracker and
//! dashboard statistics, packaged as kernel modules.

pub mod app;
pub mod modules;
pub mod state;
pub mod utils;

pub use state::AppState;
