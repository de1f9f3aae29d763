//! Module framework for SHELF: the `Module` lifecycle trait, the registry that
//! drives it, and layered settings.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
