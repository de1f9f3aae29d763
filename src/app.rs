use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::{modules, state::AppState};

/// Registry with every application module bound to `state`.
pub fn build_registry(state: &AppState) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state);
    registry
}

/// Initialize, seed and start all modules, serve HTTP until shutdown, then stop them.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::from_settings(&settings);
    let registry = build_registry(&state);
    let ctx = InitCtx {
        settings: &settings,
    };

    tracing::info!(
        env = ?settings.environment,
        core = registry.core_module_count(),
        custom = registry.custom_module_count(),
        "shelf bootstrap starting"
    );

    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;

    let seeded = registry.seed_all(&ctx).await?;
    tracing::info!(records = seeded, "seeding complete");

    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings)
        .await
        .context("HTTP server exited with an error");

    registry.stop_custom_modules().await?;
    registry.stop_core_modules().await?;

    tracing::info!("shelf shutdown complete");
    served
}
