pub mod dashboard;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;
use shelf_kernel::{InitCtx, Module};

use crate::state::AppState;
use dashboard::DashboardStats;

/// Stats module: dashboard figures over the whole catalog
pub struct StatsModule {
    state: AppState,
}

impl StatsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for StatsModule {
    fn name(&self) -> &'static str {
        "stats"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "stats module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(dashboard_stats))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let bucket = |props: serde_json::Value| json!({ "type": "object", "properties": props });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Dashboard statistics for the catalog",
                        "tags": ["Stats"],
                        "responses": {
                            "200": {
                                "description": "Aggregated figures",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/DashboardStats" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "DashboardStats": {
                        "type": "object",
                        "properties": {
                            "totalBooks": { "type": "integer" },
                            "totalPages": { "type": "integer" },
                            "averageRating": { "type": "number" },
                            "averagePages": { "type": "integer" },
                            "genreDistribution": {
                                "type": "array",
                                "items": bucket(json!({
                                    "name": { "type": "string" },
                                    "value": { "type": "integer" }
                                }))
                            },
                            "ratingDistribution": {
                                "type": "array",
                                "items": bucket(json!({
                                    "rating": { "type": "integer" },
                                    "count": { "type": "integer" }
                                }))
                            },
                            "yearlyData": {
                                "type": "array",
                                "items": bucket(json!({
                                    "year": { "type": "integer" },
                                    "books": { "type": "integer" },
                                    "pages": { "type": "integer" }
                                }))
                            },
                            "readingTimeHours": { "type": "integer" },
                            "mostReadGenre": { "type": "string" },
                            "statusCounts": {
                                "type": "array",
                                "items": bucket(json!({
                                    "status": { "type": "string" },
                                    "count": { "type": "integer" }
                                }))
                            },
                            "trackedStatusCounts": {
                                "type": "array",
                                "items": bucket(json!({
                                    "status": { "type": "string" },
                                    "count": { "type": "integer" }
                                }))
                            }
                        }
                    }
                }
            }
        }))
    }
}

/// Create a new instance of the stats module
pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(StatsModule::new(state))
}

async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let books = state.catalog.list().await;
    let statuses = state.status.snapshot().await;
    Json(dashboard::compute_stats(&books, &statuses))
}
