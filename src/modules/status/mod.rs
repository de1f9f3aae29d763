pub mod tracker;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_http::error::{AppError, FieldError};
use shelf_kernel::{InitCtx, Module};

use crate::modules::books::models::{ReadingStatus, StatusMap};
use crate::state::AppState;

/// Status module: per-book reading status kept beside the catalog
pub struct StatusModule {
    state: AppState,
}

impl StatusModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for StatusModule {
    fn name(&self) -> &'static str {
        "status"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let tracked = self.state.status.snapshot().await.len();
        tracing::info!(
            module = self.name(),
            path = %self.state.status.path().display(),
            tracked,
            "status module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(all_statuses))
            .route("/{id}", get(get_status).put(set_status))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });
        let entry = json!({
            "description": "Status entry",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookStatus" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "All tracked reading statuses by book id",
                        "tags": ["Status"],
                        "responses": {
                            "200": {
                                "description": "Map of book id to status",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "additionalProperties": { "type": "string" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Tracked status of one book",
                        "tags": ["Status"],
                        "parameters": [id_param.clone()],
                        "responses": { "200": entry.clone() }
                    },
                    "put": {
                        "summary": "Set or clear the tracked status of one book",
                        "tags": ["Status"],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/StatusUpdate" }
                                }
                            }
                        },
                        "responses": {
                            "200": entry,
                            "422": {
                                "description": "Unknown status label",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookStatus": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "status": { "type": "string", "nullable": true }
                        },
                        "required": ["id"]
                    },
                    "StatusUpdate": {
                        "type": "object",
                        "properties": {
                            "status": { "type": "string", "nullable": true }
                        }
                    }
                }
            }
        }))
    }
}

/// Create a new instance of the status module
pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(StatusModule::new(state))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookStatus {
    pub id: String,
    pub status: Option<ReadingStatus>,
}

/// `status: null` (or missing) clears the entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<String>,
}

async fn all_statuses(State(state): State<AppState>) -> Json<StatusMap> {
    Json(state.status.snapshot().await)
}

async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Json<BookStatus> {
    let status = state.status.get_status(&id).await;
    Json(BookStatus { id, status })
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<BookStatus>, AppError> {
    let Json(update) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;

    let status = match update.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(label) => Some(label.parse::<ReadingStatus>().map_err(|err| {
            AppError::invalid_fields(
                &[FieldError::new("status", err.to_string())],
                "reading status is invalid",
            )
        })?),
    };

    state.status.set_status(&id, status).await;
    Ok(Json(BookStatus { id, status }))
}
