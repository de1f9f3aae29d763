use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_http::error::AppError;
use shelf_kernel::{InitCtx, Module};

use crate::state::AppState;

/// Genres module: the list of genre names offered for filtering and tagging
pub struct GenresModule {
    state: AppState,
}

impl GenresModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for GenresModule {
    fn name(&self) -> &'static str {
        "genres"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "genres module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_genres).post(create_genre))
            .route("/{name}", delete(delete_genre))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let genre = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/GenreName" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List genre names alphabetically",
                        "tags": ["Genres"],
                        "responses": {
                            "200": {
                                "description": "Genre names",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": { "type": "string" } }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Add a genre",
                        "tags": ["Genres"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/GenreName" }
                                }
                            }
                        },
                        "responses": {
                            "201": genre("Created genre"),
                            "409": error("Genre already exists"),
                            "422": error("Blank genre name")
                        }
                    }
                },
                "/{name}": {
                    "delete": {
                        "summary": "Remove a genre; books keep their genre",
                        "tags": ["Genres"],
                        "parameters": [{
                            "name": "name",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": genre("Removed genre"),
                            "404": error("Genre not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "GenreName": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } },
                        "required": ["name"]
                    }
                }
            }
        }))
    }
}

/// Create a new instance of the genres module
pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(GenresModule::new(state))
}

/// Body for creating a genre. `genre` is accepted as an alias of `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreName {
    #[serde(alias = "genre")]
    pub name: String,
}

async fn list_genres(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.list_genres().await)
}

async fn create_genre(
    State(state): State<AppState>,
    payload: Result<Json<GenreName>, JsonRejection>,
) -> Result<(StatusCode, Json<GenreName>), AppError> {
    let Json(body) = payload.map_err(|err| AppError::bad_request(err.body_text()))?;
    let name = state.catalog.create_genre(&body.name).await?;
    Ok((StatusCode::CREATED, Json(GenreName { name })))
}

async fn delete_genre(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GenreName>, AppError> {
    let name = state.catalog.delete_genre(&name).await?;
    Ok(Json(GenreName { name }))
}
