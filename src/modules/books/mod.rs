pub mod catalog;
pub mod discovery;
pub mod models;
pub mod recommend;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::{routing::get, Router};
use serde_json::json;
use shelf_kernel::{InitCtx, Module};

use crate::state::AppState;
use models::Book;

/// Books module: catalog CRUD, discovery and recommendations
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            default_k = self.state.recommend_k,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_books).post(routes::create_book))
            .route("/health", get(routes::health_check))
            .route(
                "/{id}",
                get(routes::get_book)
                    .patch(routes::update_book)
                    .put(routes::update_book)
                    .delete(routes::delete_book),
            )
            .route("/{id}/recommendations", get(routes::recommendations))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    /// Load the seed file into an empty catalog
    async fn seed(&self, ctx: &InitCtx<'_>) -> anyhow::Result<usize> {
        let Some(path) = ctx.settings.storage.seed_path.as_deref() else {
            return Ok(0);
        };
        if !self.state.catalog.is_empty().await {
            tracing::info!(module = self.name(), "catalog already populated, skipping seed");
            return Ok(0);
        }

        let books: Vec<Book> = shelf_db::snapshot::load_json(path)
            .await
            .with_context(|| format!("failed to load seed catalog from {path}"))?;

        let mut loaded = 0;
        for book in books {
            let id = book.id.clone();
            match self.state.catalog.import(book).await {
                Ok(_) => loaded += 1,
                Err(err) => tracing::warn!(book_id = %id, error = %err, "skipping seed book"),
            }
        }

        Ok(loaded)
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let books = self.state.catalog.len().await;
        tracing::info!(
            module = self.name(),
            books = books,
            "books module stopped"
        );
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(state))
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });
    let query_param = |name: &str, description: &str| {
        json!({
            "name": name,
            "in": "query",
            "required": false,
            "description": description,
            "schema": { "type": "string" }
        })
    };
    let book_body = |schema: &str| {
        json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{schema}") }
                }
            }
        })
    };
    let update = json!({
        "summary": "Update a book (partial)",
        "tags": ["Books"],
        "parameters": [id_param.clone()],
        "requestBody": book_body("BookPatch"),
        "responses": {
            "200": book_response("Updated book"),
            "404": error_response("Book not found"),
            "422": error_response("Validation error")
        }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "Search, filter and sort the catalog",
                    "tags": ["Books"],
                    "parameters": [
                        query_param("term", "Case-insensitive substring of title, author, genre, year, pages or synopsis"),
                        query_param("genre", "Exact genre name"),
                        query_param("status", "Tracked reading status, or 'sem status'"),
                        query_param("minRating", "Minimum rating (1-5)"),
                        query_param("sort", "title | author | year | rating | pages"),
                        query_param("direction", "asc | desc")
                    ],
                    "responses": {
                        "200": {
                            "description": "Matching books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        }
                    }
                },
                "post": {
                    "summary": "Add a book",
                    "tags": ["Books"],
                    "requestBody": book_body("NewBook"),
                    "responses": {
                        "201": book_response("Created book"),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get one book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found")
                    }
                },
                "patch": update.clone(),
                "put": update,
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": book_response("Deleted book"),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/{id}/recommendations": {
                "get": {
                    "summary": "Related books",
                    "tags": ["Books"],
                    "parameters": [
                        id_param,
                        {
                            "name": "k",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "integer", "minimum": 0 }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "Recommendations, best first; may be empty",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Recommendation" }
                                    }
                                }
                            }
                        },
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "GenreRef": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" }
                    },
                    "required": ["id", "name"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "coverUrl": { "type": "string" },
                        "genre": {
                            "oneOf": [
                                { "type": "string" },
                                { "$ref": "#/components/schemas/GenreRef" }
                            ],
                            "nullable": true
                        },
                        "year": { "type": "integer", "nullable": true },
                        "pages": { "type": "integer", "minimum": 1, "nullable": true },
                        "currentPage": { "type": "integer", "minimum": 0, "nullable": true },
                        "rating": { "type": "integer", "minimum": 1, "maximum": 5, "nullable": true },
                        "synopsis": { "type": "string", "nullable": true },
                        "isbn": { "type": "string", "nullable": true },
                        "notes": { "type": "string", "nullable": true },
                        "status": {
                            "type": "string",
                            "enum": ["quero ler", "lendo", "lido", "pausado", "abandonado"],
                            "nullable": true
                        },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "title", "author", "coverUrl", "createdAt", "updatedAt"]
                },
                "NewBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "coverUrl": { "type": "string" },
                        "genre": { "type": "string" },
                        "year": { "type": "integer" },
                        "pages": { "type": "integer" },
                        "currentPage": { "type": "integer" },
                        "rating": { "type": "integer" },
                        "synopsis": { "type": "string" },
                        "isbn": { "type": "string" },
                        "notes": { "type": "string" },
                        "status": { "type": "string" }
                    },
                    "required": ["title", "author"]
                },
                "BookPatch": {
                    "type": "object",
                    "description": "Any subset of NewBook fields; null clears an optional field"
                },
                "Recommendation": {
                    "type": "object",
                    "properties": {
                        "book": { "$ref": "#/components/schemas/Book" },
                        "score": { "type": "integer" },
                        "reason": { "type": "string" }
                    },
                    "required": ["book", "score", "reason"]
                }
            }
        }
    })
}
