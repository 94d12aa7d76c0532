pub mod models;
pub mod query;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

use models::BookStore;

/// The book catalog API, mounted under `/api/books`.
pub struct BooksModule {
    store: Arc<BookStore>,
}

impl BooksModule {
    pub fn new(store: Arc<BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = self.store.len().await;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            books,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
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

fn book_body() -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookInput" }
            }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn query_parameter(name: &str, description: &str) -> serde_json::Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": { "type": "string" }
    })
}

/// OpenAPI fragment for the books API; paths are relative to `/api/books`.
fn openapi() -> serde_json::Value {
    let book_fields = json!({
        "title": { "type": "string" },
        "author": { "type": "string" },
        "genre": { "type": "string" },
        "publishedYear": { "type": "integer", "minimum": validation::MIN_PUBLISHED_YEAR },
        "isbn": { "type": "string", "description": "Unique across the catalog" },
        "description": { "type": "string" },
        "rating": {
            "type": "integer",
            "minimum": validation::MIN_RATING,
            "maximum": validation::MAX_RATING,
            "default": models::DEFAULT_RATING
        },
        "coverImage": { "type": "string", "default": models::DEFAULT_COVER_IMAGE }
    });

    let mut record_fields = book_fields.clone();
    record_fields["_id"] = json!({ "type": "string", "description": "Store-assigned key" });
    record_fields["createdAt"] = json!({ "type": "string", "format": "date-time" });
    record_fields["updatedAt"] = json!({ "type": "string", "format": "date-time" });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        query_parameter("search", "Case-insensitive substring of title or author"),
                        query_parameter("genre", "Exact genre, or `all`"),
                        query_parameter("sort", "title | author | year | rating | newest (default)")
                    ],
                    "responses": {
                        "200": {
                            "description": "Matching books in the requested order",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Store unavailable")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body(),
                    "responses": {
                        "201": book_response("The created book"),
                        "400": error_response("Validation failure or duplicate ISBN")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Update a book (full or partial)",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": book_body(),
                    "responses": {
                        "200": book_response("The updated book"),
                        "400": error_response("Validation failure or duplicate ISBN"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": {
                            "description": "Deleted",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "message": { "type": "string" } },
                                        "required": ["message"]
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
                "Book": {
                    "type": "object",
                    "properties": record_fields,
                    "required": ["_id", "title", "author", "genre", "publishedYear", "isbn",
                                 "rating", "coverImage", "createdAt", "updatedAt"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": book_fields
                }
            }
        }
    })
}

/// Create the books module over `store`
pub fn create_module(store: Arc<BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_kernel::settings::Settings;

    #[tokio::test]
    async fn init_runs_on_a_spawned_task() {
        let module = create_module(Arc::new(BookStore::in_memory()));

        let handle = tokio::spawn(async move {
            let settings = Settings::default();
            module.init(&InitCtx { settings: &settings }).await
        });

        handle.await.unwrap().unwrap();
    }

    #[test]
    fn openapi_describes_every_operation() {
        let spec = openapi();

        for (path, method) in [
            ("/", "get"),
            ("/", "post"),
            ("/{id}", "get"),
            ("/{id}", "put"),
            ("/{id}", "delete"),
        ] {
            assert!(
                spec["paths"][path][method].is_object(),
                "missing {method} {path}"
            );
        }
        assert_eq!(
            spec["components"]["schemas"]["Book"]["properties"]["rating"]["maximum"],
            5
        );
    }
}
