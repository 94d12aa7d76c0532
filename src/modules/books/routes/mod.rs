//! HTTP handlers for `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookshelf_db::{DocumentId, StoreError};
use bookshelf_http::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::models::{BookInput, BookRecord, BookStore};
use super::query::{BookQuery, ListParams};

pub const NOT_FOUND_MESSAGE: &str = "Book not found";
pub const DUPLICATE_ISBN_MESSAGE: &str = "ISBN already exists";
pub const DELETED_MESSAGE: &str = "Book deleted successfully";

/// Body returned by a successful delete.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResponse {
    pub message: String,
}

/// Build the books router with its store attached.
pub fn router(store: Arc<BookStore>) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

/// Translate store failures into API errors.
fn store_error(err: StoreError) -> AppError {
    match err {
        StoreError::Validation(errors) => {
            let details = errors
                .iter()
                .map(|e| json!({ "field": e.field, "message": e.message }))
                .collect();
            AppError::validation(details, errors.to_string())
        }
        StoreError::Duplicate { field, value } => {
            let message = if field == "isbn" {
                DUPLICATE_ISBN_MESSAGE.to_string()
            } else {
                format!("{field} already exists")
            };
            AppError::conflict(vec![json!({ "field": field, "value": value })], message)
        }
        StoreError::NotFound(_) => AppError::not_found(NOT_FOUND_MESSAGE),
        other => AppError::Internal(anyhow::Error::new(other).context("book store failure")),
    }
}

/// Malformed keys are reported exactly like unknown ones.
fn parse_id(raw: &str) -> Result<DocumentId, AppError> {
    DocumentId::parse(raw).ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))
}

fn parse_body(payload: Result<Json<BookInput>, JsonRejection>) -> Result<BookInput, AppError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| AppError::validation(vec![], rejection.body_text()))
}

/// `GET /api/books?search=&genre=&sort=`
async fn list_books(
    State(store): State<Arc<BookStore>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<BookRecord>> {
    let query = BookQuery::from_params(&params);
    let books = store
        .find(|book| query.matches(book), |a, b| query.compare(a, b))
        .await;

    tracing::debug!(
        search = ?params.search,
        genre = ?params.genre,
        sort = query.sort.as_str(),
        count = books.len(),
        "listed books"
    );

    Json(books)
}

/// `GET /api/books/{id}`
async fn get_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
) -> Result<Json<BookRecord>, AppError> {
    let id = parse_id(&id)?;
    store.get(&id).await.map(Json).map_err(store_error)
}

/// `POST /api/books`
async fn create_book(
    State(store): State<Arc<BookStore>>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<(StatusCode, Json<BookRecord>), AppError> {
    let book = parse_body(payload)?
        .into_book()
        .map_err(|errors| store_error(StoreError::Validation(errors)))?;

    let record = store.insert(book).await.map_err(store_error)?;
    tracing::info!(id = %record.id, isbn = %record.doc.isbn, "book created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /api/books/{id}` with a full or partial body.
async fn update_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
    payload: Result<Json<BookInput>, JsonRejection>,
) -> Result<Json<BookRecord>, AppError> {
    let id = parse_id(&id)?;
    let input = parse_body(payload)?;

    let record = store
        .update(&id, |book| input.apply_to(book))
        .await
        .map_err(store_error)?;
    tracing::info!(id = %record.id, "book updated");

    Ok(Json(record))
}

/// `DELETE /api/books/{id}`
async fn delete_book(
    State(store): State<Arc<BookStore>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_id(&id)?;
    store.remove(&id).await.map_err(store_error)?;
    tracing::info!(id = %id, "book deleted");

    Ok(Json(DeleteResponse {
        message: DELETED_MESSAGE.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn duplicate_isbn_maps_to_conflict() {
        let err = store_error(StoreError::Duplicate {
            field: "isbn",
            value: "111".to_string(),
        });

        match err {
            AppError::Conflict { message, details, .. } => {
                assert_eq!(message, DUPLICATE_ISBN_MESSAGE);
                assert_eq!(details[0]["value"], "111");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn unavailable_store_maps_to_internal() {
        let err = store_error(StoreError::Unavailable {
            path: PathBuf::from("/data/books.json"),
            source: std::io::Error::other("disk gone"),
        });

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn malformed_key_is_not_found() {
        let err = parse_id("not-a-key").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
