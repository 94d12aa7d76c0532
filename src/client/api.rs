//! HTTP client for the books API.

use bookshelf_db::DocumentId;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::modules::books::models::{BookInput, BookRecord};
use crate::modules::books::query::SortKey;

/// Errors returned by [`BooksClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status
    #[error("server returned {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    /// The request could not be sent or the response could not be read
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// The `message` the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } => message.as_deref(),
            ClientError::Transport(_) => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
        }
    }
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// Search, genre, and sort as sent on a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    /// A genre name, or `all`
    pub genre: String,
    pub sort: SortKey,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            genre: crate::modules::books::query::ALL_GENRES.to_string(),
            sort: SortKey::Newest,
        }
    }
}

/// Thin typed wrapper over the REST endpoints.
#[derive(Debug, Clone)]
pub struct BooksClient {
    http: reqwest::Client,
    base_url: String,
}

impl BooksClient {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn books_url(&self) -> String {
        format!("{}/books", self.base_url)
    }

    fn book_url(&self, id: &DocumentId) -> String {
        format!("{}/books/{}", self.base_url, id)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<MessageBody>()
            .await
            .ok()
            .map(|body| body.message);
        Err(ClientError::Api { status, message })
    }

    pub async fn list(&self, query: &CatalogQuery) -> Result<Vec<BookRecord>, ClientError> {
        let response = self
            .http
            .get(self.books_url())
            .query(&[
                ("search", query.search.as_str()),
                ("genre", query.genre.as_str()),
                ("sort", query.sort.as_str()),
            ])
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn get(&self, id: &DocumentId) -> Result<BookRecord, ClientError> {
        let response = self.http.get(self.book_url(id)).send().await?;
        Self::decode(response).await
    }

    pub async fn create(&self, input: &BookInput) -> Result<BookRecord, ClientError> {
        let response = self.http.post(self.books_url()).json(input).send().await?;
        Self::decode(response).await
    }

    pub async fn update(&self, id: &DocumentId, input: &BookInput) -> Result<BookRecord, ClientError> {
        let response = self.http.put(self.book_url(id)).json(input).send().await?;
        Self::decode(response).await
    }

    /// Delete a book, returning the server's confirmation message.
    pub async fn delete(&self, id: &DocumentId) -> Result<String, ClientError> {
        let response = self.http.delete(self.book_url(id)).send().await?;
        Self::decode::<MessageBody>(response)
            .await
            .map(|body| body.message)
    }
}
