//! Client-side catalog state and the rules for reconciling it with responses.

use std::time::{Duration, Instant};

use bookshelf_db::DocumentId;

use super::api::{CatalogQuery, ClientError};
use super::notifications::Notifications;
use crate::modules::books::models::BookRecord;
use crate::modules::books::query::SortKey;

pub const FETCH_FAILED: &str = "Failed to fetch books. Please try again.";
pub const ADDED: &str = "Book added successfully!";
pub const UPDATED: &str = "Book updated successfully!";
pub const DELETED: &str = "Book deleted successfully!";
pub const ADD_FAILED: &str = "Failed to add book";
pub const UPDATE_FAILED: &str = "Failed to update book";
pub const DELETE_FAILED: &str = "Failed to delete book";
pub const LOAD_FAILED: &str = "Failed to load book";

/// Handle for one list fetch.
///
/// Every call to [`CatalogState::begin_fetch`] supersedes the tickets issued
/// before it; only the newest ticket's response is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub query: CatalogQuery,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Everything the catalog view renders from.
#[derive(Debug, Clone)]
pub struct CatalogState {
    books: Vec<BookRecord>,
    loading: bool,
    editing: Option<BookRecord>,
    query: CatalogQuery,
    notifications: Notifications,
    latest_fetch: u64,
}

fn failure_message(err: &ClientError, fallback: &str) -> String {
    err.server_message().unwrap_or(fallback).to_string()
}

impl CatalogState {
    pub fn new(notification_ttl: Duration) -> Self {
        Self {
            books: Vec::new(),
            loading: false,
            editing: None,
            query: CatalogQuery::default(),
            notifications: Notifications::new(notification_ttl),
            latest_fetch: 0,
        }
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn editing(&self) -> Option<&BookRecord> {
        self.editing.as_ref()
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    /// Whether a search or genre filter narrows the list.
    pub fn is_filtered(&self) -> bool {
        !self.query.search.is_empty()
            || self.query.genre != crate::modules::books::query::ALL_GENRES
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_genre(&mut self, genre: impl Into<String>) {
        self.query.genre = genre.into();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.query.sort = sort;
    }

    pub fn set_query(&mut self, query: CatalogQuery) {
        self.query = query;
    }

    /// Start a list fetch for the current query.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_fetch += 1;
        self.loading = true;
        FetchTicket {
            generation: self.latest_fetch,
            query: self.query.clone(),
        }
    }

    /// Apply a list response. Returns false, changing nothing, when the
    /// ticket has been superseded.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<BookRecord>, ClientError>,
        now: Instant,
    ) -> bool {
        if ticket.generation != self.latest_fetch {
            tracing::debug!(
                generation = ticket.generation,
                latest = self.latest_fetch,
                "discarding stale book list"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(books) => self.books = books,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch books");
                self.notifications.error(FETCH_FAILED, now);
            }
        }
        true
    }

    /// Prepend a created book.
    pub fn book_created(&mut self, result: Result<BookRecord, ClientError>, now: Instant) {
        match result {
            Ok(book) => {
                self.books.insert(0, book);
                self.notifications.success(ADDED, now);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to add book");
                self.notifications.error(failure_message(&e, ADD_FAILED), now);
            }
        }
    }

    /// Replace the updated book in place.
    pub fn book_updated(&mut self, result: Result<BookRecord, ClientError>, now: Instant) {
        match result {
            Ok(book) => {
                if let Some(slot) = self.books.iter_mut().find(|b| b.id == book.id) {
                    *slot = book;
                }
                self.notifications.success(UPDATED, now);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to update book");
                self.notifications.error(failure_message(&e, UPDATE_FAILED), now);
            }
        }
    }

    /// Drop a deleted book from the list.
    pub fn book_deleted(&mut self, id: &DocumentId, result: Result<String, ClientError>, now: Instant) {
        match result {
            Ok(_) => {
                self.books.retain(|b| b.id != *id);
                self.notifications.success(DELETED, now);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to delete book");
                self.notifications.error(failure_message(&e, DELETE_FAILED), now);
            }
        }
    }

    /// Record a failed single-book load.
    pub fn load_failed(&mut self, err: &ClientError, now: Instant) {
        tracing::warn!(error = %err, "failed to load book");
        self.notifications.error(failure_message(err, LOAD_FAILED), now);
    }

    pub fn begin_edit(&mut self, book: BookRecord) {
        self.editing = Some(book);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::notifications::NotificationKind;
    use crate::modules::books::models::{Book, BookStore, DEFAULT_COVER_IMAGE};
    use reqwest::StatusCode;

    const TTL: Duration = Duration::from_secs(4);

    async fn records(titles: &[&str]) -> Vec<BookRecord> {
        let store = BookStore::in_memory();
        let mut out = Vec::new();
        for (i, title) in titles.iter().enumerate() {
            let book = Book {
                title: title.to_string(),
                author: "Author".to_string(),
                genre: "Fiction".to_string(),
                published_year: 2000,
                isbn: format!("isbn-{i}"),
                description: None,
                rating: 3,
                cover_image: DEFAULT_COVER_IMAGE.to_string(),
            };
            out.push(store.insert(book).await.unwrap());
        }
        out
    }

    fn api_error(message: Option<&str>) -> ClientError {
        ClientError::Api {
            status: StatusCode::BAD_REQUEST,
            message: message.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn stale_fetch_never_overwrites_newer_view() {
        let mut state = CatalogState::new(TTL);
        let now = Instant::now();

        state.set_search("d");
        let stale = state.begin_fetch();
        state.set_search("dune");
        let fresh = state.begin_fetch();
        assert!(fresh.generation() > stale.generation());
        assert_eq!(fresh.query.search, "dune");

        let fresh_books = records(&["Dune"]).await;
        assert!(state.finish_fetch(fresh, Ok(fresh_books.clone()), now));
        assert!(!state.is_loading());

        // The older request answers last and is ignored.
        let stale_books = records(&["Dune", "Dracula"]).await;
        assert!(!state.finish_fetch(stale, Ok(stale_books), now));
        assert_eq!(state.books(), fresh_books.as_slice());
    }

    #[tokio::test]
    async fn loading_stays_set_until_latest_fetch_settles() {
        let mut state = CatalogState::new(TTL);
        let now = Instant::now();

        let first = state.begin_fetch();
        let second = state.begin_fetch();

        assert!(!state.finish_fetch(first, Ok(Vec::new()), now));
        assert!(state.is_loading());
        assert!(state.finish_fetch(second, Ok(Vec::new()), now));
        assert!(!state.is_loading());
    }

    #[test]
    fn failed_fetch_keeps_books_and_notifies() {
        let mut state = CatalogState::new(TTL);
        let ticket = state.begin_fetch();

        state.finish_fetch(ticket, Err(api_error(None)), Instant::now());

        assert!(!state.is_loading());
        let latest = state.notifications().latest().unwrap();
        assert_eq!(latest.kind, NotificationKind::Error);
        assert_eq!(latest.message, FETCH_FAILED);
    }

    #[tokio::test]
    async fn created_book_is_prepended() {
        let mut state = CatalogState::new(TTL);
        let now = Instant::now();
        let books = records(&["Old", "New"]).await;
        let ticket = state.begin_fetch();
        state.finish_fetch(ticket, Ok(vec![books[0].clone()]), now);

        state.book_created(Ok(books[1].clone()), now);

        let titles: Vec<_> = state.books().iter().map(|b| b.doc.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
        assert_eq!(state.notifications().latest().unwrap().message, ADDED);
    }

    #[tokio::test]
    async fn updated_book_is_replaced_in_place() {
        let mut state = CatalogState::new(TTL);
        let now = Instant::now();
        let books = records(&["A", "B", "C"]).await;
        let ticket = state.begin_fetch();
        state.finish_fetch(ticket, Ok(books.clone()), now);

        let mut edited = books[1].clone();
        edited.doc.title = "B2".to_string();
        state.book_updated(Ok(edited), now);

        let titles: Vec<_> = state.books().iter().map(|b| b.doc.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B2", "C"]);
        assert_eq!(state.notifications().latest().unwrap().message, UPDATED);
    }

    #[tokio::test]
    async fn deleted_book_is_removed_by_key() {
        let mut state = CatalogState::new(TTL);
        let now = Instant::now();
        let books = records(&["A", "B"]).await;
        let ticket = state.begin_fetch();
        state.finish_fetch(ticket, Ok(books.clone()), now);

        state.book_deleted(&books[0].id, Ok("Book deleted successfully".to_string()), now);

        assert_eq!(state.books().len(), 1);
        assert_eq!(state.books()[0].id, books[1].id);
        assert_eq!(state.notifications().latest().unwrap().message, DELETED);
    }

    #[tokio::test]
    async fn failures_use_server_message_or_fallback() {
        let mut state = CatalogState::new(TTL);
        let now = Instant::now();
        let books = records(&["A"]).await;
        let ticket = state.begin_fetch();
        state.finish_fetch(ticket, Ok(books.clone()), now);

        state.book_created(Err(api_error(Some("ISBN already exists"))), now);
        assert_eq!(
            state.notifications().latest().unwrap().message,
            "ISBN already exists"
        );

        state.book_deleted(&books[0].id, Err(api_error(None)), now);
        assert_eq!(state.notifications().latest().unwrap().message, DELETE_FAILED);
        assert_eq!(state.books().len(), 1);
    }

    #[test]
    fn filtered_reflects_search_and_genre() {
        let mut state = CatalogState::new(TTL);
        assert!(!state.is_filtered());

        state.set_genre("Mystery");
        assert!(state.is_filtered());

        state.set_genre("all");
        state.set_search("x");
        assert!(state.is_filtered());
    }
}
