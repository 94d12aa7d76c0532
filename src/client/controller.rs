//! Drives [`CatalogState`] through the [`BooksClient`].

use std::time::{Duration, Instant};

use bookshelf_db::{DocumentId, ValidationErrors};
use bookshelf_kernel::settings::ClientSettings;

use super::api::{BooksClient, CatalogQuery};
use super::form::BookForm;
use super::state::CatalogState;
use crate::modules::books::models::{BookInput, BookRecord};
use crate::modules::books::query::SortKey;

pub struct CatalogController {
    client: BooksClient,
    state: CatalogState,
}

impl CatalogController {
    pub fn new(client: BooksClient, notification_ttl: Duration) -> Self {
        Self {
            client,
            state: CatalogState::new(notification_ttl),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(
            BooksClient::new(settings.api_base_url.clone()),
            Duration::from_millis(settings.notification_ttl_ms),
        )
    }

    pub fn client(&self) -> &BooksClient {
        &self.client
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    /// Re-fetch the list for the current query.
    pub async fn refresh(&mut self) {
        let ticket = self.state.begin_fetch();
        let result = self.client.list(&ticket.query).await;
        self.state.finish_fetch(ticket, result, Instant::now());
    }

    pub async fn set_search(&mut self, search: impl Into<String>) {
        self.state.set_search(search);
        self.refresh().await;
    }

    pub async fn set_genre(&mut self, genre: impl Into<String>) {
        self.state.set_genre(genre);
        self.refresh().await;
    }

    pub async fn set_sort(&mut self, sort: SortKey) {
        self.state.set_sort(sort);
        self.refresh().await;
    }

    /// Replace search, genre and sort at once, then re-fetch.
    pub async fn apply_query(&mut self, query: CatalogQuery) {
        self.state.set_query(query);
        self.refresh().await;
    }

    /// Create a book. Returns the stored record on success.
    pub async fn create(&mut self, input: &BookInput) -> Option<BookRecord> {
        let result = self.client.create(input).await;
        let created = result.as_ref().ok().cloned();
        self.state.book_created(result, Instant::now());
        created
    }

    pub async fn update(&mut self, id: &DocumentId, input: &BookInput) -> Option<BookRecord> {
        let result = self.client.update(id, input).await;
        let updated = result.as_ref().ok().cloned();
        self.state.book_updated(result, Instant::now());
        updated
    }

    /// Delete a book. Returns whether the server confirmed the deletion.
    pub async fn delete(&mut self, id: &DocumentId) -> bool {
        let result = self.client.delete(id).await;
        let deleted = result.is_ok();
        self.state.book_deleted(id, result, Instant::now());
        deleted
    }

    /// Fetch one book, posting an error notification if that fails.
    pub async fn load(&mut self, id: &DocumentId) -> Option<BookRecord> {
        match self.client.get(id).await {
            Ok(record) => Some(record),
            Err(e) => {
                self.state.load_failed(&e, Instant::now());
                None
            }
        }
    }

    /// Load a book and make it the edit target.
    pub async fn open_for_edit(&mut self, id: &DocumentId) -> Option<BookRecord> {
        let record = self.load(id).await?;
        self.state.begin_edit(record.clone());
        Some(record)
    }

    pub fn begin_edit(&mut self, record: BookRecord) {
        self.state.begin_edit(record);
    }

    pub fn cancel_edit(&mut self) {
        self.state.cancel_edit();
    }

    /// Validate `form` and send it as an update when a book is being edited,
    /// or as a create otherwise. The edit target is cleared once the request
    /// succeeds.
    pub async fn submit(
        &mut self,
        form: &BookForm,
        current_year: i32,
    ) -> Result<Option<BookRecord>, ValidationErrors> {
        form.validate(current_year)?;
        let input = form.to_input();

        let editing = self.state.editing().map(|record| record.id);
        let saved = match editing {
            Some(id) => self.update(&id, &input).await,
            None => self.create(&input).await,
        };
        if saved.is_some() {
            self.state.cancel_edit();
        }
        Ok(saved)
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.state.notifications_mut().dismiss(id)
    }

    pub fn expire_notifications(&mut self, now: Instant) -> usize {
        self.state.notifications_mut().expire(now)
    }
}
