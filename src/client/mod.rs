//! Catalog client: HTTP access, view state, the book form, and text rendering.

pub mod api;
pub mod controller;
pub mod form;
pub mod notifications;
pub mod state;
pub mod view;

pub use api::{BooksClient, CatalogQuery, ClientError};
pub use controller::CatalogController;
pub use form::{is_known_genre, BookForm, GENRES};
pub use notifications::{Notification, NotificationKind, Notifications};
pub use state::{CatalogState, FetchTicket};
