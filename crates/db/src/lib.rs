//! Document store for bookshelf.
//!
//! A [`Collection`] holds documents of one [`Document`] type, validates them on
//! every write, enforces their unique keys, and optionally mirrors itself to a
//! JSON data file.

mod collection;
mod document;
mod error;
mod persistence;

pub use collection::Collection;
pub use document::{Document, DocumentId, Record, UniqueKey};
pub use error::{FieldError, StoreError, ValidationErrors};
