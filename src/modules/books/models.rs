use bookshelf_db::{Collection, Document, Record, UniqueKey, ValidationErrors};
use serde::{Deserialize, Serialize};

use super::validation;

/// Cover shown for books created without one.
pub const DEFAULT_COVER_IMAGE: &str =
    "https://images.pexels.com/photos/159866/books-book-pages-read-literature-159866.jpeg";

/// Rating given to books created without one.
pub const DEFAULT_RATING: i32 = 1;

fn default_rating() -> i32 {
    DEFAULT_RATING
}

fn default_cover_image() -> String {
    DEFAULT_COVER_IMAGE.to_string()
}

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    pub author: String,
    /// Free text server-side; the client offers a fixed list.
    pub genre: String,
    pub published_year: i32,
    /// Unique across the catalog
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_rating")]
    pub rating: i32,
    #[serde(default = "default_cover_image")]
    pub cover_image: String,
}

/// A stored book with its key and timestamps.
pub type BookRecord = Record<Book>;

/// The document collection holding every book.
pub type BookStore = Collection<Book>;

impl Document for Book {
    const COLLECTION: &'static str = "books";

    fn normalize(&mut self) {
        validation::normalize(self);
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate(self)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("isbn", self.isbn.clone())]
    }
}

/// Request body for create and update.
///
/// Every field is optional on the wire so that a missing required field is
/// reported as a validation failure instead of a decoding failure. Keys and
/// timestamps sent by the caller are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
}

impl BookInput {
    fn with_year(self, published_year: i32) -> Book {
        Book {
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            published_year,
            isbn: self.isbn.unwrap_or_default(),
            description: self.description,
            rating: self.rating.unwrap_or(DEFAULT_RATING),
            cover_image: self.cover_image.unwrap_or_else(default_cover_image),
        }
    }

    /// Build a new book from a create payload, filling defaults.
    ///
    /// Only a missing `publishedYear` is reported here (together with every
    /// other problem found); the remaining constraints are checked by the
    /// store on insert.
    pub fn into_book(self) -> Result<Book, ValidationErrors> {
        match self.published_year {
            Some(year) => Ok(self.with_year(year)),
            None => {
                let mut book = self.with_year(validation::MIN_PUBLISHED_YEAR);
                validation::normalize(&mut book);
                let mut errors = validation::check(&book, validation::current_year());
                errors.add("publishedYear", validation::YEAR_REQUIRED);
                Err(errors)
            }
        }
    }

    /// Overwrite the fields present in this payload.
    pub fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
        if let Some(published_year) = self.published_year {
            book.published_year = published_year;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(description) = self.description {
            book.description = Some(description);
        }
        if let Some(rating) = self.rating {
            book.rating = rating;
        }
        if let Some(cover_image) = self.cover_image {
            book.cover_image = cover_image;
        }
    }
}
