//! Field rules for books.
//!
//! The store runs these on every write and the client form runs them before
//! submitting, so both sides reject the same payloads with the same messages.

use bookshelf_db::ValidationErrors;
use time::OffsetDateTime;

use super::models::{Book, DEFAULT_COVER_IMAGE};

pub const MIN_PUBLISHED_YEAR: i32 = 1000;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const AUTHOR_REQUIRED: &str = "Author is required";
pub const GENRE_REQUIRED: &str = "Genre is required";
pub const ISBN_REQUIRED: &str = "ISBN is required";
pub const YEAR_REQUIRED: &str = "Published year is required";
pub const YEAR_OUT_OF_RANGE: &str = "Please enter a valid year";
pub const RATING_OUT_OF_RANGE: &str = "Rating must be between 1 and 5";

/// The calendar year (UTC) bounding `publishedYear`.
pub fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trim text fields; a blank description becomes absent and a blank cover
/// falls back to the placeholder.
pub fn normalize(book: &mut Book) {
    trim_in_place(&mut book.title);
    trim_in_place(&mut book.author);
    trim_in_place(&mut book.genre);
    trim_in_place(&mut book.isbn);
    trim_in_place(&mut book.cover_image);

    book.description = book
        .description
        .take()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    if book.cover_image.is_empty() {
        book.cover_image = DEFAULT_COVER_IMAGE.to_string();
    }
}

/// Every rule `book` breaks, given the current year.
pub fn check(book: &Book, current_year: i32) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if book.title.trim().is_empty() {
        errors.add("title", TITLE_REQUIRED);
    }
    if book.author.trim().is_empty() {
        errors.add("author", AUTHOR_REQUIRED);
    }
    if book.genre.trim().is_empty() {
        errors.add("genre", GENRE_REQUIRED);
    }
    if !(MIN_PUBLISHED_YEAR..=current_year).contains(&book.published_year) {
        errors.add("publishedYear", YEAR_OUT_OF_RANGE);
    }
    if book.isbn.trim().is_empty() {
        errors.add("isbn", ISBN_REQUIRED);
    }
    if !(MIN_RATING..=MAX_RATING).contains(&book.rating) {
        errors.add("rating", RATING_OUT_OF_RANGE);
    }

    errors
}

/// Validate against the current year.
pub fn validate(book: &Book) -> Result<(), ValidationErrors> {
    check(book, current_year()).into_result()
}
