//! The add / edit book form.

use bookshelf_db::ValidationErrors;

use crate::modules::books::models::{Book, BookInput, BookRecord, DEFAULT_COVER_IMAGE, DEFAULT_RATING};
use crate::modules::books::validation;

/// Genres offered by the form. The server accepts any non-empty genre.
pub const GENRES: [&str; 10] = [
    "Fiction",
    "Non-Fiction",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Fantasy",
    "Biography",
    "History",
    "Self-Help",
    "Business",
];

pub fn is_known_genre(genre: &str) -> bool {
    GENRES.contains(&genre)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub isbn: String,
    pub description: String,
    pub rating: i32,
    pub cover_image: String,
}

impl BookForm {
    /// A blank form for a new book.
    pub fn new(current_year: i32) -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            genre: String::new(),
            published_year: current_year,
            isbn: String::new(),
            description: String::new(),
            rating: DEFAULT_RATING,
            cover_image: DEFAULT_COVER_IMAGE.to_string(),
        }
    }

    /// A form pre-filled from a stored book.
    pub fn from_record(record: &BookRecord) -> Self {
        let book = &record.doc;
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            published_year: book.published_year,
            isbn: book.isbn.clone(),
            description: book.description.clone().unwrap_or_default(),
            rating: book.rating,
            cover_image: book.cover_image.clone(),
        }
    }

    fn as_book(&self) -> Book {
        Book {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre.clone(),
            published_year: self.published_year,
            isbn: self.isbn.clone(),
            description: Some(self.description.clone()),
            rating: self.rating,
            cover_image: self.cover_image.clone(),
        }
    }

    /// Pre-submit checks, the same rules the store applies.
    ///
    /// [`GENRES`] are the offered choices; a stored book may carry any other genre.
    pub fn validate(&self, current_year: i32) -> Result<(), ValidationErrors> {
        validation::check(&self.as_book(), current_year).into_result()
    }

    /// The request body for this form. Text fields are sent trimmed.
    pub fn to_input(&self) -> BookInput {
        BookInput {
            title: Some(self.title.trim().to_string()),
            author: Some(self.author.trim().to_string()),
            genre: Some(self.genre.trim().to_string()),
            published_year: Some(self.published_year),
            isbn: Some(self.isbn.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            rating: Some(self.rating),
            cover_image: Some(self.cover_image.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> BookForm {
        BookForm {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Sci-Fi".to_string(),
            published_year: 1965,
            isbn: "9780441013593".to_string(),
            ..BookForm::new(2024)
        }
    }

    #[test]
    fn new_form_has_defaults() {
        let form = BookForm::new(2024);

        assert!(form.title.is_empty());
        assert_eq!(form.published_year, 2024);
        assert_eq!(form.rating, 1);
        assert_eq!(form.cover_image, DEFAULT_COVER_IMAGE);
    }

    #[test]
    fn blank_form_reports_every_required_field() {
        let errors = BookForm::new(2024).validate(2024).unwrap_err();

        assert_eq!(errors.message_for("title"), Some("Title is required"));
        assert_eq!(errors.message_for("author"), Some("Author is required"));
        assert_eq!(errors.message_for("genre"), Some("Genre is required"));
        assert_eq!(errors.message_for("isbn"), Some("ISBN is required"));
        assert_eq!(errors.message_for("publishedYear"), None);
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        let form = BookForm {
            published_year: 2025,
            rating: 6,
            ..filled()
        };

        let errors = form.validate(2024).unwrap_err();

        assert_eq!(
            errors.message_for("publishedYear"),
            Some("Please enter a valid year")
        );
        assert_eq!(
            errors.message_for("rating"),
            Some("Rating must be between 1 and 5")
        );
    }

    #[test]
    fn genre_outside_the_offered_list_is_accepted() {
        let stored: BookRecord = serde_json::from_value(serde_json::json!({
            "_id": "0190f0c2-7a1b-7c3d-8e4f-5a6b7c8d9e0f",
            "title": "Leaves of Grass",
            "author": "Walt Whitman",
            "genre": "Poetry",
            "publishedYear": 1855,
            "isbn": "9780140421996",
            "rating": 3,
            "coverImage": DEFAULT_COVER_IMAGE,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let form = BookForm {
            rating: 4,
            ..BookForm::from_record(&stored)
        };

        assert!(!is_known_genre("Poetry"));
        assert!(form.validate(2024).is_ok());
        assert!(filled().validate(2024).is_ok());
    }

    #[test]
    fn whitespace_genre_is_required() {
        let form = BookForm {
            genre: "   ".to_string(),
            ..filled()
        };

        let errors = form.validate(2024).unwrap_err();

        assert_eq!(errors.message_for("genre"), Some("Genre is required"));
    }

    #[test]
    fn to_input_trims_text() {
        let form = BookForm {
            title: "  Dune ".to_string(),
            ..filled()
        };

        let input = form.to_input();

        assert_eq!(input.title.as_deref(), Some("Dune"));
        assert_eq!(input.published_year, Some(1965));
        assert_eq!(input.description.as_deref(), Some(""));
    }
}
