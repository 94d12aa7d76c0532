//! Translates list request parameters into a filter and an ordering.

use std::cmp::Ordering;

use serde::Deserialize;

use super::models::{Book, BookRecord};

/// Genre filter value meaning "no genre constraint".
pub const ALL_GENRES: &str = "all";

/// Query string of `GET /api/books`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub sort: Option<String>,
}

/// Primary ordering of a book list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most recently created first
    #[default]
    Newest,
    /// Title, ascending
    Title,
    /// Author, ascending
    Author,
    /// Published year, descending
    Year,
    /// Rating, descending
    Rating,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Newest,
        SortKey::Title,
        SortKey::Author,
        SortKey::Year,
        SortKey::Rating,
    ];

    /// Unrecognized or missing values sort newest first.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("title") => SortKey::Title,
            Some("author") => SortKey::Author,
            Some("year") => SortKey::Year,
            Some("rating") => SortKey::Rating,
            _ => SortKey::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Title => "title",
            SortKey::Author => "author",
            SortKey::Year => "year",
            SortKey::Rating => "rating",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Newest => "Newest First",
            SortKey::Title => "Title A-Z",
            SortKey::Author => "Author A-Z",
            SortKey::Year => "Year",
            SortKey::Rating => "Rating",
        }
    }

    fn primary(self, a: &BookRecord, b: &BookRecord) -> Ordering {
        match self {
            SortKey::Newest => Ordering::Equal,
            SortKey::Title => a.doc.title.cmp(&b.doc.title),
            SortKey::Author => a.doc.author.cmp(&b.doc.author),
            SortKey::Year => b.doc.published_year.cmp(&a.doc.published_year),
            SortKey::Rating => b.doc.rating.cmp(&a.doc.rating),
        }
    }

    /// Order two records. Ties fall back to newest first, then to insertion
    /// order (later first), so the result is deterministic.
    pub fn compare(self, a: &BookRecord, b: &BookRecord) -> Ordering {
        self.primary(a, b)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.sequence().cmp(&a.sequence()))
    }
}

/// Conjunction of the search and genre constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Lowercased search text, matched as a plain substring
    search: Option<String>,
    genre: Option<String>,
}

impl BookFilter {
    pub fn new(search: Option<&str>, genre: Option<&str>) -> Self {
        Self {
            search: search
                .filter(|s| !s.is_empty())
                .map(|s| s.to_lowercase()),
            genre: genre
                .filter(|g| !g.is_empty() && *g != ALL_GENRES)
                .map(str::to_string),
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        if let Some(search) = &self.search {
            let hit = book.title.to_lowercase().contains(search.as_str())
                || book.author.to_lowercase().contains(search.as_str());
            if !hit {
                return false;
            }
        }

        match &self.genre {
            Some(genre) => book.genre == *genre,
            None => true,
        }
    }
}

/// Filter plus ordering for one list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub filter: BookFilter,
    pub sort: SortKey,
}

impl BookQuery {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            filter: BookFilter::new(params.search.as_deref(), params.genre.as_deref()),
            sort: SortKey::parse(params.sort.as_deref()),
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.filter.matches(book)
    }

    pub fn compare(&self, a: &BookRecord, b: &BookRecord) -> Ordering {
        self.sort.compare(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{BookStore, DEFAULT_COVER_IMAGE};

    fn book(title: &str, author: &str, genre: &str, year: i32, rating: i32) -> Book {
        Book {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            published_year: year,
            isbn: format!("isbn-{title}"),
            description: None,
            rating,
            cover_image: DEFAULT_COVER_IMAGE.to_string(),
        }
    }

    async fn seeded() -> BookStore {
        let store = BookStore::in_memory();
        for b in [
            book("Dune", "Frank Herbert", "Sci-Fi", 1965, 5),
            book("Emma", "Jane Austen", "Romance", 1815, 3),
            book("Children of Dune", "Frank Herbert", "Sci-Fi", 1976, 4),
            book("Neuromancer", "William Gibson", "Sci-Fi", 1984, 4),
            book("The Dune Encyclopedia", "Willis McNelly", "Non-Fiction", 1984, 2),
        ] {
            store.insert(b).await.unwrap();
        }
        store
    }

    async fn titles(store: &BookStore, params: ListParams) -> Vec<String> {
        let query = BookQuery::from_params(&params);
        store
            .find(|b| query.matches(b), |a, b| query.compare(a, b))
            .await
            .into_iter()
            .map(|r| r.doc.title)
            .collect()
    }

    fn params(search: Option<&str>, genre: Option<&str>, sort: Option<&str>) -> ListParams {
        ListParams {
            search: search.map(str::to_string),
            genre: genre.map(str::to_string),
            sort: sort.map(str::to_string),
        }
    }

    #[test]
    fn sort_parse_falls_back_to_newest() {
        assert_eq!(SortKey::parse(Some("title")), SortKey::Title);
        assert_eq!(SortKey::parse(Some("rating")), SortKey::Rating);
        assert_eq!(SortKey::parse(Some("TITLE")), SortKey::Newest);
        assert_eq!(SortKey::parse(Some("price")), SortKey::Newest);
        assert_eq!(SortKey::parse(None), SortKey::Newest);
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(Some(key.as_str())), key);
        }
    }

    #[test]
    fn search_is_case_insensitive_substring_on_title_or_author() {
        let filter = BookFilter::new(Some("dUNe"), None);
        assert!(filter.matches(&book("Children of Dune", "x", "g", 1976, 1)));
        assert!(filter.matches(&book("x", "Dunedin Press", "g", 1976, 1)));
        assert!(!filter.matches(&book("Emma", "Jane Austen", "g", 1815, 1)));
    }

    #[test]
    fn search_text_is_literal() {
        let filter = BookFilter::new(Some("c++"), None);
        assert!(filter.matches(&book("The C++ Programming Language", "x", "g", 1985, 1)));
        assert!(!filter.matches(&book("Cccc", "x", "g", 1985, 1)));
    }

    #[test]
    fn all_sentinel_and_empty_values_do_not_constrain() {
        assert_eq!(BookFilter::new(Some(""), Some("all")), BookFilter::default());
        assert_eq!(BookFilter::new(None, Some("")), BookFilter::default());
        assert_ne!(BookFilter::new(None, Some("All")), BookFilter::default());
    }

    #[test]
    fn genre_is_exact_match() {
        let filter = BookFilter::new(None, Some("Sci-Fi"));
        assert!(filter.matches(&book("Dune", "x", "Sci-Fi", 1965, 1)));
        assert!(!filter.matches(&book("Dune", "x", "sci-fi", 1965, 1)));
    }

    #[tokio::test]
    async fn search_and_genre_are_conjunctive() {
        let store = seeded().await;

        let found = titles(&store, params(Some("dune"), Some("Sci-Fi"), Some("title"))).await;

        assert_eq!(found, vec!["Children of Dune", "Dune"]);
    }

    #[tokio::test]
    async fn default_order_is_newest_first() {
        let store = seeded().await;

        let found = titles(&store, params(None, None, None)).await;

        assert_eq!(
            found,
            vec![
                "The Dune Encyclopedia",
                "Neuromancer",
                "Children of Dune",
                "Emma",
                "Dune"
            ]
        );
    }

    #[tokio::test]
    async fn author_sort_is_ascending_with_newest_tie_break() {
        let store = seeded().await;

        let found = titles(&store, params(None, None, Some("author"))).await;

        assert_eq!(
            found,
            vec![
                "Children of Dune",
                "Dune",
                "Emma",
                "Neuromancer",
                "The Dune Encyclopedia"
            ]
        );
    }

    #[tokio::test]
    async fn year_sort_is_descending() {
        let store = seeded().await;

        let found = titles(&store, params(None, None, Some("year"))).await;

        assert_eq!(
            found,
            vec![
                "The Dune Encyclopedia",
                "Neuromancer",
                "Children of Dune",
                "Dune",
                "Emma"
            ]
        );
    }

    #[tokio::test]
    async fn rating_sort_is_non_increasing() {
        let store = seeded().await;
        let query = BookQuery::from_params(&params(None, None, Some("rating")));

        let ratings: Vec<i32> = store
            .find(|b| query.matches(b), |a, b| query.compare(a, b))
            .await
            .iter()
            .map(|r| r.doc.rating)
            .collect();

        assert_eq!(ratings, vec![5, 4, 4, 3, 2]);
    }
}
