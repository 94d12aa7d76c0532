//! Plain-text rendering of the catalog.

use super::notifications::{NotificationKind, Notifications};
use super::state::CatalogState;
use crate::modules::books::models::BookRecord;
use crate::modules::books::validation::MAX_RATING;

/// Filled stars for `rating`, padded with empty ones up to five.
pub fn render_stars(rating: i32) -> String {
    let filled = rating.clamp(0, MAX_RATING) as usize;
    let empty = MAX_RATING as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

pub fn render_card(record: &BookRecord) -> String {
    let book = &record.doc;
    let mut lines = vec![
        book.title.clone(),
        format!("  by {}", book.author),
        format!("  {} · {}", book.genre, book.published_year),
        format!("  {} ({}/{MAX_RATING})", render_stars(book.rating), book.rating),
    ];
    if let Some(description) = &book.description {
        lines.push(format!("  {description}"));
    }
    lines.push(format!("  ISBN: {}", book.isbn));
    lines.push(format!("  id: {}", record.id));
    lines.join("\n")
}

fn empty_hint(filtered: bool) -> &'static str {
    if filtered {
        "Try adjusting your search or filters"
    } else {
        "Add your first book to get started"
    }
}

/// The whole list view: count header, then cards or the empty state.
pub fn render_catalog(state: &CatalogState) -> String {
    if state.is_loading() {
        return "Loading...".to_string();
    }

    let books = state.books();
    let noun = if books.len() == 1 { "book" } else { "books" };
    let mut sections = vec![format!("{} {noun} · {}", books.len(), state.query().sort.label())];

    if books.is_empty() {
        sections.push(String::new());
        sections.push("No books found".to_string());
        sections.push(empty_hint(state.is_filtered()).to_string());
    } else {
        for record in books {
            sections.push(String::new());
            sections.push(render_card(record));
        }
    }
    sections.join("\n")
}

pub fn render_notifications(notifications: &Notifications) -> String {
    notifications
        .iter()
        .map(|n| match n.kind {
            NotificationKind::Success => format!("✓ {}", n.message),
            NotificationKind::Error => format!("✗ {}", n.message),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
