//! Book (catalog title) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, book_instance::BookInstance, genre::Genre, language::Language};

/// How many genre names `display_genre` shows
pub const DISPLAY_GENRE_LIMIT: usize = 3;

/// Book row as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub summary: String,
    pub isbn: String,
    pub language_id: i32,
}

/// Book as shown in lists: title plus the author's display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    /// "Last, First"
    pub author_name: String,
}

/// Book detail page with every related record resolved
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Author,
    pub language: Language,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    /// Physical copies of this title
    pub instances: Vec<BookInstance>,
}

/// Create or update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: i32,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    #[serde(default)]
    pub summary: String,
    /// 13 character ISBN
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    pub language_id: i32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// Names of the first three genres, comma separated
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(DISPLAY_GENRE_LIMIT)
        .map(|genre| genre.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres(names: &[&str]) -> Vec<Genre> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Genre { id: i as i32 + 1, name: name.to_string() })
            .collect()
    }

    #[test]
    fn display_genre_shows_at_most_three() {
        let all = genres(&["Fantasy", "Poetry", "Horror", "Western"]);
        assert_eq!(display_genre(&all), "Fantasy, Poetry, Horror");
    }

    #[test]
    fn display_genre_handles_short_lists() {
        assert_eq!(display_genre(&genres(&["Fantasy"])), "Fantasy");
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn isbn_length_is_enforced() {
        let mut input = BookInput {
            title: "The Left Hand of Darkness".to_string(),
            author_id: 1,
            summary: String::new(),
            isbn: "9780441478125".to_string(),
            language_id: 1,
            genre_ids: vec![],
        };
        assert!(input.validate().is_ok());
        input.isbn = "978044147812".to_string();
        assert!(input.validate().is_err());
    }
}
