//! Home page summary

use serde::Serialize;
use utoipa::ToSchema;

/// Record counts for the catalog front page plus the session visit counter
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status "Available"
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    pub num_languages: i64,
    /// Visits in this session before the current one
    pub num_visits: i64,
}

/// Raw counts as read from the database
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct RecordCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    pub num_languages: i64,
}

impl CatalogSummary {
    pub fn new(counts: RecordCounts, num_visits: i64) -> Self {
        Self {
            num_books: counts.num_books,
            num_instances: counts.num_instances,
            num_instances_available: counts.num_instances_available,
            num_authors: counts.num_authors,
            num_genres: counts.num_genres,
            num_languages: counts.num_languages,
            num_visits,
        }
    }
}
