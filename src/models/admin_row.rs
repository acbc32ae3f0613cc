//! Change-list rows whose columns are display strings rather than foreign keys

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::book_instance::{BookInstance, LoanStatus};

/// Book row on the admin change list
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookAdminRow {
    pub id: i32,
    pub title: String,
    /// "Last, First"
    pub author: String,
    pub display_genre: String,
    pub language: String,
}

/// Book instance row on the admin change list
#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceAdminRow {
    pub id: Uuid,
    pub book: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower: Option<String>,
}

impl From<BookInstance> for BookInstanceAdminRow {
    fn from(instance: BookInstance) -> Self {
        Self {
            id: instance.id,
            book: instance.book_title,
            imprint: instance.imprint,
            due_back: instance.due_back,
            status: instance.status,
            borrower: instance.borrower_username,
        }
    }
}
