//! Data models for the catalog

pub mod admin_row;
pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod summary;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetail};
pub use book::{Book, BookDetail, BookSummary};
pub use book_instance::{BookInstance, LoanStatus, LoanedCopy};
pub use genre::Genre;
pub use language::Language;
pub use summary::CatalogSummary;
pub use user::{User, UserClaims};
