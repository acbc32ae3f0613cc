//! Local library catalog server
//!
//! Browsing pages for books and authors, a per-session visit counter, the
//! borrower's "my books" page and a staff administration surface, served as
//! a JSON API over PostgreSQL.

use std::sync::Arc;

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
