//! Business logic services

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod loans;
pub mod sessions;

use std::sync::Arc;

use crate::{admin::AdminSite, config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sessions: sessions::SessionService,
    pub admin: admin::AdminService,
}

impl Services {
    /// Create all services over one repository and session store
    pub fn new(repository: Repository, config: &AppConfig, session_store: Arc<dyn sessions::SessionStore>) -> Self {
        let sessions = sessions::SessionService::new(session_store);
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), sessions.clone()),
            loans: loans::LoansService::new(repository.clone()),
            sessions,
            admin: admin::AdminService::new(repository, AdminSite::catalog()),
        }
    }
}
