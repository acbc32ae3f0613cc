//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin, auth, catalog, health, loans};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Local Library Catalog API",
        version = "1.0.0",
        description = "Library catalog browsing, borrower loans and staff administration"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login_form,
        auth::login,
        // Catalog
        catalog::index,
        catalog::book_list,
        catalog::author_list,
        catalog::book_detail,
        catalog::author_detail,
        // Loans
        loans::my_books,
        // Admin
        admin::registry,
        admin::change_list,
        admin::change_form,
        admin::create_record,
        admin::update_record,
        admin::delete_record,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            auth::LoginResponse,
            auth::LoginForm,
            // Catalog
            crate::models::CatalogSummary,
            crate::models::Author,
            crate::models::AuthorDetail,
            crate::models::Book,
            crate::models::BookSummary,
            crate::models::BookDetail,
            crate::models::BookInstance,
            crate::models::LoanStatus,
            crate::models::Genre,
            crate::models::Language,
            crate::pagination::PageMeta,
            catalog::BookListResponse,
            catalog::AuthorListResponse,
            // Loans
            crate::models::LoanedCopy,
            loans::LoanedBooksResponse,
            // Admin
            crate::admin::AdminSite,
            crate::admin::ModelAdmin,
            crate::admin::AdminModel,
            crate::admin::Fieldset,
            crate::admin::InlineAdmin,
            crate::admin::InlineType,
            crate::services::admin::ChangeList,
            crate::services::admin::ChangeForm,
            crate::services::admin::InlineRecords,
            crate::models::author::AuthorInput,
            crate::models::book::BookInput,
            crate::models::book_instance::BookInstanceInput,
            crate::models::genre::GenreInput,
            crate::models::language::LanguageInput,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Public catalog pages"),
        (name = "loans", description = "Borrowed books"),
        (name = "admin", description = "Staff administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
