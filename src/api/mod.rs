//! HTTP handlers for the catalog, loans, admin and auth endpoints

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod openapi;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{HeaderName, HeaderValue, AUTHORIZATION},
        request::Parts,
    },
    response::{IntoResponseParts, Redirect, ResponseParts},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Response header naming the template a view renders with
pub const TEMPLATE_HEADER: HeaderName = HeaderName::from_static("x-template");

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<UserClaims, AppError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

    UserClaims::from_token(token, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Authentication(e.to_string()))
}

/// Extractor for authenticated user from JWT token. Rejects with 401.
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(AuthenticatedUser(bearer_claims(parts, state)?))
    }
}

/// Like [`AuthenticatedUser`], but anonymous requests are redirected to the
/// login page with the requested path in `next`.
pub struct LoginRequired(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for LoginRequired {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_claims(parts, state) {
            Ok(claims) => Ok(LoginRequired(claims)),
            Err(_) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(AppError::LoginRequired(format!(
                    "{}?next={}",
                    state.config.auth.login_url,
                    urlencoding::encode(next)
                )))
            }
        }
    }
}

/// Session identified by cookie. A fresh id is issued when no cookie is sent
/// or when the store does not know the one sent.
pub struct Session {
    pub id: String,
}

impl Session {
    /// Cookie carrying this session's id
    pub fn cookie(&self, name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), self.id.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(&state.config.session.cookie_name) {
            if !cookie.value().is_empty() && state.services.sessions.is_known(cookie.value()).await? {
                return Ok(Session {
                    id: cookie.value().to_string(),
                });
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        tracing::debug!(session = %id, "Issued new session");
        Ok(Session { id })
    }
}

/// Template a view renders with, sent as the `x-template` header
#[derive(Debug, Clone, Copy)]
pub struct Template(pub &'static str);

impl IntoResponseParts for Template {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.headers_mut()
            .insert(TEMPLATE_HEADER, HeaderValue::from_static(self.0));
        Ok(res)
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/accounts/login", post(auth::login))
        .route("/accounts/login/", get(auth::login_form).post(auth::login))
        // Catalog
        .route("/", get(|| async { Redirect::permanent("/catalog/") }))
        .route("/catalog/", get(catalog::index))
        .route("/catalog/books/", get(catalog::book_list))
        .route("/catalog/authors/", get(catalog::author_list))
        .route("/catalog/book/:id", get(catalog::book_detail))
        .route("/catalog/author/:id", get(catalog::author_detail))
        .route("/catalog/mybooks/", get(loans::my_books))
        // Admin
        .route("/admin/", get(admin::registry))
        .route("/admin/:model/", get(admin::change_list).post(admin::create_record))
        .route(
            "/admin/:model/:id",
            get(admin::change_form)
                .put(admin::update_record)
                .delete(admin::delete_record),
        )
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
