//! Authentication endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{error::AppResult, models::user::LoginRequest};

use super::Template;

pub const LOGIN_TEMPLATE: &str = "registration/login.html";

/// `?next=` carried by the login redirect
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LoginFormQuery {
    /// Path to return to after signing in
    pub next: Option<String>,
}

/// How to sign in: where to post the credentials and where to go afterwards
#[derive(Serialize, ToSchema)]
pub struct LoginForm {
    pub action: String,
    pub fields: Vec<String>,
    pub next: Option<String>,
}

/// Issued bearer token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
}

/// Login page reached through the "login required" redirect
#[utoipa::path(
    get,
    path = "/accounts/login/",
    tag = "auth",
    params(LoginFormQuery),
    responses(
        (status = 200, description = "Login form description", body = LoginForm)
    )
)]
pub async fn login_form(Query(query): Query<LoginFormQuery>) -> (Template, Json<LoginForm>) {
    (
        Template(LOGIN_TEMPLATE),
        Json(LoginForm {
            action: "/accounts/login".to_string(),
            fields: vec!["username".to_string(), "password".to_string()],
            next: query.next,
        }),
    )
}

/// Exchange username and password for a JWT
#[utoipa::path(
    post,
    path = "/accounts/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed request", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    request.validate()?;

    let (token, _user) = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.services.auth.token_lifetime(),
    }))
}
