//! Staff-only catalog administration

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    admin::{AdminModel, AdminSite},
    error::AppResult,
    services::admin::{ChangeForm, ChangeList},
};

use super::AuthenticatedUser;

/// Registered models and how each is presented
#[utoipa::path(
    get,
    path = "/admin/",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Admin registry", body = AdminSite),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse)
    )
)]
pub async fn registry(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AdminSite>> {
    claims.require_staff()?;
    Ok(Json(state.services.admin.site().clone()))
}

/// Change list of a model, filtered by its declared list filters
#[utoipa::path(
    get,
    path = "/admin/{model}/",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "Model name (author, book, bookinstance, genre, language)"),
        ("page" = Option<String>, Query, description = "Page number or \"last\""),
        ("status" = Option<String>, Query, description = "Loan status code (bookinstance)"),
        ("due_back" = Option<String>, Query, description = "Due date range (bookinstance)"),
        ("borrower" = Option<i32>, Query, description = "Borrower user ID (bookinstance)")
    ),
    responses(
        (status = 200, description = "Change list page", body = ChangeList),
        (status = 400, description = "Undeclared or invalid filter", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown model or page", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_list(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ChangeList>> {
    claims.require_staff()?;
    let model: AdminModel = model.parse()?;
    Ok(Json(state.services.admin.change_list(model, &params).await?))
}

/// Change form of a record with its inline children
#[utoipa::path(
    get,
    path = "/admin/{model}/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "Model name"),
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Change form", body = ChangeForm),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((model, id)): Path<(String, String)>,
) -> AppResult<Json<ChangeForm>> {
    claims.require_staff()?;
    let model: AdminModel = model.parse()?;
    Ok(Json(state.services.admin.change_form(model, &id).await?))
}

/// Create a record
#[utoipa::path(
    post,
    path = "/admin/{model}/",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "Model name")
    ),
    request_body = Value,
    responses(
        (status = 201, description = "Record created", body = Value),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_record(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(model): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    claims.require_staff()?;
    let model: AdminModel = model.parse()?;
    let record = state.services.admin.create(model, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Update a record
#[utoipa::path(
    put,
    path = "/admin/{model}/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "Model name"),
        ("id" = String, Path, description = "Record ID")
    ),
    request_body = Value,
    responses(
        (status = 200, description = "Record updated", body = Value),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_record(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((model, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> AppResult<Json<Value>> {
    claims.require_staff()?;
    let model: AdminModel = model.parse()?;
    Ok(Json(state.services.admin.update(model, &id, payload).await?))
}

/// Delete a record
#[utoipa::path(
    delete,
    path = "/admin/{model}/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "Model name"),
        ("id" = String, Path, description = "Record ID")
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Record still referenced", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_record(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((model, id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    let model: AdminModel = model.parse()?;
    state.services.admin.delete(model, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
