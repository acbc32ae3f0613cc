//! Loans of the signed-in borrower

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::LoanedCopy,
    pagination::{PageMeta, PageQuery},
    services::loans::LOANED_BOOKS_TEMPLATE,
};

use super::{LoginRequired, Template};

/// One page of the copies on loan to the current user
#[derive(Serialize, ToSchema)]
pub struct LoanedBooksResponse {
    pub bookinstance_list: Vec<LoanedCopy>,
    pub page: PageMeta,
}

/// Copies on loan to the current user, earliest due date first
#[utoipa::path(
    get,
    path = "/catalog/mybooks/",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Page of borrowed copies", body = LoanedBooksResponse),
        (status = 302, description = "Not signed in, redirected to the login page"),
        (status = 404, description = "Invalid page", body = crate::error::ErrorResponse)
    )
)]
pub async fn my_books(
    State(state): State<crate::AppState>,
    LoginRequired(claims): LoginRequired,
    Query(query): Query<PageQuery>,
) -> AppResult<(Template, Json<LoanedBooksResponse>)> {
    let (bookinstance_list, page) = state
        .services
        .loans
        .on_loan_to(claims.user_id, query.number()?)
        .await?;

    Ok((
        Template(LOANED_BOOKS_TEMPLATE),
        Json(LoanedBooksResponse { bookinstance_list, page }),
    ))
}
