//! Public catalog pages

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorDetail,
        book::{BookDetail, BookSummary},
        Author, CatalogSummary,
    },
    pagination::{PageMeta, PageQuery},
    services::catalog::{AUTHOR_DETAIL_TEMPLATE, AUTHOR_LIST, BOOK_DETAIL_TEMPLATE, BOOK_LIST, INDEX_TEMPLATE},
};

use super::{Session, Template};

/// Integer primary key from the path; anything else matches no record
fn record_id(raw: &str, kind: &str) -> AppResult<i32> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{} with id {} not found", kind, raw)))
}

/// One page of the book list
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub book_list: Vec<BookSummary>,
    pub page: PageMeta,
}

/// One page of the author list
#[derive(Serialize, ToSchema)]
pub struct AuthorListResponse {
    pub author_list: Vec<Author>,
    pub page: PageMeta,
}

/// Home page: record counts and the visits seen in this session
#[utoipa::path(
    get,
    path = "/catalog/",
    tag = "catalog",
    responses(
        (status = 200, description = "Catalog summary", body = CatalogSummary)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    session: Session,
    jar: CookieJar,
) -> AppResult<(CookieJar, Template, Json<CatalogSummary>)> {
    let summary = state.services.catalog.summary(&session.id).await?;
    let jar = jar.add(session.cookie(&state.config.session.cookie_name));
    Ok((jar, Template(INDEX_TEMPLATE), Json(summary)))
}

/// First books of the catalog, two per page
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of books", body = BookListResponse),
        (status = 404, description = "Invalid page", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_list(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<(Template, Json<BookListResponse>)> {
    let (book_list, page) = state.services.catalog.list_books(query.number()?).await?;
    Ok((Template(BOOK_LIST.template), Json(BookListResponse { book_list, page })))
}

/// First authors of the catalog, two per page
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of authors", body = AuthorListResponse),
        (status = 404, description = "Invalid page", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_list(
    State(state): State<crate::AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<(Template, Json<AuthorListResponse>)> {
    let (author_list, page) = state.services.catalog.list_authors(query.number()?).await?;
    Ok((Template(AUTHOR_LIST.template), Json(AuthorListResponse { author_list, page })))
}

/// Book with its author, language, genres and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_detail(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<(Template, Json<BookDetail>)> {
    let book = state.services.catalog.book_detail(record_id(&id, "Book")?).await?;
    Ok((Template(BOOK_DETAIL_TEMPLATE), Json(book)))
}

/// Author with their books
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "catalog",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_detail(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<(Template, Json<AuthorDetail>)> {
    let author = state.services.catalog.author_detail(record_id(&id, "Author")?).await?;
    Ok((Template(AUTHOR_DETAIL_TEMPLATE), Json(author)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_integer_ids_match_nothing() {
        assert_eq!(record_id("42", "Book").unwrap(), 42);
        assert!(matches!(record_id("abc", "Book"), Err(AppError::NotFound(_))));
        assert!(matches!(record_id("99999999999", "Author"), Err(AppError::NotFound(_))));
        assert!(matches!(record_id("-", "Author"), Err(AppError::NotFound(_))));
    }
}
