//! Public catalog browsing: home summary, list and detail views

use crate::{
    error::AppResult,
    models::{
        author::AuthorDetail,
        book::{display_genre, BookDetail, BookSummary},
        Author, CatalogSummary,
    },
    pagination::{paginate, PageMeta, PageNumber},
    repository::Repository,
    services::sessions::SessionService,
};

/// Shape of a paginated list view
#[derive(Debug, Clone, Copy)]
pub struct ListView {
    /// Cap applied to the queryset before pagination
    pub limit: Option<usize>,
    pub paginate_by: usize,
    pub template: &'static str,
}

pub const BOOK_LIST: ListView = ListView {
    limit: Some(5),
    paginate_by: 2,
    template: "catalog/book_list.html",
};

pub const AUTHOR_LIST: ListView = ListView {
    limit: Some(5),
    paginate_by: 2,
    template: "catalog/author_list.html",
};

pub const INDEX_TEMPLATE: &str = "index.html";
pub const BOOK_DETAIL_TEMPLATE: &str = "catalog/book_detail.html";
pub const AUTHOR_DETAIL_TEMPLATE: &str = "catalog/author_detail.html";

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    sessions: SessionService,
}

impl CatalogService {
    pub fn new(repository: Repository, sessions: SessionService) -> Self {
        Self { repository, sessions }
    }

    /// Check the catalog database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    /// Record counts for the home page; counts this visit in the session
    pub async fn summary(&self, session_id: &str) -> AppResult<CatalogSummary> {
        let counts = self.repository.record_counts().await?;
        let num_visits = self.sessions.record_visit(session_id).await?;
        Ok(CatalogSummary::new(counts, num_visits))
    }

    pub async fn list_books(&self, page: PageNumber) -> AppResult<(Vec<BookSummary>, PageMeta)> {
        let limit = BOOK_LIST.limit.map_or(i64::MAX, |l| l as i64);
        let books = self.repository.books.list(0, limit).await?;
        paginate(books, BOOK_LIST.paginate_by, page)
    }

    pub async fn list_authors(&self, page: PageNumber) -> AppResult<(Vec<Author>, PageMeta)> {
        let limit = AUTHOR_LIST.limit.map_or(i64::MAX, |l| l as i64);
        let authors = self.repository.authors.list(0, limit).await?;
        paginate(authors, AUTHOR_LIST.paginate_by, page)
    }

    pub async fn book_detail(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;
        let author = self.repository.authors.get_by_id(book.author_id).await?;
        let language = self.repository.languages.get_by_id(book.language_id).await?;
        let genres = self.repository.genres.list_for_book(id).await?;
        let instances = self.repository.book_instances.list_for_book(id).await?;

        Ok(BookDetail {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            display_genre: display_genre(&genres),
            genres,
            instances,
        })
    }

    pub async fn author_detail(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetail { author, books })
    }
}
