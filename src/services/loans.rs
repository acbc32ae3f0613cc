//! Loans as seen by the borrower

use crate::{
    error::AppResult,
    models::LoanedCopy,
    pagination::{PageMeta, PageNumber, Paginator},
    repository::Repository,
};

/// Copies per page on "my borrowed books"
pub const LOANED_BOOKS_PER_PAGE: usize = 10;

pub const LOANED_BOOKS_TEMPLATE: &str = "catalog/bookinstance_list_borrowed_user.html";

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Copies on loan to a user, earliest due date first
    pub async fn on_loan_to(&self, user_id: i32, page: PageNumber) -> AppResult<(Vec<LoanedCopy>, PageMeta)> {
        let total = self.repository.book_instances.count_on_loan_to(user_id).await?;
        let meta = Paginator::new(total as usize, LOANED_BOOKS_PER_PAGE).page(page)?;

        let copies = self
            .repository
            .book_instances
            .list_on_loan_to(user_id, meta.offset() as i64, meta.per_page as i64)
            .await?;

        Ok((copies.into_iter().map(LoanedCopy::from).collect(), meta))
    }
}
