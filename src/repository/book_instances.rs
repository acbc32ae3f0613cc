//! Book instances repository

use chrono::{Local, NaiveDate};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    admin::{filters::DateRange, InstanceFilter},
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceInput, LoanStatus},
};

const INSTANCE_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back,
           bi.status, bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

/// WHERE clause and its date binds for a change-list filter
struct FilterClause {
    sql: String,
    status: Option<LoanStatus>,
    borrower: Option<i32>,
    dates: Option<(NaiveDate, NaiveDate)>,
}

impl FilterClause {
    fn build(filter: &InstanceFilter, today: NaiveDate) -> Self {
        let mut conditions = vec!["1=1".to_string()];
        let mut idx = 1;

        if filter.status.is_some() {
            conditions.push(format!("bi.status = ${}", idx));
            idx += 1;
        }
        if filter.borrower.is_some() {
            conditions.push(format!("bi.borrower_id = ${}", idx));
            idx += 1;
        }

        let mut dates = None;
        if let Some(due_back) = filter.due_back {
            match due_back.range(today) {
                DateRange::Between(from, until) => {
                    conditions.push(format!("bi.due_back >= ${} AND bi.due_back < ${}", idx, idx + 1));
                    dates = Some((from, until));
                }
                DateRange::IsNull => conditions.push("bi.due_back IS NULL".to_string()),
                DateRange::NotNull => conditions.push("bi.due_back IS NOT NULL".to_string()),
            }
        }

        Self {
            sql: conditions.join(" AND "),
            status: filter.status,
            borrower: filter.borrower,
            dates,
        }
    }

    /// Index of the first placeholder after the filter binds
    fn next_index(&self) -> usize {
        1 + usize::from(self.status.is_some())
            + usize::from(self.borrower.is_some())
            + if self.dates.is_some() { 2 } else { 0 }
    }
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        let query = format!("{} WHERE bi.id = $1", INSTANCE_SELECT);
        sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Copies of a book, in default order (due date, then id)
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            "{} WHERE bi.book_id = $1 ORDER BY bi.due_back NULLS LAST, bi.id",
            INSTANCE_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstance>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Number of copies currently on loan to a user
    pub async fn count_on_loan_to(&self, user_id: i32) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE borrower_id = $1 AND status = $2",
        )
        .bind(user_id)
        .bind(LoanStatus::OnLoan)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Copies on loan to a user, earliest due date first
    pub async fn list_on_loan_to(&self, user_id: i32, offset: i64, limit: i64) -> AppResult<Vec<BookInstance>> {
        let query = format!(
            r#"
            {}
            WHERE bi.borrower_id = $1 AND bi.status = $2
            ORDER BY bi.due_back ASC NULLS LAST, bi.id
            LIMIT $3 OFFSET $4
            "#,
            INSTANCE_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstance>(&query)
            .bind(user_id)
            .bind(LoanStatus::OnLoan)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Count copies matching change-list filters
    pub async fn count_filtered(&self, filter: &InstanceFilter) -> AppResult<i64> {
        let clause = FilterClause::build(filter, Local::now().date_naive());
        let query = format!(
            "SELECT COUNT(*) FROM book_instances bi WHERE {}",
            clause.sql
        );

        let mut builder = sqlx::query_scalar::<_, i64>(&query);
        if let Some(status) = clause.status {
            builder = builder.bind(status);
        }
        if let Some(borrower) = clause.borrower {
            builder = builder.bind(borrower);
        }
        if let Some((from, until)) = clause.dates {
            builder = builder.bind(from).bind(until);
        }

        Ok(builder.fetch_one(&self.pool).await?)
    }

    /// One page of copies matching change-list filters
    pub async fn list_filtered(
        &self,
        filter: &InstanceFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<BookInstance>> {
        let clause = FilterClause::build(filter, Local::now().date_naive());
        let idx = clause.next_index();
        let query = format!(
            "{} WHERE {} ORDER BY bi.due_back NULLS LAST, bi.id LIMIT ${} OFFSET ${}",
            INSTANCE_SELECT,
            clause.sql,
            idx,
            idx + 1
        );

        let mut builder = sqlx::query_as::<_, BookInstance>(&query);
        if let Some(status) = clause.status {
            builder = builder.bind(status);
        }
        if let Some(borrower) = clause.borrower {
            builder = builder.bind(borrower);
        }
        if let Some((from, until)) = clause.dates {
            builder = builder.bind(from).bind(until);
        }

        let rows = builder.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn create(&self, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.status)
        .bind(data.borrower_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from_write)?;

        self.get_by_id(id).await
    }

    pub async fn update(&self, id: Uuid, data: &BookInstanceInput) -> AppResult<BookInstance> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $2, imprint = $3, due_back = $4, status = $5, borrower_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.status)
        .bind(data.borrower_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }
}
