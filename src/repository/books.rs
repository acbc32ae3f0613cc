//! Books repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        admin_row::BookAdminRow,
        book::{Book, BookInput, BookSummary, DISPLAY_GENRE_LIMIT},
    },
};

const BOOK_COLUMNS: &str = "id, title, author_id, summary, isbn, language_id";

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id, a.last_name || ', ' || a.first_name AS author_name
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Books in default order (id)
    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} ORDER BY b.id LIMIT $1 OFFSET $2", SUMMARY_SELECT);
        let rows = sqlx::query_as::<_, BookSummary>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Books written by an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.id", SUMMARY_SELECT);
        let rows = sqlx::query_as::<_, BookSummary>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Change-list rows with author, language and the first genres resolved
    pub async fn list_admin_rows(&self, offset: i64, limit: i64) -> AppResult<Vec<BookAdminRow>> {
        let rows = sqlx::query_as::<_, BookAdminRow>(
            r#"
            SELECT b.id, b.title,
                   a.last_name || ', ' || a.first_name AS author,
                   COALESCE((
                       SELECT string_agg(t.name, ', ' ORDER BY t.id)
                       FROM (
                           SELECT g.id, g.name
                           FROM book_genres bg
                           JOIN genres g ON g.id = bg.genre_id
                           WHERE bg.book_id = b.id
                           ORDER BY g.id
                           LIMIT $3
                       ) t
                   ), '') AS display_genre,
                   l.name AS language
            FROM books b
            JOIN authors a ON a.id = b.author_id
            JOIN languages l ON l.id = b.language_id
            ORDER BY b.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .bind(DISPLAY_GENRE_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a book and its genre links
    pub async fn create(&self, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(&data.title)
            .bind(data.author_id)
            .bind(&data.summary)
            .bind(&data.isbn)
            .bind(data.language_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_write)?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(book.id)
        .bind(&data.genre_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }

    /// Update a book and replace its genre links
    pub async fn update(&self, id: i32, data: &BookInput) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, summary = $4, isbn = $5, language_id = $6
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(&data.title)
            .bind(data.author_id)
            .bind(&data.summary)
            .bind(&data.isbn)
            .bind(data.language_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::from_write)?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int[]) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&data.genre_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
