//! PostgreSQL ledger store

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{Book, Student, Transaction, TransactionFilter, TransactionStatus},
};

use super::Ledger;

#[derive(Clone)]
pub struct PostgresLedger {
    pool: Pool<Postgres>,
}

impl PostgresLedger {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_transaction(row: &sqlx::postgres::PgRow) -> AppResult<Transaction> {
    let status: String = row.get("status");
    let status = TransactionStatus::parse(&status)
        .ok_or_else(|| AppError::Internal(format!("unknown transaction status '{}'", status)))?;

    Ok(Transaction {
        transaction_id: row.get("transaction_id"),
        book_id: row.get("book_id"),
        student_id: row.get("student_id"),
        is_issue: row.get("is_issue"),
        status,
        fine_amount: row.get("fine_amount"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl Ledger for PostgresLedger {
    async fn get_book(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, genre, available, holder FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn get_student(&self, id: i32) -> AppResult<Option<Student>> {
        let row = sqlx::query(
            "SELECT id, name, email, active_loans FROM students WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Student {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            active_loans: row.get::<Vec<i32>, _>("active_loans").into_iter().collect(),
        }))
    }

    async fn update_book_holder(
        &self,
        id: i32,
        expected_available: bool,
        holder: Option<i32>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET available = $2, holder = $3 WHERE id = $1 AND available = $4",
        )
        .bind(id)
        .bind(holder.is_none())
        .bind(holder)
        .bind(expected_available)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_student_loans(
        &self,
        id: i32,
        expected: &BTreeSet<i32>,
        new: &BTreeSet<i32>,
    ) -> AppResult<bool> {
        // Loan sets are stored as sorted arrays, so array equality is set
        // equality.
        let expected: Vec<i32> = expected.iter().copied().collect();
        let new: Vec<i32> = new.iter().copied().collect();

        let result = sqlx::query(
            "UPDATE students SET active_loans = $2 WHERE id = $1 AND active_loans = $3",
        )
        .bind(id)
        .bind(new)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn append_transaction(&self, transaction: &Transaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (transaction_id, book_id, student_id, is_issue, status, fine_amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&transaction.transaction_id)
        .bind(transaction.book_id)
        .bind(transaction.student_id)
        .bind(transaction.is_issue)
        .bind(transaction.status.as_str())
        .bind(transaction.fine_amount)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> AppResult<Vec<Transaction>> {
        // Each condition consumes exactly one bind parameter, in field order.
        let mut conditions: Vec<String> = Vec::new();
        if filter.book_id.is_some() {
            conditions.push(format!("book_id = ${}", conditions.len() + 1));
        }
        if filter.student_id.is_some() {
            conditions.push(format!("student_id = ${}", conditions.len() + 1));
        }
        if filter.is_issue.is_some() {
            conditions.push(format!("is_issue = ${}", conditions.len() + 1));
        }
        if filter.status.is_some() {
            conditions.push(format!("status = ${}", conditions.len() + 1));
        }
        if filter.before.is_some() {
            conditions.push(format!("created_at < ${}", conditions.len() + 1));
        }

        let next_param = conditions.len() + 1;
        let where_clause = if conditions.is_empty() {
            "TRUE".to_string()
        } else {
            conditions.join(" AND ")
        };

        let order = if filter.newest_first {
            "created_at DESC, transaction_id DESC"
        } else {
            "created_at ASC, transaction_id ASC"
        };

        let mut sql = format!(
            "SELECT transaction_id, book_id, student_id, is_issue, status, fine_amount, created_at \
             FROM transactions WHERE {} ORDER BY {}",
            where_clause, order
        );
        if filter.limit.is_some() {
            sql.push_str(&format!(" LIMIT ${}", next_param));
        }

        let mut query = sqlx::query(&sql);
        if let Some(book_id) = filter.book_id {
            query = query.bind(book_id);
        }
        if let Some(student_id) = filter.student_id {
            query = query.bind(student_id);
        }
        if let Some(is_issue) = filter.is_issue {
            query = query.bind(is_issue);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(before) = filter.before {
            query = query.bind(before);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(row_to_transaction)
            .collect()
    }

    async fn count_books(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_unavailable_books(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE NOT available")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_students(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_transactions(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
