//! Read-only derived views over the circulation ledger

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    api::transactions::{DashboardStats, OverdueLoan},
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{Transaction, TransactionFilter, TransactionStatus},
    repository::Ledger,
};

#[derive(Clone)]
pub struct QueryService {
    ledger: Arc<dyn Ledger>,
    policy: CirculationConfig,
}

impl QueryService {
    pub fn new(ledger: Arc<dyn Ledger>, policy: CirculationConfig) -> Self {
        Self { ledger, policy }
    }

    /// Most recent transactions, newest first
    pub async fn recent_transactions(&self, limit: i64) -> AppResult<Vec<Transaction>> {
        self.ledger
            .query_transactions(&TransactionFilter {
                limit: Some(limit),
                newest_first: true,
                ..TransactionFilter::default()
            })
            .await
    }

    /// Issue transactions older than the allowed loan period with no later
    /// return for the same (book, student) pair
    pub async fn overdue_loans(&self) -> AppResult<Vec<OverdueLoan>> {
        let now = Utc::now();
        let cutoff = now - Duration::days(self.policy.max_allowed_days);

        let issues = self
            .ledger
            .query_transactions(&TransactionFilter {
                is_issue: Some(true),
                status: Some(TransactionStatus::Successful),
                before: Some(cutoff),
                ..TransactionFilter::default()
            })
            .await?;

        if issues.is_empty() {
            return Ok(Vec::new());
        }

        let returns = self
            .ledger
            .query_transactions(&TransactionFilter {
                is_issue: Some(false),
                status: Some(TransactionStatus::Successful),
                ..TransactionFilter::default()
            })
            .await?;

        let overdue = issues
            .into_iter()
            .filter(|issue| {
                !returns.iter().any(|ret| {
                    ret.book_id == issue.book_id
                        && ret.student_id == issue.student_id
                        && (ret.created_at, &ret.transaction_id)
                            > (issue.created_at, &issue.transaction_id)
                })
            })
            .map(|issue| OverdueLoan {
                days_overdue: (now - issue.created_at).num_days() - self.policy.max_allowed_days,
                transaction_id: issue.transaction_id,
                book_id: issue.book_id,
                student_id: issue.student_id,
                issued_at: issue.created_at,
            })
            .collect();

        Ok(overdue)
    }

    /// Full transaction history for a book, newest first
    pub async fn book_history(&self, book_id: i32) -> AppResult<Vec<Transaction>> {
        self.ledger
            .get_book(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        self.ledger
            .query_transactions(&TransactionFilter {
                book_id: Some(book_id),
                newest_first: true,
                ..TransactionFilter::default()
            })
            .await
    }

    /// Full transaction history for a student, newest first
    pub async fn student_history(&self, student_id: i32) -> AppResult<Vec<Transaction>> {
        self.ledger
            .get_student(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", student_id)))?;

        self.ledger
            .query_transactions(&TransactionFilter {
                student_id: Some(student_id),
                newest_first: true,
                ..TransactionFilter::default()
            })
            .await
    }

    /// Aggregate counts for the dashboard
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let total_books = self.ledger.count_books().await?;
        let books_unavailable = self.ledger.count_unavailable_books().await?;
        let total_students = self.ledger.count_students().await?;
        let total_transactions = self.ledger.count_transactions().await?;

        let borrowed_percentage = if total_books == 0 {
            0.0
        } else {
            books_unavailable as f64 / total_books as f64 * 100.0
        };

        Ok(DashboardStats {
            total_books,
            total_students,
            total_transactions,
            books_unavailable,
            borrowed_percentage,
        })
    }
}
