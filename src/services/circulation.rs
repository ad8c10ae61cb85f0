//! Circulation engine
//!
//! Decides whether a book may be issued to a student, mutates book and
//! student state, and appends the matching transaction record. All state
//! updates go through the ledger's conditional updates: the engine states
//! what it read, and aborts with a conflict if another caller got there
//! first. Lost races are never retried here; retry policy belongs to the
//! caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    config::CirculationConfig,
    error::{AppError, AppResult},
    models::{Transaction, TransactionFilter},
    repository::Ledger,
};

#[derive(Clone)]
pub struct CirculationService {
    ledger: Arc<dyn Ledger>,
    policy: CirculationConfig,
}

/// Fine owed for a book issued at `issued_at` and returned at `now`. Elapsed
/// time is floored to whole days; clock skew clamps to zero rather than
/// producing a negative fine.
fn compute_fine(issued_at: DateTime<Utc>, now: DateTime<Utc>, policy: &CirculationConfig) -> i64 {
    let days_held = (now - issued_at).num_days().max(0);
    if days_held > policy.max_allowed_days {
        (days_held - policy.max_allowed_days) * policy.fine_per_day
    } else {
        0
    }
}

impl CirculationService {
    pub fn new(ledger: Arc<dyn Ledger>, policy: CirculationConfig) -> Self {
        Self { ledger, policy }
    }

    /// Issue a book to a student. Returns the id of the appended issue
    /// transaction.
    pub async fn issue_book(&self, student_id: i32, book_id: i32) -> AppResult<String> {
        tracing::debug!(student_id, book_id, "issue requested");

        let book = self.ledger.get_book(book_id).await?.ok_or_else(|| {
            tracing::warn!(student_id, book_id, "issue refused: unknown book");
            AppError::NotFound(format!("Book with id {} not found", book_id))
        })?;

        if !book.available {
            tracing::warn!(student_id, book_id, "issue refused: book unavailable");
            return Err(AppError::Conflict("Book is unavailable".to_string()));
        }

        let student = self.ledger.get_student(student_id).await?.ok_or_else(|| {
            tracing::warn!(student_id, book_id, "issue refused: unknown student");
            AppError::NotFound(format!("Student with id {} not found", student_id))
        })?;

        if student.active_loans.len() >= self.policy.max_allowed_books {
            tracing::warn!(
                student_id,
                book_id,
                loans = student.active_loans.len(),
                "issue refused: loan limit reached"
            );
            return Err(AppError::Conflict(format!(
                "Loan limit reached ({}/{})",
                student.active_loans.len(),
                self.policy.max_allowed_books
            )));
        }

        // Claim the book. Losing the race means a concurrent issue won.
        if !self
            .ledger
            .update_book_holder(book_id, true, Some(student_id))
            .await?
        {
            tracing::warn!(student_id, book_id, "issue refused: book was claimed concurrently");
            return Err(AppError::Conflict("Book is unavailable".to_string()));
        }

        let mut new_loans = student.active_loans.clone();
        new_loans.insert(book_id);
        if !self
            .ledger
            .update_student_loans(student_id, &student.active_loans, &new_loans)
            .await?
        {
            self.unwind_book(book_id, false, None).await;
            tracing::warn!(student_id, book_id, "issue refused: student loans changed concurrently");
            return Err(AppError::Conflict(
                "Student loans changed concurrently".to_string(),
            ));
        }

        let transaction = Transaction::issue(book_id, student_id, Utc::now());
        if let Err(e) = self.ledger.append_transaction(&transaction).await {
            // State and ledger must not diverge: withdraw both mutations.
            self.unwind_student(student_id, &new_loans, &student.active_loans)
                .await;
            self.unwind_book(book_id, false, None).await;
            tracing::warn!(student_id, book_id, "issue failed while appending transaction");
            return Err(e);
        }

        tracing::info!(
            student_id,
            book_id,
            transaction_id = %transaction.transaction_id,
            "book issued"
        );
        Ok(transaction.transaction_id)
    }

    /// Return a book held by a student. Returns the id of the appended return
    /// transaction and the fine owed.
    pub async fn return_book(&self, student_id: i32, book_id: i32) -> AppResult<(String, i64)> {
        tracing::debug!(student_id, book_id, "return requested");

        let book = self.ledger.get_book(book_id).await?.ok_or_else(|| {
            tracing::warn!(student_id, book_id, "return refused: unknown book");
            AppError::NotFound(format!("Book with id {} not found", book_id))
        })?;

        let student = self.ledger.get_student(student_id).await?.ok_or_else(|| {
            tracing::warn!(student_id, book_id, "return refused: unknown student");
            AppError::NotFound(format!("Student with id {} not found", student_id))
        })?;

        if book.holder != Some(student_id) {
            tracing::warn!(student_id, book_id, "return refused: book not issued to this student");
            return Err(AppError::Conflict(
                "Book is not issued to this student".to_string(),
            ));
        }

        // The open issue must be the newest ledger entry for this pair; a
        // return on top, or no entry at all, means state and ledger disagree.
        let history = self
            .ledger
            .query_transactions(&TransactionFilter {
                limit: Some(1),
                ..TransactionFilter::successful_pair(book_id, student_id)
            })
            .await?;
        let issue = match history.into_iter().next() {
            Some(entry) if entry.is_issue => entry,
            _ => {
                tracing::error!(student_id, book_id, "return aborted: no matching issue record");
                return Err(AppError::Inconsistent(
                    "No matching issue record".to_string(),
                ));
            }
        };

        let now = Utc::now();
        let fine_amount = compute_fine(issue.created_at, now, &self.policy);

        if !self.ledger.update_book_holder(book_id, false, None).await? {
            tracing::warn!(student_id, book_id, "return refused: book changed concurrently");
            return Err(AppError::Conflict("Book changed concurrently".to_string()));
        }

        let mut new_loans = student.active_loans.clone();
        new_loans.remove(&book_id);
        if !self
            .ledger
            .update_student_loans(student_id, &student.active_loans, &new_loans)
            .await?
        {
            self.unwind_book(book_id, true, Some(student_id)).await;
            tracing::warn!(student_id, book_id, "return refused: student loans changed concurrently");
            return Err(AppError::Conflict(
                "Student loans changed concurrently".to_string(),
            ));
        }

        let transaction = Transaction::return_of(book_id, student_id, fine_amount, now);
        if let Err(e) = self.ledger.append_transaction(&transaction).await {
            self.unwind_student(student_id, &new_loans, &student.active_loans)
                .await;
            self.unwind_book(book_id, true, Some(student_id)).await;
            tracing::warn!(student_id, book_id, "return failed while appending transaction");
            return Err(e);
        }

        tracing::info!(
            student_id,
            book_id,
            transaction_id = %transaction.transaction_id,
            fine_amount,
            "book returned"
        );
        Ok((transaction.transaction_id, fine_amount))
    }

    /// Best-effort rollback of a book mutation after a partial operation.
    /// A failure here means entity state has drifted from the ledger.
    async fn unwind_book(&self, book_id: i32, expected_available: bool, holder: Option<i32>) {
        match self
            .ledger
            .update_book_holder(book_id, expected_available, holder)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(book_id, "rollback lost a race; book state may be inconsistent")
            }
            Err(e) => {
                tracing::error!(book_id, error = %e, "rollback failed; book state may be inconsistent")
            }
        }
    }

    /// Best-effort rollback of a student loan-set mutation.
    async fn unwind_student(
        &self,
        student_id: i32,
        current: &BTreeSet<i32>,
        restore: &BTreeSet<i32>,
    ) {
        match self
            .ledger
            .update_student_loans(student_id, current, restore)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::error!(
                student_id,
                "rollback lost a race; student loan set may be inconsistent"
            ),
            Err(e) => tracing::error!(
                student_id,
                error = %e,
                "rollback failed; student loan set may be inconsistent"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy() -> CirculationConfig {
        CirculationConfig {
            max_allowed_books: 3,
            max_allowed_days: 15,
            fine_per_day: 5,
        }
    }

    #[test]
    fn no_fine_within_allowed_days() {
        let now = Utc::now();
        assert_eq!(compute_fine(now - Duration::days(10), now, &policy()), 0);
    }

    #[test]
    fn no_fine_on_the_last_allowed_day() {
        let now = Utc::now();
        assert_eq!(compute_fine(now - Duration::days(15), now, &policy()), 0);
    }

    #[test]
    fn fine_accrues_per_day_past_the_limit() {
        let now = Utc::now();
        assert_eq!(compute_fine(now - Duration::days(20), now, &policy()), 25);
    }

    #[test]
    fn partial_days_are_floored() {
        let now = Utc::now();
        let issued_at = now - Duration::days(16) - Duration::hours(23);
        assert_eq!(compute_fine(issued_at, now, &policy()), 5);
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let now = Utc::now();
        assert_eq!(compute_fine(now + Duration::days(2), now, &policy()), 0);
    }
}
