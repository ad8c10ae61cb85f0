//! Ledger store: durable record of books, students and the transaction log
//!
//! The circulation engine talks to storage exclusively through the [`Ledger`]
//! trait. Updates to mutable entity state are conditional (compare-and-swap):
//! the caller states what it read, and the store applies the change only if
//! that is still true. A `false` return means the caller lost a race and must
//! abort, not retry.

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Book, Student, Transaction, TransactionFilter},
};

pub use memory::MemoryLedger;
pub use postgres::PostgresLedger;

/// Access contract the circulation engine requires from storage
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_book(&self, id: i32) -> AppResult<Option<Book>>;

    async fn get_student(&self, id: i32) -> AppResult<Option<Student>>;

    /// Conditionally hand the book to `holder` (or back to the shelf when
    /// `None`), gated on the availability flag the caller read. Availability
    /// is derived from the holder, keeping `available == (holder == none)`.
    /// Returns false if the gate did not match.
    async fn update_book_holder(
        &self,
        id: i32,
        expected_available: bool,
        holder: Option<i32>,
    ) -> AppResult<bool>;

    /// Conditionally replace a student's active loan set, gated on the set
    /// the caller read. Returns false if the gate did not match.
    async fn update_student_loans(
        &self,
        id: i32,
        expected: &BTreeSet<i32>,
        new: &BTreeSet<i32>,
    ) -> AppResult<bool>;

    /// Append one transaction to the ledger. Records are never updated or
    /// deleted afterwards.
    async fn append_transaction(&self, transaction: &Transaction) -> AppResult<()>;

    async fn query_transactions(&self, filter: &TransactionFilter)
        -> AppResult<Vec<Transaction>>;

    async fn count_books(&self) -> AppResult<i64>;

    async fn count_unavailable_books(&self) -> AppResult<i64>;

    async fn count_students(&self) -> AppResult<i64>;

    async fn count_transactions(&self) -> AppResult<i64>;
}
