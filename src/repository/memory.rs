//! In-memory ledger store
//!
//! A complete model of the [`Ledger`] contract backed by process memory.
//! Conditional updates take the write lock for the whole check-and-mutate, so
//! they are atomic with respect to each other, matching the guarantees the
//! engine relies on from the SQL store.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{Book, Student, Transaction, TransactionFilter},
};

use super::Ledger;

#[derive(Default)]
struct Inner {
    books: HashMap<i32, Book>,
    students: HashMap<i32, Student>,
    transactions: Vec<Transaction>,
}

#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a book. Stand-in for the catalog CRUD layer.
    pub async fn insert_book(&self, book: Book) {
        self.inner.write().await.books.insert(book.id, book);
    }

    /// Register a student. Stand-in for the catalog CRUD layer.
    pub async fn insert_student(&self, student: Student) {
        self.inner.write().await.students.insert(student.id, student);
    }
}

fn matches(transaction: &Transaction, filter: &TransactionFilter) -> bool {
    if let Some(book_id) = filter.book_id {
        if transaction.book_id != book_id {
            return false;
        }
    }
    if let Some(student_id) = filter.student_id {
        if transaction.student_id != student_id {
            return false;
        }
    }
    if let Some(is_issue) = filter.is_issue {
        if transaction.is_issue != is_issue {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if transaction.status != status {
            return false;
        }
    }
    if let Some(before) = filter.before {
        if transaction.created_at >= before {
            return false;
        }
    }
    true
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn get_book(&self, id: i32) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.books.get(&id).cloned())
    }

    async fn get_student(&self, id: i32) -> AppResult<Option<Student>> {
        Ok(self.inner.read().await.students.get(&id).cloned())
    }

    async fn update_book_holder(
        &self,
        id: i32,
        expected_available: bool,
        holder: Option<i32>,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.books.get_mut(&id) {
            Some(book) if book.available == expected_available => {
                book.available = holder.is_none();
                book.holder = holder;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_student_loans(
        &self,
        id: i32,
        expected: &BTreeSet<i32>,
        new: &BTreeSet<i32>,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.students.get_mut(&id) {
            Some(student) if student.active_loans == *expected => {
                student.active_loans = new.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn append_transaction(&self, transaction: &Transaction) -> AppResult<()> {
        self.inner.write().await.transactions.push(transaction.clone());
        Ok(())
    }

    async fn query_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> AppResult<Vec<Transaction>> {
        let inner = self.inner.read().await;

        let mut result: Vec<Transaction> = inner
            .transactions
            .iter()
            .filter(|transaction| matches(transaction, filter))
            .cloned()
            .collect();

        result.sort_by(|a, b| {
            let key_a = (a.created_at, &a.transaction_id);
            let key_b = (b.created_at, &b.transaction_id);
            if filter.newest_first {
                key_b.cmp(&key_a)
            } else {
                key_a.cmp(&key_b)
            }
        });

        if let Some(limit) = filter.limit {
            result.truncate(limit.max(0) as usize);
        }

        Ok(result)
    }

    async fn count_books(&self) -> AppResult<i64> {
        Ok(self.inner.read().await.books.len() as i64)
    }

    async fn count_unavailable_books(&self) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.books.values().filter(|book| !book.available).count() as i64)
    }

    async fn count_students(&self) -> AppResult<i64> {
        Ok(self.inner.read().await.students.len() as i64)
    }

    async fn count_transactions(&self) -> AppResult<i64> {
        Ok(self.inner.read().await.transactions.len() as i64)
    }
}
