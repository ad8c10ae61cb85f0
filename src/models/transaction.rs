//! Circulation transaction model and query filter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Terminal status of a circulation operation. Only successful operations
/// reach the ledger; failed preconditions abort before any record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Successful,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Successful => "SUCCESSFUL",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SUCCESSFUL" => Some(TransactionStatus::Successful),
            "FAILED" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// One entry of the circulation ledger. Immutable once written; corrections
/// append a new transaction, never edit history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// External handle for the operation, generated at creation
    pub transaction_id: String,
    pub book_id: i32,
    pub student_id: i32,
    /// True for an issue event, false for a return event
    pub is_issue: bool,
    pub status: TransactionStatus,
    /// Non-negative; zero on issue transactions
    pub fine_amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Record a successful issue
    pub fn issue(book_id: i32, student_id: i32, at: DateTime<Utc>) -> Self {
        Self {
            transaction_id: Uuid::new_v4().to_string(),
            book_id,
            student_id,
            is_issue: true,
            status: TransactionStatus::Successful,
            fine_amount: 0,
            created_at: at,
        }
    }

    /// Record a successful return with the computed fine
    pub fn return_of(book_id: i32, student_id: i32, fine_amount: i64, at: DateTime<Utc>) -> Self {
        Self {
            transaction_id: Uuid::new_v4().to_string(),
            book_id,
            student_id,
            is_issue: false,
            status: TransactionStatus::Successful,
            fine_amount,
            created_at: at,
        }
    }
}

/// Predicate for ledger queries. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub book_id: Option<i32>,
    pub student_id: Option<i32>,
    pub is_issue: Option<bool>,
    pub status: Option<TransactionStatus>,
    /// Only transactions strictly older than this instant
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    /// Sort newest first (ties broken by transaction id, descending)
    pub newest_first: bool,
}

impl TransactionFilter {
    /// All successful transactions for a (book, student) pair, newest first
    pub fn successful_pair(book_id: i32, student_id: i32) -> Self {
        Self {
            book_id: Some(book_id),
            student_id: Some(student_id),
            status: Some(TransactionStatus::Successful),
            newest_first: true,
            ..Self::default()
        }
    }
}
