//! Book model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Book as held by the ledger store. Descriptive attributes (title, author,
/// genre) are owned by the catalog layer; circulation only cares about
/// `available` and `holder`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<String>,
    /// True iff no student currently holds the book
    pub available: bool,
    /// Student currently holding the book. Invariant: set iff `available`
    /// is false.
    pub holder: Option<i32>,
}

impl Book {
    /// A new book enters circulation on the shelf
    pub fn new(id: i32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            author: None,
            genre: None,
            available: true,
            holder: None,
        }
    }
}
