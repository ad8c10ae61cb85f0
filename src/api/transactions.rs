//! Transaction history, overdue list and dashboard endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, models::Transaction};

/// Query parameters for the recent transaction list
#[derive(Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of transactions to return (default 20)
    pub limit: Option<u32>,
}

/// An open issue past the allowed loan period
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueLoan {
    /// Id of the issue transaction
    pub transaction_id: String,
    pub book_id: i32,
    pub student_id: i32,
    /// When the book was issued
    pub issued_at: DateTime<Utc>,
    /// Whole days past the allowed period
    pub days_overdue: i64,
}

/// Dashboard aggregates
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_books: i64,
    pub total_students: i64,
    pub total_transactions: i64,
    pub books_unavailable: i64,
    /// Percentage of books currently out on loan
    pub borrowed_percentage: f64,
}

/// List recent transactions, newest first
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent transactions", body = Vec<Transaction>)
    )
)]
pub async fn list_recent(
    State(state): State<crate::AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    let limit = query.limit.unwrap_or(20) as i64;
    let transactions = state.services.queries.recent_transactions(limit).await?;
    Ok(Json(transactions))
}

/// List overdue loans
#[utoipa::path(
    get,
    path = "/transactions/overdue",
    tag = "transactions",
    responses(
        (status = 200, description = "Open issues past the allowed loan period", body = Vec<OverdueLoan>)
    )
)]
pub async fn list_overdue(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<OverdueLoan>>> {
    let overdue = state.services.queries.overdue_loans().await?;
    Ok(Json(overdue))
}

/// Transaction history for a book
#[utoipa::path(
    get,
    path = "/books/{id}/transactions",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book's transaction history", body = Vec<Transaction>),
        (status = 404, description = "Book not found")
    )
)]
pub async fn book_history(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<Vec<Transaction>>> {
    let transactions = state.services.queries.book_history(book_id).await?;
    Ok(Json(transactions))
}

/// Transaction history for a student
#[utoipa::path(
    get,
    path = "/students/{id}/transactions",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student's transaction history", body = Vec<Transaction>),
        (status = 404, description = "Student not found")
    )
)]
pub async fn student_history(
    State(state): State<crate::AppState>,
    Path(student_id): Path<i32>,
) -> AppResult<Json<Vec<Transaction>>> {
    let transactions = state.services.queries.student_history(student_id).await?;
    Ok(Json(transactions))
}

/// Dashboard aggregates
#[utoipa::path(
    get,
    path = "/stats",
    tag = "transactions",
    responses(
        (status = 200, description = "Library-wide circulation aggregates", body = DashboardStats)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.queries.dashboard().await?;
    Ok(Json(stats))
}
