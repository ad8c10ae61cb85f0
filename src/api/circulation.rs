//! Circulation endpoints (issue and return)

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppResult;

/// Issue request
#[derive(Deserialize, ToSchema)]
pub struct IssueRequest {
    /// Student borrowing the book
    pub student_id: i32,
    /// Book to issue
    pub book_id: i32,
}

/// Issue response
#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    /// Id of the appended issue transaction
    pub transaction_id: String,
}

/// Return request
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Student returning the book
    pub student_id: i32,
    /// Book being returned
    pub book_id: i32,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Id of the appended return transaction
    pub transaction_id: String,
    /// Fine owed, in currency units
    pub fine_amount: i64,
}

/// Issue a book to a student
#[utoipa::path(
    post,
    path = "/circulation/issue",
    tag = "circulation",
    request_body = IssueRequest,
    responses(
        (status = 201, description = "Book issued", body = IssueResponse),
        (status = 404, description = "Book or student not found"),
        (status = 409, description = "Book unavailable or loan limit reached")
    )
)]
pub async fn issue_book(
    State(state): State<crate::AppState>,
    Json(request): Json<IssueRequest>,
) -> AppResult<(StatusCode, Json<IssueResponse>)> {
    let transaction_id = state
        .services
        .circulation
        .issue_book(request.student_id, request.book_id)
        .await?;

    Ok((StatusCode::CREATED, Json(IssueResponse { transaction_id })))
}

/// Return a book held by a student
#[utoipa::path(
    post,
    path = "/circulation/return",
    tag = "circulation",
    request_body = ReturnRequest,
    responses(
        (status = 201, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Book or student not found"),
        (status = 409, description = "Book is not issued to this student")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    Json(request): Json<ReturnRequest>,
) -> AppResult<(StatusCode, Json<ReturnResponse>)> {
    let (transaction_id, fine_amount) = state
        .services
        .circulation
        .return_book(request.student_id, request.book_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReturnResponse {
            transaction_id,
            fine_amount,
        }),
    ))
}
