//! Query service tests against the in-memory ledger

use std::sync::Arc;

use chrono::{Duration, Utc};

use biblio_server::{
    config::CirculationConfig,
    error::AppError,
    models::{Book, Student, Transaction},
    repository::{Ledger, MemoryLedger},
    services::queries::QueryService,
};

fn policy() -> CirculationConfig {
    CirculationConfig {
        max_allowed_books: 3,
        max_allowed_days: 15,
        fine_per_day: 5,
    }
}

fn setup() -> (Arc<MemoryLedger>, QueryService) {
    let ledger = Arc::new(MemoryLedger::new());
    let service = QueryService::new(ledger.clone(), policy());
    (ledger, service)
}

#[tokio::test]
async fn recent_transactions_come_newest_first_and_respect_the_limit() {
    let (ledger, service) = setup();
    let now = Utc::now();

    for days_ago in [3, 1, 2] {
        let issue = Transaction::issue(days_ago, 1, now - Duration::days(days_ago as i64));
        ledger.append_transaction(&issue).await.unwrap();
    }

    let recent = service.recent_transactions(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].book_id, 1);
    assert_eq!(recent[1].book_id, 2);
}

#[tokio::test]
async fn overdue_lists_only_open_issues_past_the_allowed_days() {
    let (ledger, service) = setup();
    let now = Utc::now();

    // Open issue, 20 days old: overdue by 5 days
    let stale = Transaction::issue(1, 1, now - Duration::days(20));
    ledger.append_transaction(&stale).await.unwrap();

    // Old issue already returned: not overdue
    let returned = Transaction::issue(2, 1, now - Duration::days(30));
    ledger.append_transaction(&returned).await.unwrap();
    let ret = Transaction::return_of(2, 1, 50, now - Duration::days(14));
    ledger.append_transaction(&ret).await.unwrap();

    // Fresh issue: not overdue yet
    let fresh = Transaction::issue(3, 2, now - Duration::days(2));
    ledger.append_transaction(&fresh).await.unwrap();

    let overdue = service.overdue_loans().await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].book_id, 1);
    assert_eq!(overdue[0].transaction_id, stale.transaction_id);
    assert_eq!(overdue[0].days_overdue, 5);
}

#[tokio::test]
async fn reissued_book_is_overdue_only_for_the_open_issue() {
    let (ledger, service) = setup();
    let now = Utc::now();

    // First cycle closed long ago, second issue still open and stale
    let first = Transaction::issue(1, 1, now - Duration::days(60));
    ledger.append_transaction(&first).await.unwrap();
    let ret = Transaction::return_of(1, 1, 0, now - Duration::days(50));
    ledger.append_transaction(&ret).await.unwrap();
    let second = Transaction::issue(1, 1, now - Duration::days(18));
    ledger.append_transaction(&second).await.unwrap();

    let overdue = service.overdue_loans().await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].transaction_id, second.transaction_id);
    assert_eq!(overdue[0].days_overdue, 3);
}

#[tokio::test]
async fn book_history_requires_the_book_to_exist() {
    let (_ledger, service) = setup();

    let err = service.book_history(99).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn student_history_returns_all_of_a_students_transactions() {
    let (ledger, service) = setup();
    ledger.insert_student(Student::new(1, "Ada")).await;
    let now = Utc::now();

    let issue = Transaction::issue(1, 1, now - Duration::days(4));
    ledger.append_transaction(&issue).await.unwrap();
    let ret = Transaction::return_of(1, 1, 0, now - Duration::days(1));
    ledger.append_transaction(&ret).await.unwrap();
    let other = Transaction::issue(2, 2, now - Duration::days(2));
    ledger.append_transaction(&other).await.unwrap();

    let history = service.student_history(1).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[0].is_issue);
    assert!(history[1].is_issue);
}

#[tokio::test]
async fn dashboard_reports_totals_and_borrowed_percentage() {
    let (ledger, service) = setup();

    ledger.insert_book(Book::new(1, "Dune")).await;
    let mut held = Book::new(2, "Emma");
    held.available = false;
    held.holder = Some(1);
    ledger.insert_book(held).await;

    let mut student = Student::new(1, "Ada");
    student.active_loans.insert(2);
    ledger.insert_student(student).await;

    let issue = Transaction::issue(2, 1, Utc::now());
    ledger.append_transaction(&issue).await.unwrap();

    let stats = service.dashboard().await.unwrap();
    assert_eq!(stats.total_books, 2);
    assert_eq!(stats.total_students, 1);
    assert_eq!(stats.total_transactions, 1);
    assert_eq!(stats.books_unavailable, 1);
    assert!((stats.borrowed_percentage - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn dashboard_with_no_books_reports_zero_percentage() {
    let (_ledger, service) = setup();

    let stats = service.dashboard().await.unwrap();
    assert_eq!(stats.total_books, 0);
    assert_eq!(stats.borrowed_percentage, 0.0);
}
