//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{circulation, health, transactions};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblio API",
        version = "0.1.0",
        description = "Student Library Circulation REST API",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Circulation
        circulation::issue_book,
        circulation::return_book,
        // Transactions
        transactions::list_recent,
        transactions::list_overdue,
        transactions::book_history,
        transactions::student_history,
        transactions::get_stats,
    ),
    components(
        schemas(
            // Circulation
            circulation::IssueRequest,
            circulation::IssueResponse,
            circulation::ReturnRequest,
            circulation::ReturnResponse,
            // Transactions
            crate::models::transaction::Transaction,
            crate::models::transaction::TransactionStatus,
            transactions::OverdueLoan,
            transactions::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "circulation", description = "Issue and return books"),
        (name = "transactions", description = "Ledger queries and aggregates")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
