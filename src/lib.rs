//! Biblio Student Library Circulation Backend
//!
//! A Rust implementation of a library circulation server: it tracks which
//! student holds which book, records every issue and return in an append-only
//! transaction ledger, and computes overdue fines on return.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
