//! API handlers for Biblio REST endpoints

pub mod circulation;
pub mod health;
pub mod openapi;
pub mod transactions;
