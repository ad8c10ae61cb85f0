//! Business logic services

pub mod circulation;
pub mod queries;

use std::sync::Arc;

use crate::{config::CirculationConfig, repository::Ledger};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub circulation: circulation::CirculationService,
    pub queries: queries::QueryService,
}

impl Services {
    /// Create all services over the given ledger store
    pub fn new(ledger: Arc<dyn Ledger>, policy: CirculationConfig) -> Self {
        Self {
            circulation: circulation::CirculationService::new(ledger.clone(), policy.clone()),
            queries: queries::QueryService::new(ledger, policy),
        }
    }
}
