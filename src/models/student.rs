//! Student model

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Registered student. `active_loans` holds the ids of the books the student
/// currently has out, bounded by the configured loan limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub active_loans: BTreeSet<i32>,
}

impl Student {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
            active_loans: BTreeSet::new(),
        }
    }
}
