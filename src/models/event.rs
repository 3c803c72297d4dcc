use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use crate::models::Stage;

/// One stage transition joined with its client and employee
///
/// Rows are what every report consumes. `created_ts` is Unix seconds (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub employee_id: i64,
    pub employee_name: String,
    pub stage_code: i64,
    pub created_ts: i64,
}

impl StageEvent {
    pub fn stage(&self) -> Stage {
        Stage::from_code(self.stage_code)
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage().label()
    }

    /// Chronological order within a client's history.
    /// Equal timestamps fall back to the event id, so the later insert wins.
    pub fn chronological_cmp(&self, other: &StageEvent) -> Ordering {
        self.created_ts
            .cmp(&other.created_ts)
            .then(self.id.cmp(&other.id))
    }
}

/// A bare stage transition, independent of any employee assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub id: i64,
    pub client_id: i64,
    pub stage_code: i64,
    pub created_ts: i64,
}

impl StageTransition {
    pub fn stage_name(&self) -> &'static str {
        Stage::from_code(self.stage_code).label()
    }
}
