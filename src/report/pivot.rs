// Wide stage report: one row per client, one column pair per event position

use serde::Serialize;
use crate::models::StageEvent;
use crate::report::{group_by_client, profile_link};

/// Stage a client entered at a given position of its history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCell {
    pub stage_code: i64,
    pub stage_name: String,
    pub entered_ts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub client_id: i64,
    pub profile_link: String,
    pub client_name: String,
    pub employee_name: String,
    /// Exactly `max_depth` entries; positions past the client's history are `None`
    pub stages: Vec<Option<StageCell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotReport {
    pub max_depth: usize,
    pub rows: Vec<PivotRow>,
}

impl PivotReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column headers, including `max_depth` stage/time pairs
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = vec![
            "client_id".to_string(),
            "profile_link".to_string(),
            "client_name".to_string(),
            "employee_name".to_string(),
        ];
        for position in 1..=self.max_depth {
            columns.push(format!("stage_{}", position));
            columns.push(format!("time_entered_stage_{}", position));
        }
        columns
    }
}

/// Build the wide report
///
/// First pass ranks each client's events chronologically and finds the
/// deepest history; second pass projects every client onto that width.
/// Rows come out in ascending client id.
pub fn build_pivot(events: &[StageEvent], link_prefix: &str) -> PivotReport {
    let groups = group_by_client(events);
    let depth = groups.values().map(Vec::len).max().unwrap_or(0);

    let rows = groups
        .into_iter()
        .filter_map(|(client_id, history)| {
            let first = history.first()?;
            let mut stages: Vec<Option<StageCell>> = history
                .iter()
                .map(|event| {
                    Some(StageCell {
                        stage_code: event.stage_code,
                        stage_name: event.stage_name().to_string(),
                        entered_ts: event.created_ts,
                    })
                })
                .collect();
            stages.resize(depth, None);

            Some(PivotRow {
                client_id,
                profile_link: profile_link(link_prefix, client_id),
                client_name: first.client_name.clone(),
                employee_name: first.employee_name.clone(),
                stages,
            })
        })
        .collect();

    PivotReport {
        max_depth: depth,
        rows,
    }
}
