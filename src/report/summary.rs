// Frequency tables over each client's latest stage

use serde::Serialize;
use std::collections::BTreeMap;
use crate::models::{Stage, StageEvent};
use crate::report::group_by_client;

/// A client's most recent stage event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestStage {
    pub client_id: i64,
    pub client_name: String,
    pub employee_name: String,
    pub stage_code: i64,
    pub stage_name: String,
    pub entered_ts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCount {
    pub stage_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeStageCount {
    pub employee_name: String,
    pub stage_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub latest: Vec<LatestStage>,
    pub by_stage: Vec<StageCount>,
    pub by_employee_stage: Vec<EmployeeStageCount>,
}

impl SummaryReport {
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

/// Latest event per client, by (timestamp, event id); ordered by client id
pub fn latest_stage_per_client(events: &[StageEvent]) -> Vec<LatestStage> {
    group_by_client(events)
        .into_iter()
        .filter_map(|(client_id, history)| {
            let latest = history.last()?;
            Some(LatestStage {
                client_id,
                client_name: latest.client_name.clone(),
                employee_name: latest.employee_name.clone(),
                stage_code: latest.stage_code,
                stage_name: latest.stage_name().to_string(),
                entered_ts: latest.created_ts,
            })
        })
        .collect()
}

// Known stages sort by code, every unknown code shares one trailing bucket
fn label_sort_key(stage_code: i64) -> i64 {
    match Stage::from_code(stage_code) {
        Stage::Unknown(_) => i64::MAX,
        stage => stage.code(),
    }
}

/// Clients per distinct stage label, in pipeline order
pub fn count_by_stage(latest: &[LatestStage]) -> Vec<StageCount> {
    let mut counts: BTreeMap<(i64, &str), usize> = BTreeMap::new();
    for entry in latest {
        *counts
            .entry((label_sort_key(entry.stage_code), entry.stage_name.as_str()))
            .or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((_, stage_name), count)| StageCount {
            stage_name: stage_name.to_string(),
            count,
        })
        .collect()
}

/// Clients per (employee, stage label), by employee name then pipeline order
pub fn count_by_employee_stage(latest: &[LatestStage]) -> Vec<EmployeeStageCount> {
    let mut counts: BTreeMap<(&str, i64, &str), usize> = BTreeMap::new();
    for entry in latest {
        *counts
            .entry((
                entry.employee_name.as_str(),
                label_sort_key(entry.stage_code),
                entry.stage_name.as_str(),
            ))
            .or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((employee_name, _, stage_name), count)| EmployeeStageCount {
            employee_name: employee_name.to_string(),
            stage_name: stage_name.to_string(),
            count,
        })
        .collect()
}

pub fn build_summary(events: &[StageEvent]) -> SummaryReport {
    let latest = latest_stage_per_client(events);
    let by_stage = count_by_stage(&latest);
    let by_employee_stage = count_by_employee_stage(&latest);
    SummaryReport {
        latest,
        by_stage,
        by_employee_stage,
    }
}
