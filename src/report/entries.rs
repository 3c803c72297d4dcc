// Whole-history listing of every entry into the later pipeline stages

use serde::Serialize;
use crate::models::{stage_label, StageEvent};
use crate::report::window::{tally_by_day, tally_by_employee_day};
use crate::report::{profile_link, DailyCount, EmployeeDayCount};

/// One stage event at or past the report's minimum stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEntry {
    pub event_id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub employee_name: String,
    pub stage_code: i64,
    pub stage_name: String,
    pub entered_ts: i64,
    pub profile_link: String,
}

/// Raw stage entries plus per-day counts of those entries
///
/// Unlike [`WindowedReport`](crate::report::WindowedReport) nothing is
/// aggregated per client: a client that moved 4 then 5 is listed twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageEntryReport {
    pub min_stage: i64,
    pub entries: Vec<StageEntry>,
    pub daily: Vec<DailyCount>,
    pub by_employee_day: Vec<EmployeeDayCount>,
}

impl StageEntryReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct clients among the entries
    pub fn client_count(&self) -> usize {
        let mut ids: Vec<i64> = self.entries.iter().map(|e| e.client_id).collect();
        ids.dedup();
        ids.len()
    }
}

/// Every event with `stage_code >= min_stage`, by client then chronologically
pub fn build_stage_entry_report(
    events: &[StageEvent],
    min_stage: i64,
    link_prefix: &str,
) -> StageEntryReport {
    let mut kept: Vec<&StageEvent> = events.iter().filter(|e| e.stage_code >= min_stage).collect();
    kept.sort_by(|a, b| a.client_id.cmp(&b.client_id).then(a.chronological_cmp(b)));

    let entries: Vec<StageEntry> = kept
        .iter()
        .map(|e| StageEntry {
            event_id: e.id,
            client_id: e.client_id,
            client_name: e.client_name.clone(),
            employee_name: e.employee_name.clone(),
            stage_code: e.stage_code,
            stage_name: stage_label(e.stage_code).to_string(),
            entered_ts: e.created_ts,
            profile_link: profile_link(link_prefix, e.client_id),
        })
        .collect();
    let daily = tally_by_day(entries.iter().map(|e| e.entered_ts));
    let by_employee_day =
        tally_by_employee_day(entries.iter().map(|e| (e.entered_ts, e.employee_name.as_str())));

    StageEntryReport {
        min_stage,
        entries,
        daily,
        by_employee_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::{event, HOUR};
    use crate::report::PROGRESSION_MIN_STAGE;
    use chrono::NaiveDate;

    // 2024-03-10T12:00:00Z
    const NOW: i64 = 1_710_072_000;

    #[test]
    fn test_each_entry_is_listed() {
        let events = vec![
            event(3, 2, 10, 6, NOW - HOUR),
            event(1, 1, 10, 2, NOW - 400 * HOUR),
            event(2, 1, 10, 4, NOW - 300 * HOUR),
            event(4, 1, 10, 5, NOW - 2 * HOUR),
        ];
        let report = build_stage_entry_report(&events, PROGRESSION_MIN_STAGE, "p/");
        let listed: Vec<(i64, i64)> = report.entries.iter().map(|e| (e.client_id, e.stage_code)).collect();
        assert_eq!(listed, vec![(1, 4), (1, 5), (2, 6)]);
        assert_eq!(report.client_count(), 2);
        assert_eq!(report.entries[0].entered_ts, NOW - 300 * HOUR);
        assert_eq!(report.entries[1].stage_name, "Property Tour and Feedback");
        assert_eq!(report.entries[2].profile_link, "p/2");
    }

    #[test]
    fn test_counts_follow_entry_days() {
        let mut events = vec![
            event(1, 1, 10, 4, NOW - 13 * HOUR), // 2024-03-09
            event(2, 1, 10, 5, NOW - HOUR),      // 2024-03-10
            event(3, 2, 11, 7, NOW - 2 * HOUR),  // 2024-03-10
            event(4, 2, 11, 3, NOW - 3 * HOUR),
        ];
        for e in &mut events {
            e.employee_name = if e.employee_id == 10 { "Amy".to_string() } else { "Bob".to_string() };
        }
        let report = build_stage_entry_report(&events, PROGRESSION_MIN_STAGE, "p/");

        let day_9 = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let day_10 = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(
            report.daily,
            vec![
                DailyCount { date: day_9, count: 1 },
                DailyCount { date: day_10, count: 2 },
            ]
        );
        let rows: Vec<(NaiveDate, &str, usize)> = report
            .by_employee_day
            .iter()
            .map(|r| (r.date, r.employee_name.as_str(), r.count))
            .collect();
        assert_eq!(rows, vec![(day_10, "Amy", 1), (day_10, "Bob", 1), (day_9, "Amy", 1)]);
    }

    #[test]
    fn test_no_entries() {
        let events = vec![event(1, 1, 10, 3, NOW)];
        let report = build_stage_entry_report(&events, PROGRESSION_MIN_STAGE, "p/");
        assert!(report.is_empty());
        assert_eq!(report.client_count(), 0);
        assert!(report.daily.is_empty());
    }
}
