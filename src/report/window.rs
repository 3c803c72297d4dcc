// Trailing-window progression reports

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use crate::models::{stage_label, StageEvent};
use crate::report::{group_by_client, profile_link};

/// Lowest stage counted as real progression
pub const PROGRESSION_MIN_STAGE: i64 = 4;
/// Highest stage still counted as low progression
pub const LOW_PROGRESSION_MAX_STAGE: i64 = 3;
/// Longest window whose length in seconds still fits an `i64`
pub const MAX_WINDOW_HOURS: i64 = i64::MAX / 3600;

/// Closed interval `[start_ts, end_ts]` of creation times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start_ts: i64,
    pub end_ts: i64,
}

impl Window {
    /// The `hours` leading up to and including `as_of`.
    /// The start clamps to `i64::MIN` rather than overflowing.
    pub fn trailing(as_of: i64, hours: i64) -> Self {
        Window {
            start_ts: as_of.saturating_sub(hours.saturating_mul(3600)),
            end_ts: as_of,
        }
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start_ts && ts <= self.end_ts
    }
}

/// Inclusive bounds on a client's windowed maximum stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StageRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl StageRange {
    pub fn at_least(min: i64) -> Self {
        StageRange { min: Some(min), max: None }
    }

    pub fn at_most(max: i64) -> Self {
        StageRange { min: None, max: Some(max) }
    }

    pub fn contains(&self, stage_code: i64) -> bool {
        self.min.map_or(true, |min| stage_code >= min)
            && self.max.map_or(true, |max| stage_code <= max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOrder {
    ByClient,
    ByEmployeeThenClient,
}

/// Which clients a windowed report keeps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowFilter {
    pub window: Window,
    /// Applied to the per-client maximum after aggregation
    pub stage_range: StageRange,
    /// `None` admits every employee
    pub employee_allowlist: Option<Vec<i64>>,
    pub order: ReportOrder,
}

impl WindowFilter {
    /// Clients that reached stage 4 or beyond
    pub fn progression(window: Window) -> Self {
        WindowFilter {
            window,
            stage_range: StageRange::at_least(PROGRESSION_MIN_STAGE),
            employee_allowlist: None,
            order: ReportOrder::ByClient,
        }
    }

    /// Clients of allow-listed employees that never got past stage 3
    pub fn low_progression(window: Window, employee_allowlist: Vec<i64>) -> Self {
        WindowFilter {
            window,
            stage_range: StageRange::at_most(LOW_PROGRESSION_MAX_STAGE),
            employee_allowlist: Some(employee_allowlist),
            order: ReportOrder::ByEmployeeThenClient,
        }
    }

    fn admits_event(&self, event: &StageEvent) -> bool {
        let in_window = self.window.contains(event.created_ts);
        let allowed = self
            .employee_allowlist
            .as_ref()
            .map_or(true, |ids| ids.contains(&event.employee_id));
        in_window && allowed
    }
}

/// Per-client aggregate over the window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientWindowAggregate {
    pub client_id: i64,
    pub client_name: String,
    pub employee_id: i64,
    pub employee_name: String,
    pub max_stage: i64,
    pub max_stage_name: String,
    pub latest_ts: i64,
    pub profile_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeDayCount {
    pub date: NaiveDate,
    pub employee_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowedReport {
    pub filter: WindowFilter,
    pub clients: Vec<ClientWindowAggregate>,
    pub daily: Vec<DailyCount>,
    pub by_employee_day: Vec<EmployeeDayCount>,
}

impl WindowedReport {
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Aggregate each client over the window, then keep clients whose
/// windowed maximum stage is inside the filter's range
pub fn aggregate_window(
    events: &[StageEvent],
    filter: &WindowFilter,
    link_prefix: &str,
) -> Vec<ClientWindowAggregate> {
    let admitted: Vec<StageEvent> = events
        .iter()
        .filter(|event| filter.admits_event(event))
        .cloned()
        .collect();

    let mut clients: Vec<ClientWindowAggregate> = group_by_client(&admitted)
        .into_iter()
        .filter_map(|(client_id, history)| {
            let latest = history.last()?;
            let max_stage = history.iter().map(|e| e.stage_code).max()?;
            if !filter.stage_range.contains(max_stage) {
                return None;
            }
            Some(ClientWindowAggregate {
                client_id,
                client_name: latest.client_name.clone(),
                employee_id: latest.employee_id,
                employee_name: latest.employee_name.clone(),
                max_stage,
                max_stage_name: stage_label(max_stage).to_string(),
                latest_ts: latest.created_ts,
                profile_link: profile_link(link_prefix, client_id),
            })
        })
        .collect();

    if filter.order == ReportOrder::ByEmployeeThenClient {
        clients.sort_by(|a, b| {
            a.employee_name
                .cmp(&b.employee_name)
                .then(a.client_id.cmp(&b.client_id))
        });
    }
    clients
}

/// UTC calendar day of a timestamp
pub fn utc_day(ts: i64) -> NaiveDate {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Clients per day of their latest windowed event, oldest day first
pub fn count_by_day(clients: &[ClientWindowAggregate]) -> Vec<DailyCount> {
    tally_by_day(clients.iter().map(|c| c.latest_ts))
}

/// Clients per (day, employee), newest day first, busiest employee first
pub fn count_by_employee_day(clients: &[ClientWindowAggregate]) -> Vec<EmployeeDayCount> {
    tally_by_employee_day(clients.iter().map(|c| (c.latest_ts, c.employee_name.as_str())))
}

pub(crate) fn tally_by_day(timestamps: impl IntoIterator<Item = i64>) -> Vec<DailyCount> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for ts in timestamps {
        *counts.entry(utc_day(ts)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

pub(crate) fn tally_by_employee_day<'a>(
    entries: impl IntoIterator<Item = (i64, &'a str)>,
) -> Vec<EmployeeDayCount> {
    let mut counts: BTreeMap<(NaiveDate, &str), usize> = BTreeMap::new();
    for (ts, employee_name) in entries {
        *counts.entry((utc_day(ts), employee_name)).or_insert(0) += 1;
    }
    let mut rows: Vec<EmployeeDayCount> = counts
        .into_iter()
        .map(|((date, employee_name), count)| EmployeeDayCount {
            date,
            employee_name: employee_name.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then(b.count.cmp(&a.count))
            .then(a.employee_name.cmp(&b.employee_name))
    });
    rows
}

pub fn build_windowed_report(
    events: &[StageEvent],
    filter: WindowFilter,
    link_prefix: &str,
) -> WindowedReport {
    let clients = aggregate_window(events, &filter, link_prefix);
    let daily = count_by_day(&clients);
    let by_employee_day = count_by_employee_day(&clients);
    WindowedReport {
        filter,
        clients,
        daily,
        by_employee_day,
    }
}
