//! Report actions: one connection, one or more reads, one in-memory transform
//!
//! Each action opens its own connection through [`DbConnection::scoped`] so a
//! failure in one dashboard section never leaks into another.

use serde::Serialize;
use crate::config::DashConfig;
use crate::db::DbConnection;
use crate::error::Result;
use crate::models::{Client, StageTransition};
use crate::repo::{ClientRepo, EmployeeRepo, StageEventRepo};
use crate::report::{
    build_pivot, build_stage_entry_report, build_summary, build_windowed_report,
    classify_durations, DurationReport, PivotReport, RefreshTrigger, StageEntryReport,
    SummaryReport, Window, WindowFilter, WindowedReport, PROGRESSION_MIN_STAGE,
};

/// One client's ordered stage transitions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientHistory {
    pub client: Client,
    pub employee_name: Option<String>,
    pub events: Vec<StageTransition>,
}

pub fn pivot(config: &DashConfig) -> Result<PivotReport> {
    DbConnection::scoped(config, |conn| {
        let events = StageEventRepo::list_history(conn)?;
        Ok(build_pivot(&events, &config.profile_link_prefix))
    })
}

pub fn durations(config: &DashConfig, terminal_stage: i64) -> Result<DurationReport> {
    DbConnection::scoped(config, |conn| {
        let events = StageEventRepo::list_history(conn)?;
        Ok(classify_durations(&events, terminal_stage))
    })
}

/// Clients whose windowed maximum stage is 4 or beyond
pub fn progression(
    config: &DashConfig,
    trigger: &RefreshTrigger,
    window_hours: i64,
) -> Result<WindowedReport> {
    let window = Window::trailing(trigger.as_of, window_hours);
    DbConnection::scoped(config, |conn| {
        let events = StageEventRepo::list_between(conn, window.start_ts, window.end_ts)?;
        Ok(build_windowed_report(
            &events,
            WindowFilter::progression(window),
            &config.profile_link_prefix,
        ))
    })
}

/// Every stage 4+ event over the whole history, one row per event
pub fn stage_entries(config: &DashConfig) -> Result<StageEntryReport> {
    DbConnection::scoped(config, |conn| {
        let events = StageEventRepo::list_history(conn)?;
        Ok(build_stage_entry_report(
            &events,
            PROGRESSION_MIN_STAGE,
            &config.profile_link_prefix,
        ))
    })
}

pub fn low_progression(
    config: &DashConfig,
    trigger: &RefreshTrigger,
    window_hours: i64,
    employee_allowlist: Vec<i64>,
) -> Result<WindowedReport> {
    if employee_allowlist.is_empty() {
        log::warn!("No employee allow-list configured; the low-progression report will be empty");
    }
    let window = Window::trailing(trigger.as_of, window_hours);
    DbConnection::scoped(config, |conn| {
        let events = StageEventRepo::list_between(conn, window.start_ts, window.end_ts)?;
        Ok(build_windowed_report(
            &events,
            WindowFilter::low_progression(window, employee_allowlist),
            &config.profile_link_prefix,
        ))
    })
}

pub fn summary(config: &DashConfig) -> Result<SummaryReport> {
    DbConnection::scoped(config, |conn| {
        let events = StageEventRepo::list_history(conn)?;
        Ok(build_summary(&events))
    })
}

/// `None` when the client does not exist
pub fn client_history(config: &DashConfig, client_id: i64) -> Result<Option<ClientHistory>> {
    DbConnection::scoped(config, |conn| {
        let Some(client) = ClientRepo::get_by_id(conn, client_id)? else {
            return Ok(None);
        };
        let employee_name = match client.assigned_employee {
            Some(employee_id) => EmployeeRepo::get_by_id(conn, employee_id)?.map(|e| e.fullname),
            None => None,
        };
        let events = StageEventRepo::transitions_for_client(conn, client_id)?;
        Ok(Some(ClientHistory {
            client,
            employee_name,
            events,
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MigrationManager;
    use crate::error::ReportError;
    use rusqlite::Connection;
    use tempfile::TempDir;

    const NOW: i64 = 1_710_072_000;
    const HOUR: i64 = 3600;

    fn fixture() -> (TempDir, DashConfig) {
        let temp_dir = TempDir::new().unwrap();
        let config = DashConfig::with_defaults(temp_dir.path());
        let conn = Connection::open(&config.data_location).unwrap();
        MigrationManager::initialize(&conn).unwrap();
        conn.execute_batch(&format!(
            "INSERT INTO employee (id, fullname) VALUES (378, 'Rita Rep'), (999, 'Outsider');
             INSERT INTO client (id, fullname, assigned_employee) VALUES
                (1, 'Ada', 378), (2, 'Bo', 378), (3, 'Cy', 999), (4, 'Di', NULL);
             INSERT INTO client_stage_progression (client_id, current_stage, created_on) VALUES
                (1, 2, {a}), (1, 5, {b}),
                (2, 3, {b}),
                (3, 1, {b}),
                (4, 2, {b});",
            a = NOW - 5 * HOUR,
            b = NOW - HOUR,
        ))
        .unwrap();
        (temp_dir, config)
    }

    #[test]
    fn test_low_progression_action() {
        let (_temp_dir, config) = fixture();
        let trigger = RefreshTrigger::first(NOW);
        let report = low_progression(&config, &trigger, 24, vec![378]).unwrap();
        let ids: Vec<i64> = report.clients.iter().map(|c| c.client_id).collect();
        assert_eq!(ids, vec![2]);

        let again = low_progression(&config, &trigger, 24, vec![378]).unwrap();
        assert_eq!(report, again);
    }

    #[test]
    fn test_progression_action() {
        let (_temp_dir, config) = fixture();
        let trigger = RefreshTrigger::first(NOW);
        let report = progression(&config, &trigger, 24).unwrap();
        assert_eq!(report.clients.len(), 1);
        assert_eq!(report.clients[0].max_stage, 5);

        let later = RefreshTrigger::first(NOW + 48 * HOUR);
        assert!(progression(&config, &later, 24).unwrap().is_empty());
    }

    #[test]
    fn test_stage_entries_action() {
        let (_temp_dir, config) = fixture();
        let report = stage_entries(&config).unwrap();
        let listed: Vec<(i64, i64)> = report.entries.iter().map(|e| (e.client_id, e.stage_code)).collect();
        assert_eq!(listed, vec![(1, 5)]);
    }

    #[test]
    fn test_pivot_and_summary_actions() {
        let (_temp_dir, config) = fixture();
        let report = pivot(&config).unwrap();
        assert_eq!(report.max_depth, 2);
        assert_eq!(report.rows.len(), 3);

        let summary = summary(&config).unwrap();
        assert_eq!(summary.latest.len(), 3);
    }

    #[test]
    fn test_client_history_action() {
        let (_temp_dir, config) = fixture();
        let history = client_history(&config, 1).unwrap().unwrap();
        assert_eq!(history.employee_name.as_deref(), Some("Rita Rep"));
        assert_eq!(history.events.len(), 2);

        let unassigned = client_history(&config, 4).unwrap().unwrap();
        assert_eq!(unassigned.employee_name, None);
        let stages: Vec<i64> = unassigned.events.iter().map(|e| e.stage_code).collect();
        assert_eq!(stages, vec![2]);

        assert!(client_history(&config, 42).unwrap().is_none());
    }

    #[test]
    fn test_missing_database_is_connection_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = DashConfig::with_defaults(temp_dir.path());
        assert!(matches!(pivot(&config), Err(ReportError::Connection { .. })));
    }
}
