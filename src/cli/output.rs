// Text rendering for reports

use chrono::{DateTime, NaiveDate};
use std::io::IsTerminal;
use crate::models::{Client, StageTransition};
use crate::report::{
    DailyCount, DurationClass, DurationReport, EmployeeDayCount, PivotReport, RefreshTrigger,
    StageEntryReport, SummaryReport, WindowedReport,
};

const MIN_COLUMN_WIDTH: usize = 6;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Width limit for tables: the terminal width on a TTY, unlimited otherwise
pub fn table_width_limit() -> Option<usize> {
    if is_tty() {
        Some(get_terminal_width())
    } else {
        None
    }
}

/// Format timestamp for display (UTC)
pub fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_hours(hours: f64) -> String {
    format!("{:.2}h", hours)
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let truncated: String = value.chars().take(width.saturating_sub(2)).collect();
    format!("{}..", truncated)
}

/// Render a plain table with an underlined header
///
/// With `max_width`, the widest columns are narrowed (never below
/// `MIN_COLUMN_WIDTH`) until the table fits.
pub fn format_table(headers: &[String], rows: &[Vec<String>], max_width: Option<usize>) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, value) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(value.chars().count());
        }
    }

    if let Some(limit) = max_width {
        while total_width(&widths) > limit {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= MIN_COLUMN_WIDTH {
                break;
            }
            let excess = total_width(&widths) - limit;
            widths[idx] = widest.saturating_sub(excess).max(MIN_COLUMN_WIDTH);
        }
    }

    let mut output = String::new();
    output.push_str(&render_line(headers, &widths));
    output.push('\n');
    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join(" "));
    output.push('\n');
    for row in rows {
        output.push_str(&render_line(row, &widths));
        output.push('\n');
    }
    output
}

fn total_width(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + widths.len().saturating_sub(1)
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", truncate(cell, *width), width = *width))
        .collect();
    parts.join(" ").trim_end().to_string()
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn window_phrase(report: &WindowedReport) -> String {
    let window = report.filter.window;
    format!("in the last {} hours", (window.end_ts - window.start_ts) / 3600)
}

pub fn format_refresh_header(trigger: &RefreshTrigger) -> String {
    format!(
        "Refresh #{} - Till: {} UTC\n",
        trigger.sequence,
        format_timestamp(trigger.as_of)
    )
}

pub fn format_pivot_report(report: &PivotReport, max_width: Option<usize>) -> String {
    if report.is_empty() {
        return "No stage history found.\n".to_string();
    }

    let rows: Vec<Vec<String>> = report
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.client_id.to_string(),
                row.profile_link.clone(),
                row.client_name.clone(),
                row.employee_name.clone(),
            ];
            for cell in &row.stages {
                match cell {
                    Some(cell) => {
                        cells.push(cell.stage_name.clone());
                        cells.push(format_timestamp(cell.entered_ts));
                    }
                    None => {
                        cells.push(String::new());
                        cells.push(String::new());
                    }
                }
            }
            cells
        })
        .collect();

    let mut output = format_table(&report.column_names(), &rows, max_width);
    output.push_str(&format!(
        "\n{} client{}, up to {} stage{} each\n",
        report.rows.len(),
        if report.rows.len() == 1 { "" } else { "s" },
        report.max_depth,
        if report.max_depth == 1 { "" } else { "s" },
    ));
    output
}

pub fn format_duration_report(report: &DurationReport, max_width: Option<usize>) -> String {
    let mut output = String::new();
    let Some(threshold) = report.threshold_hours else {
        output.push_str(&format!(
            "No clients currently at stage {} ({}); average duration is undefined.\n",
            report.terminal_stage, report.terminal_stage_name
        ));
        return output;
    };

    output.push_str(&format!(
        "Average time to {}: {} across {} client{}\n\n",
        report.terminal_stage_name,
        format_hours(threshold),
        report.clients.len(),
        if report.clients.len() == 1 { "" } else { "s" },
    ));

    let rows: Vec<Vec<String>> = report
        .clients
        .iter()
        .map(|c| {
            vec![
                c.client_id.to_string(),
                c.client_name.clone(),
                c.employee_name.clone(),
                format_timestamp(c.first_ts),
                format_timestamp(c.last_ts),
                format_hours(c.elapsed_hours),
                c.class.to_string(),
            ]
        })
        .collect();
    output.push_str(&format_table(
        &headers(&["Client ID", "Client", "Sales Rep", "First Stage", "Last Stage", "Hours", "Class"]),
        &rows,
        max_width,
    ));
    output.push_str(&format!(
        "\n{} NORMAL, {} NOT NORMAL\n",
        report.count(DurationClass::Normal),
        report.count(DurationClass::NotNormal)
    ));
    output
}

/// Per-day and per-rep-per-day tables; `unit` names what is counted
fn format_day_counts(
    daily: &[DailyCount],
    by_employee_day: &[EmployeeDayCount],
    unit: &str,
    max_width: Option<usize>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n--- {} per day ---\n", unit));
    let daily: Vec<Vec<String>> = daily
        .iter()
        .map(|d| vec![format_date(d.date), d.count.to_string()])
        .collect();
    output.push_str(&format_table(&headers(&["Date", unit]), &daily, max_width));

    output.push_str(&format!("\n--- {} per sales rep per day ---\n", unit));
    let by_employee: Vec<Vec<String>> = by_employee_day
        .iter()
        .map(|r| vec![format_date(r.date), r.employee_name.clone(), r.count.to_string()])
        .collect();
    output.push_str(&format_table(
        &headers(&["Date", "Sales Rep", unit]),
        &by_employee,
        max_width,
    ));
    output
}

pub fn format_progression_report(report: &WindowedReport, max_width: Option<usize>) -> String {
    if report.is_empty() {
        return format!("No clients reached stage 4 or beyond {}.\n", window_phrase(report));
    }

    let rows: Vec<Vec<String>> = report
        .clients
        .iter()
        .map(|c| {
            vec![
                c.client_id.to_string(),
                c.client_name.clone(),
                c.employee_name.clone(),
                c.max_stage.to_string(),
                c.max_stage_name.clone(),
                format_timestamp(c.latest_ts),
            ]
        })
        .collect();

    let mut output = format_table(
        &headers(&["Client ID", "Client", "Sales Rep", "Stage", "Stage Name", "Last Update"]),
        &rows,
        max_width,
    );
    output.push_str(&format!(
        "\nTotal clients in stage 4 and beyond {}: {}\n",
        window_phrase(report),
        report.clients.len()
    ));
    output.push_str(&format_day_counts(
        &report.daily,
        &report.by_employee_day,
        "Clients",
        max_width,
    ));
    output
}

pub fn format_stage_entry_report(report: &StageEntryReport, max_width: Option<usize>) -> String {
    if report.is_empty() {
        return format!("No client ever reached stage {} or beyond.\n", report.min_stage);
    }

    let rows: Vec<Vec<String>> = report
        .entries
        .iter()
        .map(|e| {
            vec![
                e.client_id.to_string(),
                e.client_name.clone(),
                e.employee_name.clone(),
                e.stage_code.to_string(),
                e.stage_name.clone(),
                format_timestamp(e.entered_ts),
            ]
        })
        .collect();

    let mut output = format_table(
        &headers(&["Client ID", "Client", "Sales Rep", "Stage", "Stage Name", "Entered"]),
        &rows,
        max_width,
    );
    output.push_str(&format!(
        "\nTotal entries into stage {} and beyond: {} ({} client{})\n",
        report.min_stage,
        report.entries.len(),
        report.client_count(),
        if report.client_count() == 1 { "" } else { "s" },
    ));
    output.push_str(&format_day_counts(
        &report.daily,
        &report.by_employee_day,
        "Entries",
        max_width,
    ));
    output
}

pub fn format_low_progression_report(report: &WindowedReport) -> String {
    if report.is_empty() {
        return format!("No clients found with low progression {}.\n", window_phrase(report));
    }

    let mut output = String::new();
    for client in &report.clients {
        output.push_str(&format!("Sales Rep: {}\n", client.employee_name));
        output.push_str(&format!("Client: {} - {}\n", client.client_name, client.profile_link));
        output.push_str(&format!(
            "Current Stage: {} ({})\n",
            client.max_stage, client.max_stage_name
        ));
        output.push_str(&format!("Last Update: {}\n", format_timestamp(client.latest_ts)));
        output.push_str("---\n");
    }
    output.push_str(&format!(
        "{} client{} with low progression {}\n",
        report.clients.len(),
        if report.clients.len() == 1 { "" } else { "s" },
        window_phrase(report)
    ));
    output
}

pub fn format_summary_report(report: &SummaryReport, max_width: Option<usize>) -> String {
    if report.is_empty() {
        return "No stage history found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str("--- Clients by latest stage ---\n");
    let by_stage: Vec<Vec<String>> = report
        .by_stage
        .iter()
        .map(|c| vec![c.stage_name.clone(), c.count.to_string()])
        .collect();
    output.push_str(&format_table(&headers(&["Stage", "Clients"]), &by_stage, max_width));

    output.push_str("\n--- Clients by sales rep and latest stage ---\n");
    let by_employee: Vec<Vec<String>> = report
        .by_employee_stage
        .iter()
        .map(|c| vec![c.employee_name.clone(), c.stage_name.clone(), c.count.to_string()])
        .collect();
    output.push_str(&format_table(
        &headers(&["Sales Rep", "Stage", "Clients"]),
        &by_employee,
        max_width,
    ));
    output.push_str(&format!("\nTotal clients: {}\n", report.latest.len()));
    output
}

pub fn format_client_history(
    client: &Client,
    employee_name: Option<&str>,
    events: &[StageTransition],
    max_width: Option<usize>,
) -> String {
    let mut output = format!(
        "Client {}: {} (sales rep: {})\n\n",
        client.id,
        client.fullname,
        employee_name.unwrap_or("unassigned")
    );
    if events.is_empty() {
        output.push_str("No stage history found.\n");
        return output;
    }

    let rows: Vec<Vec<String>> = events
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            vec![
                (idx + 1).to_string(),
                e.stage_code.to_string(),
                e.stage_name().to_string(),
                format_timestamp(e.created_ts),
            ]
        })
        .collect();
    output.push_str(&format_table(
        &headers(&["#", "Stage", "Stage Name", "Entered"]),
        &rows,
        max_width,
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageEvent;
    use crate::report::{
        build_pivot, build_stage_entry_report, build_windowed_report, classify_durations, Window,
        WindowFilter,
    };

    fn event(id: i64, client_id: i64, stage_code: i64, created_ts: i64) -> StageEvent {
        StageEvent {
            id,
            client_id,
            client_name: format!("Client {}", client_id),
            employee_id: 1,
            employee_name: "Rita Rep".to_string(),
            stage_code,
            created_ts,
        }
    }

    #[test]
    fn test_format_timestamp_is_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1_710_072_000), "2024-03-10 12:00:00");
    }

    #[test]
    fn test_format_table_layout() {
        let table = format_table(
            &headers(&["ID", "Name"]),
            &[vec!["1".to_string(), "Ada".to_string()]],
            None,
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "ID Name");
        assert_eq!(lines[1], "── ────");
        assert_eq!(lines[2], "1  Ada");
    }

    #[test]
    fn test_format_table_shrinks_to_width() {
        let long = "x".repeat(60);
        let table = format_table(
            &headers(&["ID", "Description"]),
            &[vec!["1".to_string(), long]],
            Some(30),
        );
        for line in table.lines() {
            assert!(line.chars().count() <= 30, "too wide: {}", line);
        }
        assert!(table.contains(".."));
    }

    #[test]
    fn test_empty_reports_render_no_data() {
        let pivot = build_pivot(&[], "p/");
        assert_eq!(format_pivot_report(&pivot, None), "No stage history found.\n");

        let durations = classify_durations(&[], 8);
        assert!(format_duration_report(&durations, None).contains("average duration is undefined"));

        let window = Window::trailing(100_000, 24);
        let low = build_windowed_report(&[], WindowFilter::low_progression(window, vec![1]), "p/");
        assert_eq!(
            format_low_progression_report(&low),
            "No clients found with low progression in the last 24 hours.\n"
        );
        let entries = build_stage_entry_report(&[], 4, "p/");
        assert_eq!(
            format_stage_entry_report(&entries, None),
            "No client ever reached stage 4 or beyond.\n"
        );
    }

    #[test]
    fn test_pivot_renders_stage_columns() {
        let events = vec![event(1, 1, 2, 0), event(2, 1, 4, 3600), event(3, 2, 2, 0)];
        let output = format_pivot_report(&build_pivot(&events, "p/"), None);
        assert!(output.contains("stage_2"));
        assert!(output.contains("time_entered_stage_2"));
        assert!(output.contains("Property Touring"));
        assert!(output.contains("2 clients, up to 2 stages each"));
    }

    #[test]
    fn test_low_progression_blocks() {
        let window = Window::trailing(100_000, 24);
        let events = vec![event(1, 7, 2, 99_000)];
        let report = build_windowed_report(&events, WindowFilter::low_progression(window, vec![1]), "https://crm/");
        let output = format_low_progression_report(&report);
        assert!(output.contains("Sales Rep: Rita Rep"));
        assert!(output.contains("Client: Client 7 - https://crm/7"));
        assert!(output.contains("Current Stage: 2 (Initial Contact)"));
        assert!(output.ends_with("1 client with low progression in the last 24 hours\n"));
    }

    #[test]
    fn test_stage_entry_report_lists_each_entry() {
        let events = vec![event(1, 7, 4, 3_600), event(2, 7, 5, 90_000), event(3, 8, 2, 0)];
        let output = format_stage_entry_report(&build_stage_entry_report(&events, 4, "p/"), None);
        assert!(output.contains("Property Touring"));
        assert!(output.contains("Property Tour and Feedback"));
        assert!(output.contains("Total entries into stage 4 and beyond: 2 (1 client)"));
        assert!(output.contains("--- Entries per sales rep per day ---"));
        assert!(output.contains("1970-01-02"));
    }
}
