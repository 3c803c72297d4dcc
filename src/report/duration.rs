// Duration classification for clients that reached the terminal stage

use serde::Serialize;
use std::fmt;
use crate::models::{stage_label, StageEvent};
use crate::report::group_by_client;

const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationClass {
    Normal,
    NotNormal,
    /// No threshold could be computed
    Indeterminate,
}

impl DurationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationClass::Normal => "NORMAL",
            DurationClass::NotNormal => "NOT NORMAL",
            DurationClass::Indeterminate => "INDETERMINATE",
        }
    }
}

impl fmt::Display for DurationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First and last transition of a terminal client, with its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDuration {
    pub client_id: i64,
    pub client_name: String,
    pub employee_name: String,
    pub first_ts: i64,
    pub last_ts: i64,
    pub elapsed_hours: f64,
    pub class: DurationClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationReport {
    pub terminal_stage: i64,
    pub terminal_stage_name: String,
    /// Mean elapsed hours over `clients`; `None` when no client qualifies
    pub threshold_hours: Option<f64>,
    pub clients: Vec<ClientDuration>,
}

impl DurationReport {
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn count(&self, class: DurationClass) -> usize {
        self.clients.iter().filter(|c| c.class == class).count()
    }
}

pub fn elapsed_hours(first_ts: i64, last_ts: i64) -> f64 {
    (last_ts - first_ts) as f64 / SECONDS_PER_HOUR
}

/// Unweighted arithmetic mean, `None` for an empty slice
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Compare against the threshold; a missing or NaN threshold never compares
pub fn classify(elapsed_hours: f64, threshold_hours: Option<f64>) -> DurationClass {
    match threshold_hours {
        Some(threshold) if !threshold.is_nan() && !elapsed_hours.is_nan() => {
            if elapsed_hours <= threshold {
                DurationClass::Normal
            } else {
                DurationClass::NotNormal
            }
        }
        _ => DurationClass::Indeterminate,
    }
}

/// Classify every client whose latest event is at `terminal_stage`
///
/// Clients currently at any other stage are left out entirely. Output is
/// ordered by client id.
pub fn classify_durations(events: &[StageEvent], terminal_stage: i64) -> DurationReport {
    let mut clients: Vec<ClientDuration> = group_by_client(events)
        .into_iter()
        .filter_map(|(client_id, history)| {
            let first = history.first()?;
            let last = history.last()?;
            if last.stage_code != terminal_stage {
                return None;
            }
            Some(ClientDuration {
                client_id,
                client_name: first.client_name.clone(),
                employee_name: first.employee_name.clone(),
                first_ts: first.created_ts,
                last_ts: last.created_ts,
                elapsed_hours: elapsed_hours(first.created_ts, last.created_ts),
                class: DurationClass::Indeterminate,
            })
        })
        .collect();

    let elapsed: Vec<f64> = clients.iter().map(|c| c.elapsed_hours).collect();
    let threshold_hours = average(&elapsed);

    for client in &mut clients {
        client.class = classify(client.elapsed_hours, threshold_hours);
    }

    DurationReport {
        terminal_stage,
        terminal_stage_name: stage_label(terminal_stage).to_string(),
        threshold_hours,
        clients,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::{event, HOUR};

    #[test]
    fn test_threshold_splits_normal_and_not_normal() {
        // A: 2h to commission, B: 10h to commission
        let events = vec![
            event(1, 1, 1, 2, 0),
            event(2, 1, 1, 8, 2 * HOUR),
            event(3, 2, 1, 3, 0),
            event(4, 2, 1, 6, 4 * HOUR),
            event(5, 2, 1, 8, 10 * HOUR),
        ];
        let report = classify_durations(&events, 8);

        assert_eq!(report.threshold_hours, Some(6.0));
        assert_eq!(report.clients.len(), 2);
        assert_eq!(report.clients[0].client_id, 1);
        assert_eq!(report.clients[0].elapsed_hours, 2.0);
        assert_eq!(report.clients[0].class, DurationClass::Normal);
        assert_eq!(report.clients[1].class, DurationClass::NotNormal);
        assert_eq!(report.terminal_stage_name, "Commission Collection");
    }

    #[test]
    fn test_non_terminal_latest_stage_excluded() {
        let events = vec![
            event(1, 1, 1, 2, 0),
            event(2, 1, 1, 8, 4 * HOUR),
            // Reached 8 but moved on to 9 afterwards
            event(3, 2, 1, 8, 0),
            event(4, 2, 1, 9, 100 * HOUR),
            event(5, 3, 1, 4, 0),
        ];
        let report = classify_durations(&events, 8);

        let ids: Vec<i64> = report.clients.iter().map(|c| c.client_id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(report.threshold_hours, Some(4.0));
        assert_eq!(report.count(DurationClass::Normal), 1);
        assert_eq!(report.count(DurationClass::NotNormal), 0);
    }

    #[test]
    fn test_no_qualifying_clients_has_no_threshold() {
        let events = vec![event(1, 1, 1, 2, 0), event(2, 1, 1, 3, HOUR)];
        let report = classify_durations(&events, 8);
        assert!(report.is_empty());
        assert_eq!(report.threshold_hours, None);

        let empty = classify_durations(&[], 8);
        assert!(empty.is_empty());
        assert_eq!(empty.threshold_hours, None);
    }

    #[test]
    fn test_single_event_client_has_zero_elapsed() {
        let events = vec![event(1, 1, 1, 8, 5 * HOUR)];
        let report = classify_durations(&events, 8);
        assert_eq!(report.clients[0].elapsed_hours, 0.0);
        assert_eq!(report.threshold_hours, Some(0.0));
        assert_eq!(report.clients[0].class, DurationClass::Normal);
    }

    #[test]
    fn test_latest_tie_uses_highest_event_id() {
        // Same timestamp for stage 8 and stage 9; id 3 is the later insert
        let events = vec![
            event(1, 1, 1, 2, 0),
            event(3, 1, 1, 9, HOUR),
            event(2, 1, 1, 8, HOUR),
        ];
        assert!(classify_durations(&events, 8).is_empty());
        assert_eq!(classify_durations(&events, 9).clients.len(), 1);
    }

    #[test]
    fn test_configurable_terminal_stage() {
        let events = vec![event(1, 1, 1, 2, 0), event(2, 1, 1, 7, 90 * 60)];
        let report = classify_durations(&events, 7);
        assert_eq!(report.clients[0].elapsed_hours, 1.5);
        assert_eq!(report.terminal_stage_name, "Post-Approval and Follow-Up");
    }

    #[test]
    fn test_classify_without_threshold_is_indeterminate() {
        assert_eq!(classify(0.0, None), DurationClass::Indeterminate);
        assert_eq!(classify(3.0, Some(f64::NAN)), DurationClass::Indeterminate);
        assert_eq!(classify(3.0, Some(3.0)), DurationClass::Normal);
        assert_eq!(classify(3.5, Some(3.0)), DurationClass::NotNormal);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[2.0, 10.0]), Some(6.0));
    }

    #[test]
    fn test_class_labels() {
        assert_eq!(DurationClass::Normal.to_string(), "NORMAL");
        assert_eq!(DurationClass::NotNormal.to_string(), "NOT NORMAL");
        assert_eq!(
            serde_json::to_string(&DurationClass::NotNormal).unwrap(),
            "\"NOT_NORMAL\""
        );
    }
}
