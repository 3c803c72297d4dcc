use rusqlite::{Connection, Row};
use crate::error::{ReportError, Result};
use crate::models::{StageEvent, StageTransition};

const EVENT_SELECT: &str =
    "SELECT csp.id, csp.client_id, c.fullname, e.id, e.fullname, csp.current_stage, csp.created_on
     FROM client_stage_progression csp
     JOIN client c ON csp.client_id = c.id
     JOIN employee e ON c.assigned_employee = e.id";

const EVENT_ORDER: &str = "ORDER BY csp.client_id, csp.created_on, csp.id";

/// Stage history reader over `client_stage_progression`
pub struct StageEventRepo;

impl StageEventRepo {
    /// Every stage event, ordered by client then chronologically
    pub fn list_history(conn: &Connection) -> Result<Vec<StageEvent>> {
        let sql = format!("{} {}", EVENT_SELECT, EVENT_ORDER);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(ReportError::query("prepare stage history query"))?;
        let rows = stmt
            .query_map([], row_to_event)
            .map_err(ReportError::query("list stage history"))?;
        let events = collect_rows(rows, "read stage history row")?;
        log::debug!("Loaded {} stage events", events.len());
        Ok(events)
    }

    /// One client's stage transitions in chronological order.
    /// Reads the progression table alone so unassigned clients keep their history.
    pub fn transitions_for_client(conn: &Connection, client_id: i64) -> Result<Vec<StageTransition>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, client_id, current_stage, created_on
                 FROM client_stage_progression
                 WHERE client_id = ?1
                 ORDER BY created_on, id",
            )
            .map_err(ReportError::query("prepare client history query"))?;
        let rows = stmt
            .query_map([client_id], |row| {
                Ok(StageTransition {
                    id: row.get(0)?,
                    client_id: row.get(1)?,
                    stage_code: row.get(2)?,
                    created_ts: row.get(3)?,
                })
            })
            .map_err(ReportError::query("list client stage history"))?;
        let mut transitions = Vec::new();
        for row in rows {
            transitions.push(row.map_err(ReportError::query("read client history row"))?);
        }
        log::debug!("Loaded {} stage events for client {}", transitions.len(), client_id);
        Ok(transitions)
    }

    /// Events created inside `[start_ts, end_ts]`
    pub fn list_between(conn: &Connection, start_ts: i64, end_ts: i64) -> Result<Vec<StageEvent>> {
        let sql = format!(
            "{} WHERE csp.created_on >= ?1 AND csp.created_on <= ?2 {}",
            EVENT_SELECT, EVENT_ORDER
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(ReportError::query("prepare windowed stage query"))?;
        let rows = stmt
            .query_map([start_ts, end_ts], row_to_event)
            .map_err(ReportError::query("list windowed stage events"))?;
        let events = collect_rows(rows, "read windowed stage row")?;
        log::debug!(
            "Loaded {} stage events between {} and {}",
            events.len(),
            start_ts,
            end_ts
        );
        Ok(events)
    }
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<StageEvent> {
    Ok(StageEvent {
        id: row.get(0)?,
        client_id: row.get(1)?,
        client_name: row.get(2)?,
        employee_id: row.get(3)?,
        employee_name: row.get(4)?,
        stage_code: row.get(5)?,
        created_ts: row.get(6)?,
    })
}

fn collect_rows<I>(rows: I, context: &'static str) -> Result<Vec<StageEvent>>
where
    I: Iterator<Item = rusqlite::Result<StageEvent>>,
{
    let mut events = Vec::new();
    for row in rows {
        events.push(row.map_err(ReportError::query(context))?);
    }
    Ok(events)
}
