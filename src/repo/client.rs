use rusqlite::{Connection, OptionalExtension};
use crate::error::{ReportError, Result};
use crate::models::{Client, Employee};

/// Client reference lookups
pub struct ClientRepo;

impl ClientRepo {
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Client>> {
        conn.query_row(
            "SELECT id, fullname, assigned_employee FROM client WHERE id = ?1",
            [id],
            |row| {
                Ok(Client {
                    id: row.get(0)?,
                    fullname: row.get(1)?,
                    assigned_employee: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(ReportError::query("look up client"))
    }
}

/// Employee reference lookups
pub struct EmployeeRepo;

impl EmployeeRepo {
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Employee>> {
        conn.query_row(
            "SELECT id, fullname FROM employee WHERE id = ?1",
            [id],
            |row| {
                Ok(Employee {
                    id: row.get(0)?,
                    fullname: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(ReportError::query("look up employee"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_lookups() {
        let conn = DbConnection::connect_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO employee (id, fullname) VALUES (7, 'Rita Rep');
             INSERT INTO client (id, fullname, assigned_employee) VALUES (3, 'Ada', 7), (4, 'Bo', NULL);",
        )
        .unwrap();

        let client = ClientRepo::get_by_id(&conn, 3).unwrap().unwrap();
        assert_eq!(client.fullname, "Ada");
        assert_eq!(client.assigned_employee, Some(7));
        assert_eq!(ClientRepo::get_by_id(&conn, 4).unwrap().unwrap().assigned_employee, None);
        assert!(ClientRepo::get_by_id(&conn, 5).unwrap().is_none());

        let employee = EmployeeRepo::get_by_id(&conn, 7).unwrap().unwrap();
        assert_eq!(employee.fullname, "Rita Rep");
        assert!(EmployeeRepo::get_by_id(&conn, 8).unwrap().is_none());
    }
}
