use serde::{Deserialize, Serialize};

/// Client reference row (`client` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub fullname: String,
    pub assigned_employee: Option<i64>,
}

/// Employee reference row (`employee` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub fullname: String,
}
