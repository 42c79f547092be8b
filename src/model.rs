//! Domain entities.

use serde::{Deserialize, Serialize};

/// A registered application. `id` is globally unique; `is_removed` is the
/// soft-delete flag. Timestamps are unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub name: String,
    pub org_id: String,
    pub api_token: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_removed: bool,
}

/// Row shape of the `apps` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AppRow {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub api_token: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub is_removed: bool,
}

impl From<AppRow> for App {
    fn from(row: AppRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            org_id: row.org_id,
            api_token: row.api_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_removed: row.is_removed,
        }
    }
}
