//! App persistence against the `apps` table.

use crate::db::{Database, RequestScope};
use crate::error::AppError;
use crate::model::{App, AppRow};
use async_trait::async_trait;
use sqlx::FromRow;
use std::sync::Arc;

#[async_trait]
pub trait AppRepository: Clone + Send + Sync + 'static {
    async fn create_app(&self, scope: &RequestScope, app: &App) -> Result<(), AppError>;
    /// Absence is `Ok(None)`, distinct from query failure.
    async fn get_by_app_id(
        &self,
        scope: &RequestScope,
        app_id: &str,
    ) -> Result<Option<App>, AppError>;
}

#[derive(Clone)]
pub struct PgAppRepository {
    db: Arc<Database>,
}

impl PgAppRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

const INSERT_APP: &str = r#"
    INSERT INTO apps (
        id,
        org_id,
        name,
        api_token,
        created_at,
        updated_at,
        is_removed
    ) VALUES (
        :id,
        :org_id,
        :name,
        :api_token,
        :created_at,
        :updated_at,
        :is_removed
    )"#;

// LIMIT 1 defends against historical duplicate rows.
const SELECT_APP: &str = r#"
    SELECT
        a.id,
        a.org_id,
        a.name,
        a.is_removed,
        a.api_token,
        a.created_at,
        a.updated_at
    FROM apps a
    WHERE a.id = $1
    ORDER BY a.created_at DESC
    LIMIT 1"#;

#[async_trait]
impl AppRepository for PgAppRepository {
    async fn create_app(&self, scope: &RequestScope, app: &App) -> Result<(), AppError> {
        let mut conn = self.db.write(scope).await?;
        conn.execute_named(
            INSERT_APP,
            &[
                ("id", app.id.as_str().into()),
                ("org_id", app.org_id.as_str().into()),
                ("name", app.name.as_str().into()),
                ("api_token", app.api_token.as_str().into()),
                ("created_at", app.created_at.into()),
                ("updated_at", app.updated_at.into()),
                ("is_removed", app.is_removed.into()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_by_app_id(
        &self,
        scope: &RequestScope,
        app_id: &str,
    ) -> Result<Option<App>, AppError> {
        let mut conn = self.db.read(scope).await;
        let row = conn.fetch_optional(SELECT_APP, &[app_id.into()]).await?;
        row.map(|r| AppRow::from_row(&r).map(App::from))
            .transpose()
            .map_err(AppError::Db)
    }
}
