//! Domain rules on top of the repository.

use crate::db::RequestScope;
use crate::error::AppError;
use crate::model::App;
use crate::repository::AppRepository;

#[derive(Clone)]
pub struct AppService<R> {
    repo: R,
}

impl<R: AppRepository> AppService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn get_app_by_id(
        &self,
        scope: &RequestScope,
        app_id: &str,
    ) -> Result<App, AppError> {
        self.repo
            .get_by_app_id(scope, app_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("app {app_id}")))
    }

    /// Create an app, rejecting duplicate ids. Check-then-insert: the unique
    /// constraint on `apps.id` is the backstop when two creates race; the
    /// loser surfaces a database error instead of a conflict.
    pub async fn create_app(&self, scope: &RequestScope, app: &App) -> Result<(), AppError> {
        if self.repo.get_by_app_id(scope, &app.id).await?.is_some() {
            return Err(AppError::Conflict(format!("app {} already exists", app.id)));
        }
        self.repo.create_app(scope, app).await
    }
}
