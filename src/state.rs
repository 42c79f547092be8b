//! Shared application state for all routes.

use crate::db::Database;
use crate::repository::PgAppRepository;
use crate::service::AppService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub apps: AppService<PgAppRepository>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        let apps = AppService::new(PgAppRepository::new(Arc::clone(&db)));
        Self { db, apps }
    }
}
