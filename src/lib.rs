//! Starter kit: minimal REST service over PostgreSQL with read/write pool
//! routing and request-scoped transactions.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jwt;
pub mod logging;
pub mod middleware;
pub mod model;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use config::Config;
pub use db::{BindValue, Database, DbConn, ReadPreference, RequestScope, TxDecision, TxOutcome};
pub use error::{AppError, ConfigError, TxError};
pub use model::App;
pub use repository::{AppRepository, PgAppRepository};
pub use routes::router;
pub use service::AppService;
pub use state::AppState;
