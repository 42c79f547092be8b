//! PostgreSQL pool pair and connection routing.
//!
//! The manager owns the only references to the two pools. Callers get a
//! [`DbConn`] through [`Database::read`] / [`Database::write`] so that every
//! statement participates in the request's transaction when one is in scope.

use crate::config::{PoolConfig, PostgresConfig, ReadInstance};
use crate::db::conn::DbConn;
use crate::db::scope::{RequestScope, TxState};
use crate::db::ReadPreference;
use crate::error::{AppError, TxError};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

pub struct Database {
    write: PgPool,
    read: PgPool,
}

impl Database {
    /// Create both pools and verify connectivity. The replica pool follows
    /// `fixed_read_instance`: `master` pins reads to the primary parameters,
    /// `replica` (or default routing) uses the replica parameters.
    pub async fn connect(cfg: &PostgresConfig) -> Result<Self, AppError> {
        let read_cfg = match cfg.fixed_read_instance {
            ReadInstance::Master => &cfg.master,
            ReadInstance::Replica | ReadInstance::Default => &cfg.replica,
        };

        let write = connect_pool(&cfg.master).await.map_err(|e| {
            AppError::Unavailable {
                pool: "write",
                source: e,
            }
        })?;
        let read = connect_pool(read_cfg).await.map_err(|e| AppError::Unavailable {
            pool: "read",
            source: e,
        })?;

        Ok(Self { write, read })
    }

    /// Read handle for this scope. An open transaction wins (reads must see
    /// the request's uncommitted writes); otherwise the scope's read
    /// preference picks the primary or the replica pool.
    pub async fn read<'a>(&'a self, scope: &'a RequestScope) -> DbConn<'a> {
        if let Some(tx) = scope.tx() {
            let guard = tx.lock().await;
            if matches!(&*guard, TxState::Open(_)) {
                return DbConn::tx(guard);
            }
        }
        match scope.read_preference() {
            ReadPreference::Primary => DbConn::pool(&self.write),
            ReadPreference::Replica => DbConn::pool(&self.read),
        }
    }

    /// Write handle for this scope. For a transactional scope the first call
    /// begins a transaction on the write pool (serialized by the scope's
    /// lock) and every later call reuses it; after the scope is finished this
    /// is an error. Autocommit scopes write straight to the pool.
    pub async fn write<'a>(&'a self, scope: &'a RequestScope) -> Result<DbConn<'a>, AppError> {
        let Some(tx) = scope.tx() else {
            return Ok(DbConn::pool(&self.write));
        };
        let mut guard = tx.lock().await;
        match &*guard {
            TxState::Absent => {
                let t = self.write.begin().await.map_err(TxError::Begin)?;
                *guard = TxState::Open(t);
            }
            TxState::Open(_) => {}
            TxState::Committed | TxState::RolledBack => {
                return Err(TxError::Finished("begin").into());
            }
        }
        Ok(DbConn::tx(guard))
    }

    /// Health probe: checks both pools independently and names the one that
    /// failed.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.write)
            .await
            .map_err(|e| AppError::Unavailable {
                pool: "write",
                source: e,
            })?;
        sqlx::query("SELECT 1")
            .execute(&self.read)
            .await
            .map_err(|e| AppError::Unavailable {
                pool: "read",
                source: e,
            })?;
        Ok(())
    }

    /// Close both pools. Best-effort; only called while terminating.
    pub async fn close(&self) {
        self.write.close().await;
        self.read.close().await;
    }

    /// Raw primary pool, for schema setup and tests. Request paths must go
    /// through [`Database::read`] / [`Database::write`].
    pub fn write_pool(&self) -> &PgPool {
        &self.write
    }
}

async fn connect_pool(cfg: &PoolConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.database);
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .connect_with(options)
        .await?;
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(pool)
}
