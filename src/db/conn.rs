//! Narrow query capability over a pool or the scope's open transaction.

use crate::db::params::{bind_named, BindValue};
use crate::db::scope::TxState;
use crate::error::{AppError, TxError};
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use tokio::sync::MutexGuard;

/// A connection handle for one logical operation: execute, query-one,
/// query-many, and named-parameter execution. Dispatches to a pool or to the
/// request's open transaction.
///
/// A transaction-backed handle holds the scope's lock; drop it before asking
/// the same scope for another handle.
pub struct DbConn<'a> {
    inner: Inner<'a>,
}

enum Inner<'a> {
    Pool(&'a PgPool),
    Tx(MutexGuard<'a, TxState>),
}

impl<'a> DbConn<'a> {
    pub(crate) fn pool(pool: &'a PgPool) -> Self {
        Self {
            inner: Inner::Pool(pool),
        }
    }

    pub(crate) fn tx(guard: MutexGuard<'a, TxState>) -> Self {
        Self {
            inner: Inner::Tx(guard),
        }
    }

    /// Run a statement; returns the number of affected rows.
    pub async fn execute(&mut self, sql: &str, params: &[BindValue]) -> Result<u64, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(p.clone());
        }
        let result = match &mut self.inner {
            Inner::Pool(pool) => query.execute(*pool).await?,
            Inner::Tx(guard) => query.execute(open_tx(guard)?).await?,
        };
        Ok(result.rows_affected())
    }

    /// Run a statement written with `:name` placeholders.
    pub async fn execute_named(
        &mut self,
        sql: &str,
        params: &[(&str, BindValue)],
    ) -> Result<u64, AppError> {
        let (sql, values) = bind_named(sql, params)?;
        self.execute(&sql, &values).await
    }

    /// Fetch at most one row.
    pub async fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<Option<PgRow>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query one");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(p.clone());
        }
        let row = match &mut self.inner {
            Inner::Pool(pool) => query.fetch_optional(*pool).await?,
            Inner::Tx(guard) => query.fetch_optional(open_tx(guard)?).await?,
        };
        Ok(row)
    }

    /// Fetch all matching rows.
    pub async fn fetch_all(
        &mut self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<Vec<PgRow>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query many");
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(p.clone());
        }
        let rows = match &mut self.inner {
            Inner::Pool(pool) => query.fetch_all(*pool).await?,
            Inner::Tx(guard) => query.fetch_all(open_tx(guard)?).await?,
        };
        Ok(rows)
    }
}

fn open_tx<'g>(
    guard: &'g mut MutexGuard<'_, TxState>,
) -> Result<&'g mut sqlx::PgConnection, TxError> {
    match &mut **guard {
        TxState::Open(tx) => Ok(&mut **tx),
        _ => Err(TxError::Finished("query")),
    }
}
