//! Request-scoped transaction state.
//!
//! A [`RequestScope`] is created per request (by the transaction middleware,
//! or explicitly by background jobs) and passed into every repository call.
//! The transaction itself is opened lazily: nothing touches the database
//! until the first write accessor call, and a scope that only reads never
//! opens, commits, or rolls back anything.

use crate::error::TxError;
use sqlx::{Postgres, Transaction};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Lifecycle of the scope's transaction handle. Terminal states reject any
/// further begin/commit/rollback.
pub(crate) enum TxState {
    Absent,
    Open(Transaction<'static, Postgres>),
    Committed,
    RolledBack,
}

/// Holder for at most one open transaction. The mutex serializes lazy begin
/// if a single request ever issues concurrent writer calls.
pub(crate) struct TxScope {
    state: Mutex<TxState>,
}

impl TxScope {
    fn new() -> Self {
        Self {
            state: Mutex::new(TxState::Absent),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, TxState> {
        self.state.lock().await
    }

    async fn commit(&self) -> Result<TxOutcome, TxError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, TxState::Committed) {
            TxState::Absent => Ok(TxOutcome::NoTransaction),
            TxState::Open(tx) => {
                tx.commit().await.map_err(TxError::Commit)?;
                Ok(TxOutcome::Committed)
            }
            prev => {
                *state = prev;
                Err(TxError::Finished("commit"))
            }
        }
    }

    async fn rollback(&self) -> Result<TxOutcome, TxError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, TxState::RolledBack) {
            TxState::Absent => Ok(TxOutcome::NoTransaction),
            TxState::Open(tx) => {
                tx.rollback().await.map_err(TxError::Rollback)?;
                Ok(TxOutcome::RolledBack)
            }
            prev => {
                *state = prev;
                Err(TxError::Finished("rollback"))
            }
        }
    }
}

/// How reads are routed for the rest of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPreference {
    /// Default: the replica pool.
    Replica,
    /// The primary pool, for reads issued right after an out-of-band write
    /// where replica lag would be visible.
    Primary,
}

/// What finishing a scope actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    /// No transaction was ever opened; no database call was issued.
    NoTransaction,
    Committed,
    RolledBack,
}

/// Commit or roll back, decided by the request wrapper from the handler
/// outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxDecision {
    Commit,
    Rollback,
}

/// Per-request scope: an optional transaction holder plus the read-routing
/// preference. Autocommit scopes route writes straight to the primary pool.
pub struct RequestScope {
    tx: Option<TxScope>,
    read_primary: AtomicBool,
}

impl RequestScope {
    /// Scope whose writes share one lazily-opened transaction.
    pub fn transactional() -> Self {
        Self {
            tx: Some(TxScope::new()),
            read_primary: AtomicBool::new(false),
        }
    }

    /// Scope without a transaction: each statement commits on its own.
    pub fn autocommit() -> Self {
        Self {
            tx: None,
            read_primary: AtomicBool::new(false),
        }
    }

    pub(crate) fn tx(&self) -> Option<&TxScope> {
        self.tx.as_ref()
    }

    /// Route subsequent reads in this scope to the primary pool.
    pub fn prefer_primary_reads(&self) {
        self.read_primary.store(true, Ordering::Relaxed);
    }

    pub fn read_preference(&self) -> ReadPreference {
        if self.read_primary.load(Ordering::Relaxed) {
            ReadPreference::Primary
        } else {
            ReadPreference::Replica
        }
    }

    /// Finalize the scope: commit or roll back the transaction if one was
    /// opened. Exactly-once: a second finish returns `TxError::Finished`.
    /// A scope that never wrote finishes without touching the database (but
    /// still transitions to a terminal state so late writes are rejected).
    pub async fn finish(&self, decision: TxDecision) -> Result<TxOutcome, TxError> {
        match &self.tx {
            None => Ok(TxOutcome::NoTransaction),
            Some(tx) => match decision {
                TxDecision::Commit => tx.commit().await,
                TxDecision::Rollback => tx.rollback().await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn untouched_scope_finishes_without_db_calls() {
        let scope = RequestScope::transactional();
        let outcome = scope.finish(TxDecision::Commit).await.unwrap();
        assert_eq!(outcome, TxOutcome::NoTransaction);
    }

    #[tokio::test]
    async fn second_finish_is_rejected() {
        let scope = RequestScope::transactional();
        scope.finish(TxDecision::Commit).await.unwrap();
        let err = scope.finish(TxDecision::Rollback).await.unwrap_err();
        assert!(matches!(err, TxError::Finished("rollback")));
    }

    #[tokio::test]
    async fn autocommit_scope_has_nothing_to_finish() {
        let scope = RequestScope::autocommit();
        assert_eq!(
            scope.finish(TxDecision::Rollback).await.unwrap(),
            TxOutcome::NoTransaction
        );
        assert_eq!(
            scope.finish(TxDecision::Commit).await.unwrap(),
            TxOutcome::NoTransaction
        );
    }

    #[tokio::test]
    async fn read_preference_is_sticky() {
        let scope = RequestScope::transactional();
        assert_eq!(scope.read_preference(), ReadPreference::Replica);
        scope.prefer_primary_reads();
        assert_eq!(scope.read_preference(), ReadPreference::Primary);
    }
}
