//! Transaction lifecycle middleware.
//!
//! Installs a [`RequestScope`] as a request extension, runs the handler, and
//! finalizes the scope from the outcome: commit on success statuses, rollback
//! on error statuses, and rollback-then-repanic on an unwound handler so the
//! fault stays visible to the process-level boundary.

use crate::db::{RequestScope, TxDecision, TxOutcome};
use crate::error::AppError;
use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub async fn transaction(mut req: Request, next: Next) -> Response {
    let scope = Arc::new(RequestScope::transactional());
    req.extensions_mut().insert(Arc::clone(&scope));

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => {
            let decision = if response.status().is_client_error()
                || response.status().is_server_error()
            {
                TxDecision::Rollback
            } else {
                TxDecision::Commit
            };
            match scope.finish(decision).await {
                Ok(TxOutcome::NoTransaction) => response,
                Ok(outcome) => {
                    tracing::debug!(?outcome, "transaction finished");
                    response
                }
                Err(e) => {
                    tracing::error!(error = %e, "transaction finalize failed");
                    AppError::Tx(e).into_response()
                }
            }
        }
        Err(panic) => {
            match scope.finish(TxDecision::Rollback).await {
                Ok(TxOutcome::RolledBack) => tracing::info!("transaction rolled back after panic"),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "rollback after panic failed"),
            }
            std::panic::resume_unwind(panic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::{middleware::from_fn, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn scoped_ok(Extension(scope): Extension<Arc<RequestScope>>) -> &'static str {
        // a handler that never writes leaves the scope untouched
        assert!(scope.tx().is_some());
        "ok"
    }

    async fn blows_up() -> &'static str {
        panic!("handler fault")
    }

    #[tokio::test]
    async fn scope_is_installed_for_handlers() {
        let app = Router::new()
            .route("/", get(scoped_ok))
            .layer(from_fn(transaction));
        let response = app
            .oneshot(Request::builder().uri("/").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    #[should_panic(expected = "handler fault")]
    async fn panics_are_reraised_after_rollback() {
        let app = Router::new()
            .route("/", get(blows_up))
            .layer(from_fn(transaction));
        let _ = app
            .oneshot(Request::builder().uri("/").body(axum::body::Body::empty()).unwrap())
            .await;
    }
}
