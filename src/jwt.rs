//! JWT helpers: HS256 issuing and validation over a shared secret.

use crate::error::AppError;
use async_trait::async_trait;
use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Claims carried alongside the registered set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub session_id: i64,
    pub appid: String,
    pub uid: i64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub photo_url: String,
}

/// Checks that a (uid, session id) pair still refers to a live session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn is_session_valid(&self, uid: i64, session_id: i64) -> Result<bool, AppError>;
}

pub struct TokenIssuer {
    key: HS256Key,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
        }
    }

    /// Sign a token for `user_id` expiring after `ttl_secs`.
    pub fn issue(
        &self,
        claims: UserClaims,
        user_id: &str,
        ttl_secs: u64,
    ) -> Result<String, AppError> {
        let jwt_claims =
            Claims::with_custom_claims(claims, Duration::from_secs(ttl_secs)).with_jwt_id(user_id);
        self.key
            .authenticate(jwt_claims)
            .map_err(|e| AppError::Internal(format!("sign token: {e}")))
    }
}

pub struct TokenValidator {
    key: HS256Key,
    sessions: Arc<dyn SessionStore>,
}

impl TokenValidator {
    pub fn new(secret: &str, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
            sessions,
        }
    }

    /// Verify signature and expiry, then check the session is still live.
    pub async fn validate(&self, token: &str) -> Result<JWTClaims<UserClaims>, AppError> {
        let options = VerificationOptions {
            time_tolerance: Some(Duration::from_secs(0)),
            ..Default::default()
        };
        let claims = self
            .key
            .verify_token::<UserClaims>(token, Some(options))
            .map_err(|e| AppError::Unauthorized(format!("invalid token: {e}")))?;

        if claims.custom.session_id == 0 {
            return Err(AppError::Unauthorized("token has no session".into()));
        }
        let valid = self
            .sessions
            .is_session_valid(claims.custom.uid, claims.custom.session_id)
            .await?;
        if !valid {
            return Err(AppError::Unauthorized("session is invalid".into()));
        }
        Ok(claims)
    }
}
