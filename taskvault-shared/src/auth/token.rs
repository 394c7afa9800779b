/// Session token signing and the per-user session manager
///
/// A session token is an HS256-signed string binding the user's identifier.
/// Tokens carry no expiry: a session ends when its token is removed from
/// the user's live set, not when a clock runs out. The signing key is
/// supplied at construction time; there is no process-global secret.
///
/// Token-set mutations are read-modify-write against the latest persisted
/// record so a concurrently issued token from another device is not lost.
/// The write itself is last-writer-wins on the token list.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::store::UserStore;

/// Error type for token signing/verification
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign token
    #[error("Failed to sign token: {0}")]
    SignError(String),

    /// Token is malformed or its signature does not verify
    #[error("Invalid token")]
    Invalid,
}

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token id; makes two sessions opened in the same second distinct
    /// strings, so each can be revoked on its own
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            sub: user_id,
            iat: chrono::Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

/// Signs a session token for a user
pub fn sign_token(user_id: Uuid, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, &Claims::new(user_id), &key)
        .map_err(|e| TokenError::SignError(format!("Token encoding failed: {}", e)))
}

/// Verifies a token's signature and decodes its claims
///
/// Session tokens have no expiry claim; liveness is decided by the user's
/// token set, so expiry validation is disabled here.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|_| TokenError::Invalid)?;

    Ok(token_data.claims)
}

/// Issues and revokes session tokens for users
///
/// Multiple tokens may coexist per user (one per device); issuing a new
/// token never invalidates the others.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    secret: String,
}

impl SessionManager {
    /// Creates a session manager bound to a store and a signing key
    pub fn new(users: Arc<dyn UserStore>, secret: impl Into<String>) -> Self {
        Self {
            users,
            secret: secret.into(),
        }
    }

    /// Issues a new session token for `user_id` and persists it
    ///
    /// Reloads the latest record before appending so tokens issued
    /// concurrently from other devices survive.
    pub async fn issue(&self, user_id: Uuid) -> CoreResult<String> {
        let mut user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        let token = sign_token(user.id, &self.secret)
            .map_err(|e| CoreError::Store(crate::store::StoreError::Backend(e.to_string())))?;

        user.tokens.push(token.clone());
        user.touch();
        self.users.save_user(&user).await?;

        debug!(user_id = %user.id, sessions = user.tokens.len(), "session token issued");
        Ok(token)
    }

    /// Removes exactly the matching token; an absent token is a no-op
    pub async fn revoke(&self, user_id: Uuid, token: &str) -> CoreResult<()> {
        let mut user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        user.tokens.retain(|t| t != token);
        user.touch();
        self.users.save_user(&user).await?;

        Ok(())
    }

    /// Clears the entire token set in one persisted update
    ///
    /// Logout-all semantics: every outstanding session for the user is
    /// invalidated at once.
    pub async fn revoke_all(&self, user_id: Uuid) -> CoreResult<()> {
        let mut user = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        user.tokens.clear();
        user.touch();
        self.users.save_user(&user).await?;

        debug!(user_id = %user.id, "all sessions revoked");
        Ok(())
    }
}
