/// Authentication gate
///
/// Sits in front of every protected operation and resolves a request to an
/// authenticated user. Two terminal outcomes exist per request: an
/// [`Authenticated`] context, or rejection. The algorithm:
///
/// 1. Extract the bearer token from the authorization header value;
///    absence rejects.
/// 2. Verify the signature and decode the embedded user id; a malformed or
///    forged token rejects.
/// 3. Look the user up by id AND require the token to still be in the live
///    set — one store predicate, so a revoked-but-valid token misses the
///    same way an unknown user does.
///
/// All three failures surface as the same [`CoreError::Unauthenticated`];
/// the caller never learns which step rejected.

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::models::user::User;
use crate::store::UserStore;

use super::token;

/// Resolved authentication context for one request
///
/// Carries the live user record and the raw token that authenticated it,
/// so downstream operations can scope queries and revoke the presented
/// session.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

/// Validates inbound bearer tokens against users' live session sets
#[derive(Clone)]
pub struct AuthGate {
    users: Arc<dyn UserStore>,
    secret: String,
}

impl AuthGate {
    /// Creates a gate bound to a store and the signing key
    pub fn new(users: Arc<dyn UserStore>, secret: impl Into<String>) -> Self {
        Self {
            users,
            secret: secret.into(),
        }
    }

    /// Authenticates an `Authorization` header value
    ///
    /// Expects `Bearer <token>`. Every failure mode maps to the same
    /// undifferentiated [`CoreError::Unauthenticated`].
    pub async fn authenticate(&self, authorization: Option<&str>) -> CoreResult<Authenticated> {
        let bearer = authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(CoreError::Unauthenticated)?;

        let claims =
            token::decode_token(bearer, &self.secret).map_err(|_| CoreError::Unauthenticated)?;

        let user = self
            .users
            .find_user_by_session(claims.sub, bearer)
            .await?
            .ok_or(CoreError::Unauthenticated)?;

        Ok(Authenticated {
            user,
            token: bearer.to_string(),
        })
    }
}
