//! Connection authentication — validates the identity token presented at
//! connection establishment, before any event processing.

use std::sync::Arc;

use cinesync_auth::TokenVerifier;
use cinesync_core::error::AppError;
use cinesync_core::types::id::UserId;

/// Authenticated identity extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User ID.
    pub user_id: UserId,
    /// Display name.
    pub username: String,
}

/// Authenticates WebSocket connections using identity tokens.
#[derive(Clone)]
pub struct WsAuthenticator {
    verifier: Arc<TokenVerifier>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new authenticator.
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Authenticates a connection from a token (typically a query
    /// parameter on the upgrade request). A failure here refuses the
    /// transport; no room operation is reachable without it.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = self.verifier.verify(token)?;

        Ok(AuthenticatedUser {
            user_id: claims.user_id(),
            username: claims.name,
        })
    }
}
