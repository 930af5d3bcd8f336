//! JWT claim structure shared with the identity service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cinesync_core::types::id::UserId;

/// Claims carried by an identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user's UUID.
    pub sub: Uuid,
    /// Display name shown to other room members.
    pub name: String,
    /// Expiration (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
}

impl Claims {
    /// The authenticated user id.
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }
}
