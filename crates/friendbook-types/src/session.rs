use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by the signed session cookie.
///
/// `sid` names a row in the sessions table. A token whose row is gone
/// (logout) or expired is rejected even when its signature still verifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub sid: Uuid,
    pub exp: usize,
}

/// The authenticated identity attached to a request by the session guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub username: String,
    pub session_id: Uuid,
}
