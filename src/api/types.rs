//! Request and response types of the wrapped backend endpoints.

use serde::{Deserialize, Serialize};

use crate::session::UserProfile;

/// Login request.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    pub token: String,
    /// The signed-in user.
    pub user: UserProfile,
}
