//! JSON response types for the demo service.

use serde::Serialize;

use crate::users::DemoUser;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Server version.
    pub version: String,
}

/// The authenticated user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
}

impl From<DemoUser> for UserResponse {
    fn from(user: DemoUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The user the session was issued to.
    pub user: UserResponse,
    /// Greeting reported by the strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
