//! HTTP Basic password strategy.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use passgate_core::{Action, AuthContext, AuthenticateOptions, AuthInfo, Strategy};
use serde_json::json;
use tracing::debug;

use crate::users::{DemoUser, UserDirectory};

/// Name the password strategy registers under.
pub const PASSWORD_STRATEGY: &str = "password";

/// Checks `Authorization: Basic` credentials against the user directory.
pub struct PasswordStrategy {
    directory: Arc<UserDirectory>,
    challenge: String,
}

impl PasswordStrategy {
    pub fn new(directory: Arc<UserDirectory>, realm: &str) -> Self {
        Self {
            directory,
            challenge: format!("Basic realm=\"{realm}\""),
        }
    }

    /// Challenge sent when credentials are missing or wrong.
    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

/// The credentials part of a Basic authorization header value.
fn basic_payload(value: &str) -> Option<&str> {
    let (scheme, payload) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("basic").then(|| payload.trim())
}

/// Decode base64 `username:password` credentials.
fn decode_credentials(payload: &str) -> Option<(String, String)> {
    let decoded = String::from_utf8(STANDARD.decode(payload).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[async_trait]
impl Strategy<DemoUser> for PasswordStrategy {
    fn name(&self) -> &str {
        PASSWORD_STRATEGY
    }

    async fn authenticate(
        &self,
        cx: &AuthContext<DemoUser>,
        _options: &AuthenticateOptions,
    ) -> Action<DemoUser> {
        let payload = cx
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(basic_payload);
        let Some(payload) = payload else {
            return Action::fail_with_challenge(self.challenge.as_str());
        };
        let Some((username, password)) = decode_credentials(payload) else {
            debug!("malformed basic credentials");
            return Action::fail_with(self.challenge.as_str(), StatusCode::BAD_REQUEST);
        };

        match self.directory.verify(&username, &password) {
            Some(user) => {
                let info = AuthInfo::new(json!({
                    "type": "success",
                    "message": format!("Welcome back, {}", user.username),
                }));
                Action::success_with_info(user, info)
            }
            None => {
                debug!(username = %username, "rejected credentials");
                Action::fail_with_challenge(self.challenge.as_str())
            }
        }
    }
}
