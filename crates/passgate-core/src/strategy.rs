//! The strategy contract.
//!
//! A strategy is registered once and shared by every request. For each
//! request the orchestrator hands it the request-scoped [`AuthContext`] and
//! the strategy answers with exactly one [`Action`].

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;

use crate::context::AuthContext;
use crate::error::AuthError;
use crate::orchestrator::AuthenticateOptions;

/// A user record that can be attached to a request.
pub trait AuthUser: Clone + Send + Sync + 'static {
    /// Stable identifier, used as the token subject.
    fn id(&self) -> String;
}

/// A pluggable authenticator.
#[async_trait]
pub trait Strategy<U: AuthUser>: Send + Sync {
    /// Name the strategy is registered under.
    fn name(&self) -> &str;

    /// Inspect the request and decide.
    async fn authenticate(&self, cx: &AuthContext<U>, options: &AuthenticateOptions) -> Action<U>;
}

/// How a client should retry authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// A `WWW-Authenticate` value such as `Basic realm="Users"`.
    Text(String),
    /// A structured challenge, used for flash and session messages only.
    Detail {
        kind: Option<String>,
        message: Option<String>,
    },
}

impl Challenge {
    /// The challenge as a `WWW-Authenticate` value, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Challenge::Text(text) => Some(text),
            Challenge::Detail { .. } => None,
        }
    }

    /// Message to show the user: the structured message or the bare text.
    pub fn message(&self) -> Option<&str> {
        match self {
            Challenge::Text(text) => Some(text),
            Challenge::Detail { message, .. } => message.as_deref(),
        }
    }

    pub fn kind(&self) -> Option<&str> {
        match self {
            Challenge::Text(_) => None,
            Challenge::Detail { kind, .. } => kind.as_deref(),
        }
    }
}

impl From<&str> for Challenge {
    fn from(text: &str) -> Self {
        Challenge::Text(text.to_string())
    }
}

impl From<String> for Challenge {
    fn from(text: String) -> Self {
        Challenge::Text(text)
    }
}

/// Auxiliary information reported alongside a successful authentication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthInfo(pub Value);

impl AuthInfo {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// A bare string, or the `message` field of an object.
    pub fn message(&self) -> Option<&str> {
        match &self.0 {
            Value::String(text) => Some(text),
            Value::Object(map) => map.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The `type` field of an object.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }
}

impl From<&str> for AuthInfo {
    fn from(text: &str) -> Self {
        AuthInfo(Value::String(text.to_string()))
    }
}

/// One strategy's failure in a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureRecord {
    pub challenge: Option<Challenge>,
    pub status: Option<StatusCode>,
}

/// A strategy's decision for one request.
#[derive(Debug)]
pub enum Action<U> {
    /// Credentials were verified; establish `user`.
    Success { user: U, info: Option<AuthInfo> },
    /// Authentication failed; try the next strategy in the chain.
    Fail(FailureRecord),
    /// Send the user agent elsewhere, e.g. to an identity provider.
    Redirect { url: String, status: StatusCode },
    /// No decision; continue downstream without bookkeeping.
    Pass,
    /// Internal error while authenticating.
    Error(AuthError),
}

impl<U> Action<U> {
    pub fn success(user: U) -> Self {
        Action::Success { user, info: None }
    }

    pub fn success_with_info(user: U, info: impl Into<AuthInfo>) -> Self {
        Action::Success {
            user,
            info: Some(info.into()),
        }
    }

    pub fn fail() -> Self {
        Action::Fail(FailureRecord::default())
    }

    pub fn fail_with_challenge(challenge: impl Into<Challenge>) -> Self {
        Action::Fail(FailureRecord {
            challenge: Some(challenge.into()),
            status: None,
        })
    }

    pub fn fail_with_status(status: StatusCode) -> Self {
        Action::Fail(FailureRecord {
            challenge: None,
            status: Some(status),
        })
    }

    pub fn fail_with(challenge: impl Into<Challenge>, status: StatusCode) -> Self {
        Action::Fail(FailureRecord {
            challenge: Some(challenge.into()),
            status: Some(status),
        })
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self::redirect_with_status(url, StatusCode::FOUND)
    }

    pub fn redirect_with_status(url: impl Into<String>, status: StatusCode) -> Self {
        Action::Redirect {
            url: url.into(),
            status,
        }
    }

    pub fn pass() -> Self {
        Action::Pass
    }

    pub fn error(err: impl Into<AuthError>) -> Self {
        Action::Error(err.into())
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Success { .. } => "success",
            Action::Fail(_) => "fail",
            Action::Redirect { .. } => "redirect",
            Action::Pass => "pass",
            Action::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_challenge_text_and_detail() {
        let text = Challenge::from("Basic realm=\"Users\"");
        assert_eq!(text.as_text(), Some("Basic realm=\"Users\""));
        assert_eq!(text.message(), Some("Basic realm=\"Users\""));

        let detail = Challenge::Detail {
            kind: Some("warning".into()),
            message: Some("Unknown user".into()),
        };
        assert_eq!(detail.as_text(), None);
        assert_eq!(detail.message(), Some("Unknown user"));
    }

    #[test]
    fn test_auth_info_message() {
        assert_eq!(AuthInfo::from("Welcome!").message(), Some("Welcome!"));

        let info = AuthInfo::new(json!({"type": "notice", "message": "Hello"}));
        assert_eq!(info.message(), Some("Hello"));
        assert_eq!(info.kind(), Some("notice"));

        assert_eq!(AuthInfo::new(json!({"scope": "read"})).message(), None);
    }

    #[test]
    fn test_fail_constructors() {
        let action: Action<()> = Action::fail_with_status(StatusCode::FORBIDDEN);
        match action {
            Action::Fail(record) => {
                assert_eq!(record.status, Some(StatusCode::FORBIDDEN));
                assert!(record.challenge.is_none());
            }
            other => panic!("unexpected action: {}", other.label()),
        }

        let action: Action<()> = Action::redirect("/login");
        match action {
            Action::Redirect { url, status } => {
                assert_eq!(url, "/login");
                assert_eq!(status, StatusCode::FOUND);
            }
            other => panic!("unexpected action: {}", other.label()),
        }
    }
}
