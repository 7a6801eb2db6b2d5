//! Error types for authentication, token handling, and session storage.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by the signed-claims codec.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The signature is valid but the token is past its expiry.
    #[error("token expired")]
    Expired,

    /// Bad signature, malformed token, or a claim constraint mismatch.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    /// Claims could not be signed.
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err),
        }
    }
}

/// Errors raised by a user/token store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Authentication errors.
///
/// A chain that simply runs out of strategies is not an error; it only
/// becomes `Unauthenticated` when the chain is configured to fail with an
/// error instead of writing a response.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A chain names a strategy that was never registered.
    #[error("unknown authentication strategy \"{0}\"")]
    UnknownStrategy(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never went through the `initialize` middleware.
    #[error("authentication context is not initialized for this request")]
    NotInitialized,

    /// Token signing or verification failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// User lookup or token persistence failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every strategy in the chain failed.
    #[error("{}", .status.canonical_reason().unwrap_or("Unauthorized"))]
    Unauthenticated {
        /// Response status derived from the failure records.
        status: StatusCode,
        /// Text challenges for the `WWW-Authenticate` header.
        challenges: Vec<String>,
    },

    /// A strategy reported an internal error.
    #[error("strategy error: {0}")]
    Strategy(String),
}

impl AuthError {
    /// HTTP status used when this error reaches the response.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated { status, .. } => *status,
            AuthError::Token(_) => StatusCode::UNAUTHORIZED,
            AuthError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthError::UnknownStrategy(_) => "UNKNOWN_STRATEGY",
            AuthError::Config(_) => "CONFIG_ERROR",
            AuthError::NotInitialized => "NOT_INITIALIZED",
            AuthError::Token(_) => "INVALID_TOKEN",
            AuthError::Store(_) => "STORE_ERROR",
            AuthError::Unauthenticated { .. } => "UNAUTHENTICATED",
            AuthError::Strategy(_) => "STRATEGY_ERROR",
        }
    }
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Error flag.
    pub error: bool,
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AuthError::Unauthenticated { challenges, .. } = &self {
            let mut response = (status, self.to_string()).into_response();
            if status == StatusCode::UNAUTHORIZED {
                for challenge in challenges {
                    match HeaderValue::from_str(challenge) {
                        Ok(value) => {
                            response
                                .headers_mut()
                                .append(header::WWW_AUTHENTICATE, value);
                        }
                        Err(err) => {
                            tracing::warn!(
                                challenge = %challenge,
                                error = %err,
                                "dropping unrenderable challenge"
                            );
                        }
                    }
                }
            }
            return response;
        }

        if status.is_server_error() {
            tracing::error!(error = %self, "authentication request failed");
        }

        let body = ErrorResponse {
            error: true,
            code: self.code().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_display_uses_reason_phrase() {
        let err = AuthError::Unauthenticated {
            status: StatusCode::FORBIDDEN,
            challenges: vec![],
        };
        assert_eq!(err.to_string(), "Forbidden");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unknown_strategy_message() {
        let err = AuthError::UnknownStrategy("ldap".to_string());
        assert!(err.to_string().contains("\"ldap\""));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthenticated_response_carries_challenges() {
        let err = AuthError::Unauthenticated {
            status: StatusCode::UNAUTHORIZED,
            challenges: vec!["Basic realm=\"Users\"".to_string(), "Bearer".to_string()],
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let values: Vec<_> = response
            .headers()
            .get_all(header::WWW_AUTHENTICATE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["Basic realm=\"Users\"", "Bearer"]);
    }

    #[test]
    fn test_unrenderable_challenge_is_skipped() {
        let err = AuthError::Unauthenticated {
            status: StatusCode::UNAUTHORIZED,
            challenges: vec!["Basic\nrealm".to_string(), "Bearer".to_string()],
        };
        let response = err.into_response();

        let values: Vec<_> = response
            .headers()
            .get_all(header::WWW_AUTHENTICATE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["Bearer"]);
    }

    #[test]
    fn test_token_errors_map_to_unauthorized() {
        let err = AuthError::from(TokenError::Expired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let err = AuthError::from(StoreError::Unavailable("redis down".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
