//! Session token claims.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Claims carried by a session token.
///
/// # Example Payload
///
/// ```json
/// {
///   "sub": "user-123",
///   "jti": "4b0a8f9e-8c1d-4a4e-9a59-2a6c1e1b9f10",
///   "login_ip": "203.0.113.7",
///   "iat": 1735603200,
///   "exp": 1735606800,
///   "iss": "passgate"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identifier).
    pub sub: String,

    /// Token identifier, the key of the issued-token record.
    pub jti: Uuid,

    /// Address the session was created from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_ip: Option<String>,

    /// Audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Issued at time (Unix timestamp).
    #[serde(default)]
    pub iat: u64,

    /// Expiration time (Unix timestamp).
    #[serde(default)]
    pub exp: u64,

    /// Application-defined claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Claims for `subject` with a fresh token identifier.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            sub: subject.into(),
            jti: Uuid::new_v4(),
            login_ip: None,
            aud: None,
            iss: None,
            iat: 0,
            exp: 0,
            extra: Map::new(),
        }
    }

    pub fn with_login_ip(mut self, ip: Option<String>) -> Self {
        self.login_ip = ip;
        self
    }

    /// Add an application-defined claim.
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claims_serialization_skips_empty_optionals() {
        let claims = Claims::new("user-1").with_claim("role", json!("admin"));
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["sub"], "user-1");
        assert_eq!(value["role"], "admin");
        assert!(value.get("aud").is_none());
        assert!(value.get("login_ip").is_none());
    }

    #[test]
    fn test_claims_deserialize_with_extra() {
        let jti = Uuid::new_v4();
        let claims: Claims = serde_json::from_value(json!({
            "sub": "user-2",
            "jti": jti,
            "iat": 10,
            "exp": 20,
            "tenant": "acme"
        }))
        .unwrap();

        assert_eq!(claims.jti, jti);
        assert_eq!(claims.exp, 20);
        assert_eq!(claims.extra.get("tenant"), Some(&json!("acme")));
    }
}
