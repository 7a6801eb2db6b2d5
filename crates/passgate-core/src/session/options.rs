//! Session configuration.

use std::time::Duration;

use crate::cookie::CookieOptions;
use crate::error::{AuthError, AuthResult};

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "__session";

/// Default token lifetime (1 hour).
pub const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(60 * 60);

/// Default leeway in seconds for the expiration check.
pub const DEFAULT_LEEWAY_SECS: u64 = 0;

/// Token-backed session configuration.
#[derive(Clone)]
pub struct SessionOptions {
    /// Name of the cookie carrying the token.
    pub name: String,

    /// Token validity window.
    pub expires_in: Duration,

    /// HMAC signing secret.
    pub secret: String,

    /// Audience claim to issue and require.
    pub audience: Option<String>,

    /// Issuer claim to issue and require.
    pub issuer: Option<String>,

    /// Leeway in seconds for the expiration check.
    pub leeway_secs: u64,

    /// Attributes of the session cookie.
    pub cookie: CookieOptions,
}

impl SessionOptions {
    /// Create options with the given signing secret and defaults elsewhere.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            expires_in: DEFAULT_EXPIRES_IN,
            secret: secret.into(),
            audience: None,
            issuer: None,
            leeway_secs: DEFAULT_LEEWAY_SECS,
            cookie: CookieOptions::default(),
        }
    }

    /// Set the cookie name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the token lifetime.
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = expires_in;
        self
    }

    /// Set the token lifetime from a human-readable string such as `"1h"`
    /// or `"30min"`.
    pub fn with_expires_in_str(self, expires_in: &str) -> AuthResult<Self> {
        let duration = humantime::parse_duration(expires_in).map_err(|e| {
            AuthError::Config(format!("invalid session lifetime '{}': {}", expires_in, e))
        })?;
        Ok(self.with_expires_in(duration))
    }

    /// Set the audience claim.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set the issuer claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the leeway for the expiration check.
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// Set the cookie attributes.
    pub fn with_cookie(mut self, cookie: CookieOptions) -> Self {
        self.cookie = cookie;
        self
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> AuthResult<()> {
        if self.secret.is_empty() {
            return Err(AuthError::Config("session secret must not be empty".to_string()));
        }
        if self.name.is_empty() || self.name.contains(&[';', '=', ' '][..]) {
            return Err(AuthError::Config(format!(
                "invalid session cookie name '{}'",
                self.name
            )));
        }
        if self.expires_in.is_zero() {
            return Err(AuthError::Config("session lifetime must be positive".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("name", &self.name)
            .field("expires_in", &self.expires_in)
            .field("secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("leeway_secs", &self.leeway_secs)
            .field("cookie", &self.cookie)
            .finish()
    }
}
