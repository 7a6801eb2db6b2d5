//! Session lifecycle: issuing tokens on login and revoking them on logout.

use std::sync::Arc;

use jsonwebtoken::get_current_timestamp;
use tracing::{debug, info, warn};

use super::claims::Claims;
use super::codec::TokenCodec;
use super::options::SessionOptions;
use super::store::SessionStore;
use crate::context::AuthContext;
use crate::error::AuthResult;
use crate::strategy::AuthUser;

/// Builds the claims for a new session token.
pub type TokenFactory<U> = Arc<dyn Fn(&AuthContext<U>, &U) -> Claims + Send + Sync>;

/// Default claims: the user's id as subject, a fresh token id, and the
/// client address.
pub fn default_token_factory<U: AuthUser>() -> TokenFactory<U> {
    Arc::new(|cx: &AuthContext<U>, user: &U| Claims::new(user.id()).with_login_ip(cx.client_ip()))
}

/// Issues and revokes token-backed sessions.
pub struct SessionManager<U> {
    options: SessionOptions,
    codec: TokenCodec,
    store: Arc<dyn SessionStore<U>>,
    create_token: TokenFactory<U>,
}

impl<U: AuthUser> SessionManager<U> {
    /// Create a manager, validating the options.
    pub fn new(options: SessionOptions, store: Arc<dyn SessionStore<U>>) -> AuthResult<Self> {
        options.validate()?;

        let codec = TokenCodec::with_secret(options.secret.as_bytes())
            .with_audience(options.audience.clone())
            .with_issuer(options.issuer.clone())
            .with_leeway(options.leeway_secs);

        Ok(Self {
            options,
            codec,
            store,
            create_token: default_token_factory(),
        })
    }

    /// Replace the claims factory. The factory must at least set `sub`.
    pub fn with_token_factory(
        mut self,
        factory: impl Fn(&AuthContext<U>, &U) -> Claims + Send + Sync + 'static,
    ) -> Self {
        self.create_token = Arc::new(factory);
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn SessionStore<U>> {
        &self.store
    }

    /// Claims for a new session of `user`.
    ///
    /// Audience and issuer come from the options unless the factory set
    /// them; the expiry is the issue time plus the session lifetime.
    pub fn issue_claims(&self, cx: &AuthContext<U>, user: &U) -> Claims {
        let mut claims = (self.create_token)(cx, user);
        if claims.aud.is_none() {
            claims.aud = self.options.audience.clone();
        }
        if claims.iss.is_none() {
            claims.iss = self.options.issuer.clone();
        }
        if claims.iat == 0 {
            claims.iat = get_current_timestamp();
        }
        if claims.exp == 0 {
            claims.exp = claims.iat + self.options.expires_in.as_secs();
        }
        claims
    }

    /// Establish a session for `user`.
    ///
    /// The user is attached to the request before any I/O. The token is
    /// persisted first and the cookie is only queued once the store
    /// accepted it. A session already issued on this request is revoked
    /// before the new one replaces it.
    pub async fn log_in(&self, cx: &AuthContext<U>, user: U) -> AuthResult<()> {
        cx.set_user(user.clone());

        if let Some(superseded) = cx.pending_cookie(&self.options.name) {
            let claims = self.codec.decode(&superseded)?;
            self.store.delete_token(&claims).await?;
            debug!(jti = %claims.jti, "revoked superseded session token");
        }

        let claims = self.issue_claims(cx, &user);
        let token = self.codec.sign(&claims)?;
        let issued = self.codec.decode(&token)?;

        if let Err(err) = self.store.save_token(&issued).await {
            warn!(user_id = %issued.sub, error = %err, "failed to persist session token");
            return Err(err.into());
        }

        cx.set_cookie(&self.options.name, &token, &self.options.cookie);
        info!(user_id = %issued.sub, jti = %issued.jti, "session established");
        Ok(())
    }

    /// End the session on this request.
    ///
    /// Identity and cookie are cleared immediately and stay cleared even if
    /// revoking the incoming token fails.
    pub async fn log_out(&self, cx: &AuthContext<U>) -> AuthResult<()> {
        cx.clear_user();
        cx.clear_cookie(&self.options.name, &self.options.cookie);

        let Some(token) = cx.cookie(&self.options.name) else {
            debug!("logout without session cookie");
            return Ok(());
        };

        let claims = self.codec.decode(&token)?;
        if let Err(err) = self.store.delete_token(&claims).await {
            warn!(jti = %claims.jti, error = %err, "failed to revoke session token");
            return Err(err.into());
        }

        info!(user_id = %claims.sub, jti = %claims.jti, "session revoked");
        Ok(())
    }
}
