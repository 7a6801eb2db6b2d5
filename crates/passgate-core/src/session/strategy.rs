//! Session token strategy.
//!
//! Restores the identity carried by the session cookie. The strategy never
//! fails a request: a missing token is an abstention, and an untrusted one
//! is an error. Expired tokens whose user still exists are renewed in
//! place.
//!
//! The strategy only sees the request head. The body stays with the
//! middleware until the strategy has answered, so downstream consumers
//! cannot read it while a user lookup is still pending.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::claims::Claims;
use super::codec::Verification;
use super::manager::SessionManager;
use crate::context::AuthContext;
use crate::error::{AuthResult, TokenError};
use crate::orchestrator::AuthenticateOptions;
use crate::strategy::{Action, AuthUser, Strategy};

/// Name the session strategy registers under.
pub const SESSION_STRATEGY: &str = "session";

/// State of the session cookie on a request.
#[derive(Debug)]
pub enum TokenState {
    /// No session cookie.
    Absent,
    /// A verified token.
    Valid(Claims),
    /// A correctly signed token past its expiry.
    Expired(String),
    /// A token that cannot be trusted.
    Invalid(TokenError),
}

/// Authenticates requests from the session cookie.
pub struct SessionStrategy<U> {
    manager: Arc<SessionManager<U>>,
}

impl<U: AuthUser> SessionStrategy<U> {
    pub fn new(manager: Arc<SessionManager<U>>) -> Self {
        Self { manager }
    }

    /// Classify the session cookie on this request.
    pub fn inspect(&self, cx: &AuthContext<U>) -> TokenState {
        let Some(token) = cx.cookie(&self.manager.options().name) else {
            return TokenState::Absent;
        };

        match self.manager.codec().verify(&token) {
            Verification::Valid(claims) => TokenState::Valid(claims),
            Verification::Expired => TokenState::Expired(token),
            Verification::Invalid(err) => TokenState::Invalid(err),
        }
    }

    async fn restore(&self, cx: &AuthContext<U>, claims: &Claims) -> AuthResult<()> {
        match self.manager.store().find_user(claims).await? {
            Some(user) => {
                debug!(user_id = %claims.sub, "session restored");
                cx.set_user(user);
            }
            None => {
                debug!(user_id = %claims.sub, jti = %claims.jti, "session token has no user");
                cx.clear_user();
            }
        }
        Ok(())
    }

    /// Replace an expired token with a fresh session, if its user still
    /// exists. Without a user the request simply stays anonymous.
    async fn renew(&self, cx: &AuthContext<U>, claims: &Claims) -> AuthResult<()> {
        let Some(user) = self.manager.store().find_user(claims).await? else {
            debug!(user_id = %claims.sub, "expired session has no user, skipping renewal");
            return Ok(());
        };

        self.manager.store().delete_token(claims).await?;
        self.manager.log_in(cx, user).await?;
        info!(user_id = %claims.sub, old_jti = %claims.jti, "expired session renewed");
        Ok(())
    }
}

#[async_trait]
impl<U: AuthUser> Strategy<U> for SessionStrategy<U> {
    fn name(&self) -> &str {
        SESSION_STRATEGY
    }

    async fn authenticate(&self, cx: &AuthContext<U>, _options: &AuthenticateOptions) -> Action<U> {
        match self.inspect(cx) {
            TokenState::Absent => Action::pass(),
            TokenState::Valid(claims) => match self.restore(cx, &claims).await {
                Ok(()) => Action::pass(),
                Err(err) => {
                    warn!(error = %err, "session lookup failed");
                    Action::error(err)
                }
            },
            TokenState::Expired(token) => {
                let claims = match self.manager.codec().verify_ignoring_expiry(&token) {
                    Ok(claims) => claims,
                    Err(err) => return Action::error(err),
                };
                match self.renew(cx, &claims).await {
                    Ok(()) => Action::pass(),
                    Err(err) => {
                        warn!(error = %err, "session renewal failed");
                        Action::error(err)
                    }
                }
            }
            TokenState::Invalid(err) => {
                debug!(error = %err, "rejecting session token");
                Action::error(err)
            }
        }
    }
}
