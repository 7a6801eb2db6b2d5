//! Strategy registry and authentication chains.
//!
//! An [`Authenticator`] holds every registered [`Strategy`] and the optional
//! session manager. It is built once at startup and then frozen behind an
//! `Arc`. Routes protect themselves with an [`AuthChain`], an ordered list
//! of strategy names plus the [`AuthenticateOptions`] that decide what
//! happens on success and on exhaustion.

mod chain;
mod options;
mod outcome;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;
use tracing::debug;

use crate::context::AuthContext;
use crate::error::AuthResult;
use crate::session::{SessionManager, SessionStrategy};
use crate::strategy::{AuthInfo, AuthUser, Strategy};

pub use chain::AuthChain;
pub use options::{AuthenticateOptions, FlashOption, MessageOption};
pub use outcome::{FailureReport, Outcome, Resolution, ResultHandler};

/// Rewrites the auth info reported by a strategy before it is stored on
/// the request.
#[async_trait]
pub trait AuthInfoTransform<U: AuthUser>: Send + Sync {
    async fn transform(
        &self,
        cx: &AuthContext<U>,
        info: Option<AuthInfo>,
    ) -> AuthResult<Option<AuthInfo>>;
}

/// Keeps auth info as the strategy reported it.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

#[async_trait]
impl<U: AuthUser> AuthInfoTransform<U> for IdentityTransform {
    async fn transform(
        &self,
        _cx: &AuthContext<U>,
        info: Option<AuthInfo>,
    ) -> AuthResult<Option<AuthInfo>> {
        Ok(info)
    }
}

/// Strategy names a chain tries, in order.
///
/// A single name reports its one failure to result handlers; a list
/// reports every failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyChain {
    Single(String),
    Multi(Vec<String>),
}

impl StrategyChain {
    pub fn names(&self) -> &[String] {
        match self {
            StrategyChain::Single(name) => std::slice::from_ref(name),
            StrategyChain::Multi(names) => names,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, StrategyChain::Multi(_))
    }
}

impl From<&str> for StrategyChain {
    fn from(name: &str) -> Self {
        StrategyChain::Single(name.to_string())
    }
}

impl From<String> for StrategyChain {
    fn from(name: String) -> Self {
        StrategyChain::Single(name)
    }
}

impl From<Vec<&str>> for StrategyChain {
    fn from(names: Vec<&str>) -> Self {
        StrategyChain::Multi(names.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for StrategyChain {
    fn from(names: Vec<String>) -> Self {
        StrategyChain::Multi(names)
    }
}

impl<const N: usize> From<[&str; N]> for StrategyChain {
    fn from(names: [&str; N]) -> Self {
        StrategyChain::Multi(names.iter().map(|name| name.to_string()).collect())
    }
}

/// Registry of strategies shared by all requests.
pub struct Authenticator<U: AuthUser> {
    strategies: HashMap<String, Arc<dyn Strategy<U>>>,
    sessions: Option<Arc<SessionManager<U>>>,
    info_transform: Arc<dyn AuthInfoTransform<U>>,
}

impl<U: AuthUser> Authenticator<U> {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            sessions: None,
            info_transform: Arc::new(IdentityTransform),
        }
    }

    /// Register a strategy under its own name, replacing any strategy
    /// already registered under that name.
    pub fn register(&mut self, strategy: Arc<dyn Strategy<U>>) {
        let name = strategy.name().to_string();
        debug!(strategy = %name, "registering strategy");
        self.strategies.insert(name, strategy);
    }

    pub fn with_strategy(mut self, strategy: impl Strategy<U> + 'static) -> Self {
        self.register(Arc::new(strategy));
        self
    }

    /// Enable token sessions. Also registers the `session` strategy.
    pub fn with_sessions(mut self, manager: SessionManager<U>) -> Self {
        let manager = Arc::new(manager);
        self.register(Arc::new(SessionStrategy::new(Arc::clone(&manager))));
        self.sessions = Some(manager);
        self
    }

    pub fn with_info_transform(mut self, transform: impl AuthInfoTransform<U> + 'static) -> Self {
        self.info_transform = Arc::new(transform);
        self
    }

    pub fn strategy(&self, name: &str) -> Option<Arc<dyn Strategy<U>>> {
        self.strategies.get(name).cloned()
    }

    pub fn sessions(&self) -> Option<&Arc<SessionManager<U>>> {
        self.sessions.as_ref()
    }

    pub(crate) fn info_transform(&self) -> &dyn AuthInfoTransform<U> {
        self.info_transform.as_ref()
    }

    /// Build the request context for a request.
    pub fn context(&self, parts: &Parts) -> AuthContext<U> {
        AuthContext::from_parts(parts, self.sessions.clone())
    }

    /// Build a chain over `names`.
    ///
    /// Names are resolved per request, so a chain naming an unregistered
    /// strategy only fails once it runs.
    pub fn chain(
        self: &Arc<Self>,
        names: impl Into<StrategyChain>,
        options: AuthenticateOptions,
    ) -> AuthChain<U> {
        AuthChain::new(Arc::clone(self), names.into(), options)
    }
}

impl<U: AuthUser> Default for Authenticator<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_chain_conversions() {
        let single = StrategyChain::from("session");
        assert!(!single.is_multi());
        assert_eq!(single.names(), ["session".to_string()]);

        let multi = StrategyChain::from(["basic", "session"]);
        assert!(multi.is_multi());
        assert_eq!(multi.names().len(), 2);

        // A one-element list still reports as a list.
        assert!(StrategyChain::from(vec!["basic"]).is_multi());
    }
}
