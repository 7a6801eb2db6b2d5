//! Request-scoped authentication context.
//!
//! An [`AuthContext`] is created once per request by the `initialize`
//! middleware and threaded explicitly through every strategy, the
//! orchestrator, and the session manager. Handlers reach it through the
//! request extensions. It owns the identity decided for this request and
//! the cookie changes that must be written to the response.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{request::Parts, HeaderMap, Method, Uri};
use axum::response::Response;
use parking_lot::Mutex;

use crate::cookie::{self, CookieChange, CookieOptions};
use crate::error::{AuthError, AuthResult};
use crate::messages::{MessageHandle, MessageSink};
use crate::session::SessionManager;
use crate::strategy::{AuthInfo, AuthUser};

/// Snapshot of the parts of a request strategies may inspect.
///
/// The body is deliberately absent: it stays with the middleware until the
/// chain has decided, so nothing downstream can observe it early.
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub client_addr: Option<SocketAddr>,
}

impl RequestHead {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            client_addr: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        }
    }
}

struct RequestState<U> {
    user: Option<U>,
    auth_info: Option<AuthInfo>,
    assigned: HashMap<String, U>,
    cookies: Vec<CookieChange>,
}

impl<U> Default for RequestState<U> {
    fn default() -> Self {
        Self {
            user: None,
            auth_info: None,
            assigned: HashMap::new(),
            cookies: Vec::new(),
        }
    }
}

struct ContextInner<U> {
    head: RequestHead,
    sessions: Option<Arc<SessionManager<U>>>,
    messages: Option<MessageHandle>,
    state: Mutex<RequestState<U>>,
}

/// Per-request authentication state. Cloning yields another handle to the
/// same request.
pub struct AuthContext<U> {
    inner: Arc<ContextInner<U>>,
}

impl<U> Clone for AuthContext<U> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<U: AuthUser> AuthContext<U> {
    /// Create a context for a request.
    pub fn new(
        head: RequestHead,
        sessions: Option<Arc<SessionManager<U>>>,
        messages: Option<MessageHandle>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                head,
                sessions,
                messages,
                state: Mutex::new(RequestState::default()),
            }),
        }
    }

    /// Create a context from request parts, picking up the client address
    /// and any [`MessageHandle`] the host installed.
    pub fn from_parts(parts: &Parts, sessions: Option<Arc<SessionManager<U>>>) -> Self {
        let messages = parts.extensions.get::<MessageHandle>().cloned();
        Self::new(RequestHead::from_parts(parts), sessions, messages)
    }

    pub fn head(&self) -> &RequestHead {
        &self.inner.head
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.head.headers
    }

    /// Value of an incoming request cookie.
    pub fn cookie(&self, name: &str) -> Option<String> {
        cookie::find_cookie(&self.inner.head.headers, name)
    }

    /// Client IP address, when the server exposes connection info.
    pub fn client_ip(&self) -> Option<String> {
        self.inner.head.client_addr.map(|addr| addr.ip().to_string())
    }

    pub fn sessions(&self) -> Option<&Arc<SessionManager<U>>> {
        self.inner.sessions.as_ref()
    }

    pub fn messages(&self) -> Option<&dyn MessageSink> {
        self.inner.messages.as_ref().map(|handle| handle.0.as_ref())
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<U> {
        self.inner.state.lock().user.clone()
    }

    pub fn set_user(&self, user: U) {
        self.inner.state.lock().user = Some(user);
    }

    pub fn clear_user(&self) {
        self.inner.state.lock().user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.lock().user.is_some()
    }

    pub fn is_unauthenticated(&self) -> bool {
        !self.is_authenticated()
    }

    /// Attach a user under a named property without establishing a session.
    pub fn assign(&self, property: impl Into<String>, user: U) {
        self.inner.state.lock().assigned.insert(property.into(), user);
    }

    pub fn assigned(&self, property: &str) -> Option<U> {
        self.inner.state.lock().assigned.get(property).cloned()
    }

    pub fn auth_info(&self) -> Option<AuthInfo> {
        self.inner.state.lock().auth_info.clone()
    }

    pub fn set_auth_info(&self, info: Option<AuthInfo>) {
        self.inner.state.lock().auth_info = info;
    }

    /// Establish a session for `user`. See [`SessionManager::log_in`].
    pub async fn log_in(&self, user: U) -> AuthResult<()> {
        let manager = self.require_sessions()?;
        manager.log_in(self, user).await
    }

    /// End the current session. See [`SessionManager::log_out`].
    pub async fn log_out(&self) -> AuthResult<()> {
        let manager = self.require_sessions()?;
        manager.log_out(self).await
    }

    fn require_sessions(&self) -> AuthResult<Arc<SessionManager<U>>> {
        self.inner
            .sessions
            .clone()
            .ok_or_else(|| AuthError::Config("sessions are not configured".to_string()))
    }

    /// Queue a cookie for the response, replacing any pending change to the
    /// same cookie.
    pub fn set_cookie(&self, name: &str, value: &str, options: &CookieOptions) {
        self.push_cookie(CookieChange::Set {
            name: name.to_string(),
            value: value.to_string(),
            options: options.clone(),
        });
    }

    /// Queue removal of a cookie, replacing any pending change to it.
    pub fn clear_cookie(&self, name: &str, options: &CookieOptions) {
        self.push_cookie(CookieChange::Clear {
            name: name.to_string(),
            options: options.clone(),
        });
    }

    fn push_cookie(&self, change: CookieChange) {
        let mut state = self.inner.state.lock();
        state.cookies.retain(|existing| existing.name() != change.name());
        state.cookies.push(change);
    }

    /// Value of a cookie set earlier on this request, if one is pending.
    pub fn pending_cookie(&self, name: &str) -> Option<String> {
        self.inner
            .state
            .lock()
            .cookies
            .iter()
            .find_map(|change| match change {
                CookieChange::Set { name: set, value, .. } if set == name => Some(value.clone()),
                _ => None,
            })
    }

    /// Cookie changes queued so far.
    pub fn pending_cookies(&self) -> Vec<CookieChange> {
        self.inner.state.lock().cookies.clone()
    }

    /// Write queued cookie changes onto `response` and clear the queue.
    pub fn apply_cookies(&self, response: &mut Response) {
        let changes = std::mem::take(&mut self.inner.state.lock().cookies);
        cookie::append_set_cookies(response.headers_mut(), &changes);
    }
}
