//! axum middleware.
//!
//! Install [`initialize`] once around the whole router, then put
//! [`authenticate`] in front of each route that runs a chain:
//!
//! ```ignore
//! let auth = Arc::new(Authenticator::new().with_sessions(manager));
//! let chain = Arc::new(auth.chain("session", AuthenticateOptions::default()));
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .route_layer(middleware::from_fn_with_state(chain, authenticate::<User>))
//!     .layer(middleware::from_fn_with_state(auth, initialize::<User>));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::context::AuthContext;
use crate::error::AuthError;
use crate::orchestrator::{AuthChain, Authenticator, Resolution};
use crate::strategy::AuthUser;

/// Attach a fresh [`AuthContext`] to the request and write its pending
/// cookie changes onto whatever response comes back.
pub async fn initialize<U: AuthUser>(
    State(authenticator): State<Arc<Authenticator<U>>>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();
    let cx = authenticator.context(&parts);
    parts.extensions.insert(cx.clone());

    let mut response = next.run(Request::from_parts(parts, body)).await;
    cx.apply_cookies(&mut response);
    response
}

/// Run an [`AuthChain`] before the request reaches its handler.
///
/// The request body is held here until the chain has settled.
pub async fn authenticate<U: AuthUser>(
    State(chain): State<Arc<AuthChain<U>>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(cx) = req.extensions().get::<AuthContext<U>>().cloned() else {
        return AuthError::NotInitialized.into_response();
    };

    match chain.run(&cx).await {
        Resolution::Continue => next.run(req).await,
        Resolution::Respond(response) => response,
        Resolution::Fatal(err) => {
            debug!(error = %err, path = %req.uri().path(), "authentication aborted");
            err.into_response()
        }
    }
}

#[async_trait]
impl<U, S> FromRequestParts<S> for AuthContext<U>
where
    U: AuthUser,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext<U>>()
            .cloned()
            .ok_or(AuthError::NotInitialized)
    }
}
