//! Login, logout, and current-user endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use passgate_core::session::SESSION_STRATEGY;
use passgate_core::{authenticate, AuthContext, AuthError, AuthenticateOptions};

use crate::json::{LoginResponse, UserResponse};
use crate::strategy::PASSWORD_STRATEGY;
use crate::users::DemoUser;
use crate::AppState;

/// Authentication routes.
///
/// `/login` runs the password strategy, `/me` restores the session from
/// its cookie, and `/logout` revokes whatever session cookie it receives.
pub fn routes(state: &AppState) -> Router<AppState> {
    let password = Arc::new(
        state
            .authenticator
            .chain(PASSWORD_STRATEGY, AuthenticateOptions::default()),
    );
    let session = Arc::new(
        state
            .authenticator
            .chain(SESSION_STRATEGY, AuthenticateOptions::default()),
    );

    let login_routes = Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(password, authenticate::<DemoUser>));
    let session_routes = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(session, authenticate::<DemoUser>));

    Router::new()
        .route("/logout", post(logout))
        .merge(login_routes)
        .merge(session_routes)
}

/// Login handler. Runs after the password strategy established a session.
async fn login(
    State(state): State<AppState>,
    cx: AuthContext<DemoUser>,
) -> Result<Json<LoginResponse>, AuthError> {
    let user = cx.user().ok_or_else(|| unauthenticated(&state))?;
    let message = cx
        .auth_info()
        .and_then(|info| info.message().map(str::to_string));

    Ok(Json(LoginResponse {
        user: user.into(),
        message,
    }))
}

/// Current user handler.
async fn me(
    State(state): State<AppState>,
    cx: AuthContext<DemoUser>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = cx.user().ok_or_else(|| unauthenticated(&state))?;
    Ok(Json(user.into()))
}

/// Logout handler.
async fn logout(cx: AuthContext<DemoUser>) -> Result<StatusCode, AuthError> {
    cx.log_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

fn unauthenticated(state: &AppState) -> AuthError {
    AuthError::Unauthenticated {
        status: StatusCode::UNAUTHORIZED,
        challenges: vec![state.password.challenge().to_string()],
    }
}
