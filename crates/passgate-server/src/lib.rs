//! Passgate demo server.
//!
//! Wires the passgate authentication core into an axum router: HTTP Basic
//! login issues a session cookie, and the session strategy restores the
//! user from that cookie on later requests.

pub mod config;
pub mod json;
pub mod routes;
pub mod strategy;
pub mod users;

pub use config::{Args, ServerConfig};
pub use strategy::{PasswordStrategy, PASSWORD_STRATEGY};
pub use users::{DemoUser, UserDirectory};

use std::sync::Arc;

use axum::{middleware, Router};
use passgate_core::{initialize, AuthResult, Authenticator, MemoryStore, SessionManager};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Strategy registry with sessions enabled.
    pub authenticator: Arc<Authenticator<DemoUser>>,
    /// User and issued-token store.
    pub store: Arc<MemoryStore<DemoUser>>,
    /// The Basic password strategy.
    pub password: Arc<PasswordStrategy>,
    /// Server configuration.
    pub config: ServerConfig,
}

impl AppState {
    /// Create application state, seeding the store with the configured
    /// demo accounts.
    pub fn new(config: ServerConfig) -> AuthResult<Self> {
        let directory = Arc::new(UserDirectory::from_entries(&config.users)?);
        let store = Arc::new(MemoryStore::<DemoUser>::new());
        directory.seed(&store);

        let sessions = SessionManager::<DemoUser>::new(config.session_options()?, store.clone())?;
        let password = Arc::new(PasswordStrategy::new(directory, &config.realm));

        let mut authenticator = Authenticator::new().with_sessions(sessions);
        authenticator.register(password.clone());

        Ok(Self {
            authenticator: Arc::new(authenticator),
            store,
            password,
            config,
        })
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::auth::routes(&state))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.authenticator),
            initialize::<DemoUser>,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
