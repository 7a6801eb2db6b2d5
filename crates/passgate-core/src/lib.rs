//! Passgate Core - strategy-chain authentication with token-backed sessions.
//!
//! This crate provides the authentication orchestrator, the strategy
//! contract, a session strategy that restores identity from a signed token
//! cookie, and the session lifecycle (login, logout, renewal), plus axum
//! middleware that wires them into a router.

pub mod context;
pub mod cookie;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod orchestrator;
pub mod session;
pub mod strategy;

pub use context::{AuthContext, RequestHead};
pub use cookie::{CookieChange, CookieOptions, SameSite};
pub use error::{AuthError, AuthResult, ErrorResponse, StoreError, TokenError};
pub use messages::{Flash, MemoryMessages, MessageHandle, MessageSink};
pub use middleware::{authenticate, initialize};
pub use strategy::{Action, AuthInfo, AuthUser, Challenge, FailureRecord, Strategy};

// Orchestrator exports
pub use orchestrator::{
    AuthChain, AuthInfoTransform, AuthenticateOptions, Authenticator, FailureReport, FlashOption,
    IdentityTransform, MessageOption, Outcome, Resolution, ResultHandler, StrategyChain,
};

// Session exports
pub use session::{
    Claims, MemoryStore, SessionManager, SessionOptions, SessionStore, SessionStrategy,
    TokenCodec, TokenFactory, Verification,
};
