//! Token-backed sessions.
//!
//! No session record lives on the server: each request rebuilds the session
//! from a signed token in a cookie plus a store lookup. The store's
//! issued-token set bounds a session's lifetime, so revoking a token ends
//! the session even while its signature is still valid.
//!
//! # Components
//!
//! - [`TokenCodec`]: signs and verifies [`Claims`]
//! - [`SessionStore`]: user lookup and issued-token persistence
//! - [`SessionStrategy`]: restores identity from the cookie, renewing expired tokens
//! - [`SessionManager`]: login and logout

mod claims;
mod codec;
mod manager;
mod options;
mod store;
mod strategy;

pub use claims::Claims;
pub use codec::{CodecConfig, TokenCodec, Verification};
pub use manager::{default_token_factory, SessionManager, TokenFactory};
pub use options::{SessionOptions, DEFAULT_COOKIE_NAME, DEFAULT_EXPIRES_IN, DEFAULT_LEEWAY_SECS};
pub use store::{MemoryStore, SessionStore};
pub use strategy::{SessionStrategy, TokenState, SESSION_STRATEGY};
