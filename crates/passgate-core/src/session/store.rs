//! User directory and issued-token storage.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::claims::Claims;
use crate::error::StoreError;
use crate::strategy::AuthUser;

/// Resolves token subjects to users and tracks issued tokens.
///
/// Implementations own their concurrency safety; the session layer calls
/// them from many requests at once.
#[async_trait]
pub trait SessionStore<U: AuthUser>: Send + Sync {
    /// Find the user a verified token belongs to.
    async fn find_user(&self, claims: &Claims) -> Result<Option<U>, StoreError>;

    /// Record a newly issued token.
    async fn save_token(&self, claims: &Claims) -> Result<(), StoreError>;

    /// Revoke a token.
    async fn delete_token(&self, claims: &Claims) -> Result<(), StoreError>;
}

/// In-memory store backed by concurrent maps.
///
/// A token resolves to a user only while its identifier is still issued,
/// so deleting the record revokes the token even if its signature remains
/// valid.
pub struct MemoryStore<U> {
    users: DashMap<String, U>,
    tokens: DashMap<Uuid, String>,
}

impl<U: AuthUser> MemoryStore<U> {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            tokens: DashMap::new(),
        }
    }

    /// Add or replace a user, keyed by its id.
    pub fn insert_user(&self, user: U) {
        self.users.insert(user.id(), user);
    }

    pub fn remove_user(&self, id: &str) -> Option<U> {
        self.users.remove(id).map(|(_, user)| user)
    }

    /// Whether a token identifier is currently issued.
    pub fn is_issued(&self, jti: &Uuid) -> bool {
        self.tokens.contains_key(jti)
    }

    /// Number of issued tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

impl<U: AuthUser> Default for MemoryStore<U> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<U: AuthUser> SessionStore<U> for MemoryStore<U> {
    async fn find_user(&self, claims: &Claims) -> Result<Option<U>, StoreError> {
        let issued_to = self.tokens.get(&claims.jti).map(|entry| entry.value().clone());
        match issued_to {
            Some(subject) if subject == claims.sub => {
                Ok(self.users.get(&claims.sub).map(|entry| entry.value().clone()))
            }
            _ => Ok(None),
        }
    }

    async fn save_token(&self, claims: &Claims) -> Result<(), StoreError> {
        self.tokens.insert(claims.jti, claims.sub.clone());
        Ok(())
    }

    async fn delete_token(&self, claims: &Claims) -> Result<(), StoreError> {
        self.tokens.remove(&claims.jti);
        Ok(())
    }
}
