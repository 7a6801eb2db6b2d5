//! Demo user directory.

use std::collections::HashMap;

use passgate_core::{AuthError, AuthResult, AuthUser, MemoryStore};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// A user of the demo service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoUser {
    pub id: String,
    pub username: String,
}

impl AuthUser for DemoUser {
    fn id(&self) -> String {
        self.id.clone()
    }
}

struct Account {
    user: DemoUser,
    password_digest: [u8; 32],
}

/// Accounts keyed by username, with SHA-256 password digests.
pub struct UserDirectory {
    accounts: HashMap<String, Account>,
}

impl UserDirectory {
    /// Build a directory from `username:password` entries.
    pub fn from_entries(entries: &[String]) -> AuthResult<Self> {
        let mut accounts = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            let Some((username, password)) = entry.split_once(':') else {
                return Err(AuthError::Config(format!(
                    "account entry must be 'username:password', got '{entry}'"
                )));
            };
            if username.is_empty() || password.is_empty() {
                return Err(AuthError::Config(format!("incomplete account entry '{entry}'")));
            }

            let user = DemoUser {
                id: format!("user-{}", index + 1),
                username: username.to_string(),
            };
            accounts.insert(
                username.to_string(),
                Account {
                    user,
                    password_digest: digest(password),
                },
            );
        }
        Ok(Self { accounts })
    }

    /// The user for a username and password, if they match.
    pub fn verify(&self, username: &str, password: &str) -> Option<DemoUser> {
        let account = self.accounts.get(username)?;
        (account.password_digest == digest(password)).then(|| account.user.clone())
    }

    /// Make every account resolvable by the session store.
    pub fn seed(&self, store: &MemoryStore<DemoUser>) {
        for account in self.accounts.values() {
            store.insert_user(account.user.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn digest(password: &str) -> [u8; 32] {
    Sha256::digest(password.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        UserDirectory::from_entries(&["alice:wonderland".to_string(), "bob:builder".to_string()])
            .unwrap()
    }

    #[test]
    fn test_verify_credentials() {
        let directory = directory();
        assert_eq!(directory.len(), 2);

        let alice = directory.verify("alice", "wonderland").unwrap();
        assert_eq!(alice.id, "user-1");
        assert!(directory.verify("alice", "builder").is_none());
        assert!(directory.verify("carol", "wonderland").is_none());
    }

    #[test]
    fn test_password_may_contain_colons() {
        let directory = UserDirectory::from_entries(&["dave:a:b".to_string()]).unwrap();
        assert!(directory.verify("dave", "a:b").is_some());
    }

    #[test]
    fn test_invalid_entries() {
        assert!(UserDirectory::from_entries(&["alice".to_string()]).is_err());
        assert!(UserDirectory::from_entries(&[":secret".to_string()]).is_err());
    }

    #[test]
    fn test_seed_store() {
        let store = MemoryStore::new();
        directory().seed(&store);
        assert!(store.remove_user("user-2").is_some());
    }
}
