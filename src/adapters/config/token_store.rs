use std::sync::RwLock;

use crate::ports::CredentialProvider;

/// Process-wide in-memory credential holder. Seeded from persistent storage
/// at startup, replaced at login and emptied at logout; every HTTP call
/// reads through this rather than holding its own copy of the token.
#[derive(Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            token: RwLock::new(initial),
        }
    }

    pub fn set(&self, token: String) {
        *self.token.write().expect("token lock poisoned") = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }
}

impl CredentialProvider for TokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_and_logout_are_visible_to_readers() {
        let store = TokenStore::new(None);
        assert!(store.token().is_none());

        store.set("jwt-abc".to_string());
        assert_eq!(store.token().as_deref(), Some("jwt-abc"));

        store.clear();
        assert!(store.token().is_none());
    }
}
