// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session token storage.

use parking_lot::RwLock;

/// Persistent storage for the session token.
///
/// Views receive a store explicitly; there is no process-wide token.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    fn token(&self) -> Option<String>;

    /// Stores a token, replacing the previous one.
    fn set_token(&self, token: &str);

    /// Removes the stored token.
    fn delete_token(&self);
}

/// In-memory [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_token(&self, token: &str) {
        *self.token.write() = Some(token.to_string());
    }

    fn delete_token(&self) {
        *self.token.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_delete() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.token(), None);

        store.set_token("abc");
        assert_eq!(store.token().as_deref(), Some("abc"));

        store.delete_token();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn with_token_prefills() {
        let store = MemoryTokenStore::with_token("abc");
        assert_eq!(store.token().as_deref(), Some("abc"));
    }
}
