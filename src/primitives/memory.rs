//! An in-memory model.
//!
//! Holds clients, users, codes and tokens in hash maps behind a single lock. Revoking a code or a
//! refresh token removes the record, so each can be exchanged at most once. Nothing is persisted,
//! restarting the process forgets every grant.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::grant::{AuthorizationCode, Client, Token, User};
use crate::model::{
    AccessTokenModel, AuthorizationCodeModel, AuthorizeModel, ClientCredentialsModel, CodeModel,
    Model, ModelError, PasswordModel, RefreshTokenModel, TokenModel,
};
use crate::request::Request;

/// A model keeping everything in memory.
///
/// Passwords are compared as given, this store is meant for tests and development setups.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    clients: HashMap<String, Client>,
    client_users: HashMap<String, User>,
    users: HashMap<String, (String, User)>,
    codes: HashMap<String, AuthorizationCode>,
    access_tokens: HashMap<String, Token>,
    refresh_tokens: HashMap<String, Token>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Insert or update the registration of a client.
    pub fn register_client(&self, client: Client) {
        self.lock().clients.insert(client.id.clone(), client);
    }

    /// Set the user a client acts as in the `client_credentials` grant.
    pub fn register_client_user(&self, client_id: &str, user: User) {
        self.lock().client_users.insert(client_id.to_string(), user);
    }

    /// Insert or update a resource owner with a password.
    pub fn register_user(&self, username: &str, password: &str, user: User) {
        self.lock()
            .users
            .insert(username.to_string(), (password.to_string(), user));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The maps are never left half updated, a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Model for MemoryStore {}

#[async_trait]
impl TokenModel for MemoryStore {
    async fn save_token(&self, token: Token, _: &Request) -> Result<Token, ModelError> {
        let mut inner = self.lock();
        if let Some(refresh_token) = &token.refresh_token {
            inner.refresh_tokens.insert(refresh_token.clone(), token.clone());
        }
        inner
            .access_tokens
            .insert(token.access_token.clone(), token.clone());
        Ok(token)
    }
}

#[async_trait]
impl ClientCredentialsModel for MemoryStore {
    async fn get_user_from_client(
        &self, client: &Client, _: &Request,
    ) -> Result<Option<User>, ModelError> {
        Ok(self.lock().client_users.get(&client.id).cloned())
    }
}

#[async_trait]
impl AuthorizationCodeModel for MemoryStore {
    async fn get_authorization_code(
        &self, authorization_code: &str, _: &Request,
    ) -> Result<Option<AuthorizationCode>, ModelError> {
        Ok(self.lock().codes.get(authorization_code).cloned())
    }

    async fn revoke_authorization_code(
        &self, code: &AuthorizationCode, _: &Request,
    ) -> Result<bool, ModelError> {
        Ok(self
            .lock()
            .codes
            .remove(&code.authorization_code)
            .is_some())
    }
}

#[async_trait]
impl PasswordModel for MemoryStore {
    async fn get_user(
        &self, username: &str, password: &str, _: &Request,
    ) -> Result<Option<User>, ModelError> {
        let inner = self.lock();
        let user = inner
            .users
            .get(username)
            .filter(|(expected, _)| expected == password)
            .map(|(_, user)| user.clone());
        Ok(user)
    }
}

#[async_trait]
impl RefreshTokenModel for MemoryStore {
    async fn get_refresh_token(
        &self, refresh_token: &str, _: &Request,
    ) -> Result<Option<Token>, ModelError> {
        Ok(self.lock().refresh_tokens.get(refresh_token).cloned())
    }

    async fn revoke_token(&self, token: &Token, _: &Request) -> Result<bool, ModelError> {
        let refresh_token = match &token.refresh_token {
            Some(refresh_token) => refresh_token,
            None => return Ok(false),
        };

        let mut inner = self.lock();
        let revoked = inner.refresh_tokens.remove(refresh_token);
        if let Some(revoked) = &revoked {
            inner.access_tokens.remove(&revoked.access_token);
        }
        Ok(revoked.is_some())
    }
}

#[async_trait]
impl CodeModel for MemoryStore {
    async fn save_authorization_code(
        &self, code: AuthorizationCode, _: &Request,
    ) -> Result<AuthorizationCode, ModelError> {
        self.lock()
            .codes
            .insert(code.authorization_code.clone(), code.clone());
        Ok(code)
    }
}

#[async_trait]
impl AuthorizeModel for MemoryStore {
    async fn get_client(&self, client_id: &str, _: &Request) -> Result<Option<Client>, ModelError> {
        Ok(self.lock().clients.get(client_id).cloned())
    }
}

#[async_trait]
impl AccessTokenModel for MemoryStore {
    async fn get_access_token(
        &self, access_token: &str, _: &Request,
    ) -> Result<Option<Token>, ModelError> {
        Ok(self.lock().access_tokens.get(access_token).cloned())
    }
}
