use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::model::{
    AccessTokenModel, AuthorizationCodeModel, AuthorizeModel, ClientCredentialsModel, CodeModel,
    Model, ModelError, PasswordModel, RefreshTokenModel, ScopeSubject, ScopeValidator, TokenModel,
};
use crate::primitives::generator::TokenGenerator;
use crate::primitives::grant::{AuthorizationCode, Client, Token, User};
use crate::primitives::memory::MemoryStore;
use crate::request::{Request, Response};
use crate::handlers::Authenticate;

mod authorize;

/// Fixtures shared by the flows.
pub mod defaults {
    pub const EXAMPLE_CLIENT_ID: &str = "12345";
    pub const EXAMPLE_OWNER_ID: &str = "123";
    pub const EXAMPLE_REDIRECT_URI: &str = "http://example.com/cb";
    pub const EXAMPLE_STATE: &str = "foobar";
    pub const EXAMPLE_USERNAME: &str = "foo";
    pub const EXAMPLE_PASSWORD: &str = "bar";
}

use self::defaults::*;

/// A model delegating to a `MemoryStore` that records which operations were called.
///
/// Failures and overrides are switched on per test.
#[derive(Default)]
pub struct TestModel {
    pub store: MemoryStore,
    pub fixed_code: Option<&'static str>,
    pub fail_save_code: bool,
    pub deny_save_code: Option<&'static str>,
    pub scope_policy: Option<ScopePolicy>,
    calls: Mutex<Vec<&'static str>>,
}

/// Answer of the test scope validator.
#[derive(Clone, Copy)]
pub enum ScopePolicy {
    Accept,
    Reject,
}

impl TestModel {
    pub fn new() -> Self {
        let model = TestModel::default();
        model.store.register_client(example_client(&[
            "authorization_code",
            "client_credentials",
            "password",
            "refresh_token",
        ]));
        model
            .store
            .register_client_user(EXAMPLE_CLIENT_ID, User::new(EXAMPLE_OWNER_ID));
        model
            .store
            .register_user(EXAMPLE_USERNAME, EXAMPLE_PASSWORD, User::new(EXAMPLE_OWNER_ID));
        model
    }

    pub fn called(&self, operation: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|call| *call == operation)
    }

    fn record(&self, operation: &'static str) {
        self.calls.lock().unwrap().push(operation);
    }
}

pub fn example_client(grants: &[&str]) -> Client {
    Client::new(EXAMPLE_CLIENT_ID, grants.iter().copied(), [EXAMPLE_REDIRECT_URI])
}

/// Authenticates every request as the example owner.
pub struct FixedOwner(pub Option<User>);

#[async_trait]
impl Authenticate for FixedOwner {
    async fn handle(&self, _: &Request, _: &mut Response) -> Result<Option<User>, ModelError> {
        Ok(self.0.clone())
    }
}

pub fn owner() -> Arc<FixedOwner> {
    Arc::new(FixedOwner(Some(User::new(EXAMPLE_OWNER_ID))))
}

struct FixedCode(&'static str);

#[async_trait]
impl TokenGenerator for FixedCode {
    async fn generate_authorization_code(&self, _: &Request) -> Result<String, ModelError> {
        Ok(self.0.to_string())
    }
}

struct PolicyValidator(ScopePolicy);

#[async_trait]
impl ScopeValidator for PolicyValidator {
    async fn validate_scope(
        &self, _: ScopeSubject<'_>, scope: Option<&str>, _: &Request,
    ) -> Result<Option<String>, ModelError> {
        match self.0 {
            ScopePolicy::Accept => Ok(Some(scope.unwrap_or_default().to_string())),
            ScopePolicy::Reject => Ok(None),
        }
    }
}

impl Model for TestModel {
    fn generator(&self) -> Option<Arc<dyn TokenGenerator>> {
        self.fixed_code
            .map(|code| Arc::new(FixedCode(code)) as Arc<dyn TokenGenerator>)
    }

    fn scope_validator(&self) -> Option<Arc<dyn ScopeValidator>> {
        self.scope_policy
            .map(|policy| Arc::new(PolicyValidator(policy)) as Arc<dyn ScopeValidator>)
    }
}

#[async_trait]
impl TokenModel for TestModel {
    async fn save_token(&self, token: Token, request: &Request) -> Result<Token, ModelError> {
        self.record("save_token");
        self.store.save_token(token, request).await
    }
}

#[async_trait]
impl ClientCredentialsModel for TestModel {
    async fn get_user_from_client(
        &self, client: &Client, request: &Request,
    ) -> Result<Option<User>, ModelError> {
        self.record("get_user_from_client");
        self.store.get_user_from_client(client, request).await
    }
}

#[async_trait]
impl AuthorizationCodeModel for TestModel {
    async fn get_authorization_code(
        &self, authorization_code: &str, request: &Request,
    ) -> Result<Option<AuthorizationCode>, ModelError> {
        self.record("get_authorization_code");
        self.store.get_authorization_code(authorization_code, request).await
    }

    async fn revoke_authorization_code(
        &self, code: &AuthorizationCode, request: &Request,
    ) -> Result<bool, ModelError> {
        self.record("revoke_authorization_code");
        self.store.revoke_authorization_code(code, request).await
    }
}

#[async_trait]
impl PasswordModel for TestModel {
    async fn get_user(
        &self, username: &str, password: &str, request: &Request,
    ) -> Result<Option<User>, ModelError> {
        self.record("get_user");
        self.store.get_user(username, password, request).await
    }
}

#[async_trait]
impl RefreshTokenModel for TestModel {
    async fn get_refresh_token(
        &self, refresh_token: &str, request: &Request,
    ) -> Result<Option<Token>, ModelError> {
        self.record("get_refresh_token");
        self.store.get_refresh_token(refresh_token, request).await
    }

    async fn revoke_token(&self, token: &Token, request: &Request) -> Result<bool, ModelError> {
        self.record("revoke_token");
        self.store.revoke_token(token, request).await
    }
}

#[async_trait]
impl CodeModel for TestModel {
    async fn save_authorization_code(
        &self, code: AuthorizationCode, request: &Request,
    ) -> Result<AuthorizationCode, ModelError> {
        self.record("save_authorization_code");
        if self.fail_save_code {
            return Err(ModelError::storage("Unhandled exception"));
        }
        if let Some(message) = self.deny_save_code {
            return Err(OAuthError::access_denied(message).into());
        }
        self.store.save_authorization_code(code, request).await
    }
}

#[async_trait]
impl AuthorizeModel for TestModel {
    async fn get_client(
        &self, client_id: &str, request: &Request,
    ) -> Result<Option<Client>, ModelError> {
        self.record("get_client");
        self.store.get_client(client_id, request).await
    }
}

#[async_trait]
impl AccessTokenModel for TestModel {
    async fn get_access_token(
        &self, access_token: &str, request: &Request,
    ) -> Result<Option<Token>, ModelError> {
        self.record("get_access_token");
        self.store.get_access_token(access_token, request).await
    }
}
