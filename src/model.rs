//! The storage and business logic adapter every grant and response type delegates to.
//!
//! Each component only requires the trait that names the operations it actually calls, so a
//! backend supporting just the client credentials grant need not implement code storage. All
//! methods are asynchronous and receive the request being processed. A synchronous backend simply
//! returns without awaiting anything.
//!
//! Optional capabilities are exposed by [`Model`] and are queried once, when a grant or response
//! type is constructed. A model that does not provide them gets random tokens and the default
//! scope checks.
use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::primitives::generator::TokenGenerator;
use crate::primitives::grant::{AuthorizationCode, Client, Token, User};
use crate::request::Request;

/// Failure of a model operation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A deliberate rejection, surfaced with its kind unchanged.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// Any other failure of the backend. Surfaced as a `server_error` keeping the message.
    #[error("{0}")]
    Storage(Box<dyn StdError + Send + Sync + 'static>),
}

impl ModelError {
    /// Wrap an arbitrary backend failure.
    pub fn storage<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        ModelError::Storage(error.into())
    }
}

impl From<ModelError> for OAuthError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::OAuth(error) => error,
            ModelError::Storage(cause) => OAuthError::server_error(cause),
        }
    }
}

/// Base of all model traits.
pub trait Model: Send + Sync {
    /// Overrides for token and code generation.
    fn generator(&self) -> Option<Arc<dyn TokenGenerator>> {
        None
    }

    /// A custom check of requested scopes.
    fn scope_validator(&self) -> Option<Arc<dyn ScopeValidator>> {
        None
    }
}

/// Persists issued tokens, required by every grant type.
#[async_trait]
pub trait TokenModel: Model {
    /// Save a freshly minted token.
    ///
    /// The returned token is what the grant type hands out, so the backend may attach
    /// information of its own.
    async fn save_token(&self, token: Token, request: &Request) -> Result<Token, ModelError>;
}

/// Operations of the `client_credentials` grant.
#[async_trait]
pub trait ClientCredentialsModel: TokenModel {
    /// The user on whose behalf an authenticated client acts.
    async fn get_user_from_client(
        &self, client: &Client, request: &Request,
    ) -> Result<Option<User>, ModelError>;
}

/// Operations of the `authorization_code` grant.
#[async_trait]
pub trait AuthorizationCodeModel: TokenModel {
    /// Find a previously saved authorization code.
    async fn get_authorization_code(
        &self, authorization_code: &str, request: &Request,
    ) -> Result<Option<AuthorizationCode>, ModelError>;

    /// Invalidate a code so that it can not be exchanged again.
    ///
    /// Returns `false` if the code was not found, for example because a concurrent exchange
    /// already consumed it.
    async fn revoke_authorization_code(
        &self, code: &AuthorizationCode, request: &Request,
    ) -> Result<bool, ModelError>;
}

/// Operations of the `password` grant.
#[async_trait]
pub trait PasswordModel: TokenModel {
    /// Check resource owner credentials.
    async fn get_user(
        &self, username: &str, password: &str, request: &Request,
    ) -> Result<Option<User>, ModelError>;
}

/// Operations of the `refresh_token` grant.
#[async_trait]
pub trait RefreshTokenModel: TokenModel {
    /// Find the token a refresh token was issued with.
    async fn get_refresh_token(
        &self, refresh_token: &str, request: &Request,
    ) -> Result<Option<Token>, ModelError>;

    /// Invalidate the refresh token of a token.
    ///
    /// Returns `false` if the token was not found.
    async fn revoke_token(&self, token: &Token, request: &Request) -> Result<bool, ModelError>;
}

/// Persists authorization codes, required by the `code` response type.
#[async_trait]
pub trait CodeModel: Model {
    /// Save a freshly generated code.
    async fn save_authorization_code(
        &self, code: AuthorizationCode, request: &Request,
    ) -> Result<AuthorizationCode, ModelError>;
}

/// Operations of the authorization endpoint.
#[async_trait]
pub trait AuthorizeModel: CodeModel {
    /// Look up a registered client.
    async fn get_client(
        &self, client_id: &str, request: &Request,
    ) -> Result<Option<Client>, ModelError>;
}

/// Lookup of access tokens for the bearer authenticator.
#[async_trait]
pub trait AccessTokenModel: Model {
    /// Find an issued token by its access token.
    async fn get_access_token(
        &self, access_token: &str, request: &Request,
    ) -> Result<Option<Token>, ModelError>;
}

/// What a scope is requested for.
#[derive(Clone, Copy, Debug)]
pub enum ScopeSubject<'a> {
    /// An authorization request by a client on behalf of a user.
    Authorization {
        /// The requesting client.
        client: &'a Client,

        /// The resource owner.
        user: &'a User,
    },

    /// A refresh of an existing token.
    Refresh {
        /// The token being refreshed.
        token: &'a Token,
    },
}

/// Custom acceptance of requested scopes.
#[async_trait]
pub trait ScopeValidator: Send + Sync {
    /// Check the requested scope.
    ///
    /// Returns the scope to grant, or `None` to reject the request with `invalid_scope`. For a
    /// refresh, the grant type always keeps the requested scope once it was accepted.
    async fn validate_scope(
        &self, subject: ScopeSubject<'_>, scope: Option<&str>, request: &Request,
    ) -> Result<Option<String>, ModelError>;
}
