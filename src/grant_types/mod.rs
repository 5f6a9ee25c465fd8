//! Grant types of the token endpoint.
//!
//! A grant type exchanges a credential, such as an authorization code or resource owner
//! credentials, for a freshly minted token. The token endpoint authenticates the client, picks a
//! grant type by the `grant_type` parameter of the request body and calls its `handle`. The
//! [`GrantTypes`] registry implements this dispatch and may be extended with custom grant types
//! identified by a name or uri.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_derive::Serialize;
use tracing::debug;

use crate::config::{DEFAULT_ACCESS_TOKEN_LIFETIME, DEFAULT_REFRESH_TOKEN_LIFETIME};
use crate::error::OAuthError;
use crate::model::{
    AuthorizationCodeModel, ClientCredentialsModel, PasswordModel, RefreshTokenModel, TokenModel,
};
use crate::primitives::grant::{Client, Token};
use crate::primitives::Time;
use crate::request::{Param, Request};
use crate::validator;

mod authorization_code;
mod base;
mod client_credentials;
mod password;
mod refresh_token;

pub use self::authorization_code::AuthorizationCodeGrant;
pub use self::base::{expires_at, BaseGrant};
pub use self::client_credentials::ClientCredentialsGrant;
pub use self::password::PasswordGrant;
pub use self::refresh_token::RefreshTokenGrant;

/// Lifetimes of the issued tokens, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrantOptions {
    /// `None` if access tokens never expire.
    pub access_token_lifetime: Option<u64>,

    /// `None` if refresh tokens never expire.
    pub refresh_token_lifetime: Option<u64>,
}

impl Default for GrantOptions {
    fn default() -> Self {
        GrantOptions {
            access_token_lifetime: Some(DEFAULT_ACCESS_TOKEN_LIFETIME),
            refresh_token_lifetime: Some(DEFAULT_REFRESH_TOKEN_LIFETIME),
        }
    }
}

/// A flow exchanging some credential for a token.
#[async_trait]
pub trait GrantType: Send + Sync {
    /// Validate the credential in the request and issue a token to the authenticated client.
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError>;
}

/// Constructs a grant type for a single request.
pub type GrantFactory<M> =
    Arc<dyn Fn(GrantOptions, Arc<M>) -> Box<dyn GrantType> + Send + Sync>;

/// Registry of the supported grant types by name.
pub struct GrantTypes<M: ?Sized> {
    options: GrantOptions,
    model: Arc<M>,
    factories: HashMap<String, GrantFactory<M>>,
}

impl<M: TokenModel + ?Sized + 'static> GrantTypes<M> {
    /// A registry without any grant types.
    pub fn new(options: GrantOptions, model: Arc<M>) -> Self {
        GrantTypes {
            options,
            model,
            factories: HashMap::new(),
        }
    }

    /// Register a grant type, replacing any previous one of the same name.
    pub fn insert<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(GrantOptions, Arc<M>) -> Box<dyn GrantType> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// If a grant type of this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Dispatch on the `grant_type` of the request body.
    pub async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        let name = match request.body.get("grant_type") {
            Param::Absent => {
                return Err(OAuthError::invalid_request("Missing parameter: `grant_type`"))
            }
            Param::Unique(name) if validator::nchar(name) || validator::uri(name) => name,
            _ => return Err(OAuthError::invalid_request("Invalid parameter: `grant_type`")),
        };

        let factory = self.factories.get(name).ok_or_else(|| {
            OAuthError::unsupported_grant_type("Unsupported grant type: `grant_type` is invalid")
        })?;

        if !client.allows(name) {
            return Err(OAuthError::unauthorized_client(
                "Unauthorized client: `grant_type` is invalid",
            ));
        }

        debug!(grant_type = name, client_id = %client.id, "dispatching token request");
        let grant = factory(self.options, self.model.clone());
        grant.handle(request, client).await
    }
}

impl<M> GrantTypes<M>
where
    M: AuthorizationCodeModel
        + ClientCredentialsModel
        + PasswordModel
        + RefreshTokenModel
        + ?Sized
        + 'static,
{
    /// A registry of the four grant types of rfc6749.
    pub fn with_defaults(options: GrantOptions, model: Arc<M>) -> Self {
        let mut grant_types = GrantTypes::new(options, model);
        grant_types.insert(AuthorizationCodeGrant::<M>::NAME, |options, model| {
            Box::new(AuthorizationCodeGrant::new(options, model)) as Box<dyn GrantType>
        });
        grant_types.insert(ClientCredentialsGrant::<M>::NAME, |options, model| {
            Box::new(ClientCredentialsGrant::new(options, model)) as Box<dyn GrantType>
        });
        grant_types.insert(PasswordGrant::<M>::NAME, |options, model| {
            Box::new(PasswordGrant::new(options, model)) as Box<dyn GrantType>
        });
        grant_types.insert(RefreshTokenGrant::<M>::NAME, |options, model| {
            Box::new(RefreshTokenGrant::new(options, model)) as Box<dyn GrantType>
        });
        grant_types
    }
}

impl<M: ?Sized> fmt::Debug for GrantTypes<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = self.factories.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("GrantTypes")
            .field("options", &self.options)
            .field("grant_types", &names)
            .finish()
    }
}

/// The successful response of the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BearerToken {
    /// The bearer token.
    pub access_token: String,

    /// Always `Bearer`.
    pub token_type: &'static str,

    /// Seconds until the access token expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Token to obtain a new access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// The granted scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl BearerToken {
    /// Describe a token as seen at `now`.
    pub fn new(token: &Token, now: Time) -> Self {
        BearerToken {
            access_token: token.access_token.clone(),
            token_type: "Bearer",
            expires_in: token
                .access_token_expires_at
                .map(|expires_at| (expires_at - now).num_seconds()),
            refresh_token: token.refresh_token.clone(),
            scope: token.scope.clone(),
        }
    }

    /// Convert the token into a json string, viable for being sent over a network with
    /// `application/json` encoding.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}
