//! The `client_credentials` grant of [rfc6749 section 4.4].
//!
//! [rfc6749 section 4.4]: https://tools.ietf.org/html/rfc6749#section-4.4
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::model::ClientCredentialsModel;
use crate::primitives::grant::{Client, Token, User};
use crate::request::Request;

use super::{BaseGrant, GrantOptions, GrantType};

/// Issues an access token to an authenticated client acting on its own behalf.
///
/// No refresh token is issued, the client can simply request a new token.
pub struct ClientCredentialsGrant<M: ?Sized> {
    base: BaseGrant<M>,
}

impl<M: ClientCredentialsModel + ?Sized> ClientCredentialsGrant<M> {
    /// The `grant_type` value.
    pub const NAME: &'static str = "client_credentials";

    /// Construct the grant type.
    pub fn new(options: GrantOptions, model: Arc<M>) -> Self {
        ClientCredentialsGrant {
            base: BaseGrant::new(options, model),
        }
    }

    /// Resolve the user the client acts as.
    pub async fn user_from_client(
        &self, request: &Request, client: &Client,
    ) -> Result<User, OAuthError> {
        self.base
            .model()
            .get_user_from_client(client, request)
            .await?
            .ok_or_else(|| OAuthError::invalid_grant("Invalid grant: user credentials are invalid"))
    }

    /// Mint and persist the access token.
    pub async fn save_token(
        &self, request: &Request, user: User, client: &Client, scope: Option<String>,
    ) -> Result<Token, OAuthError> {
        let access_token = self.base.generate_access_token(request).await?;
        let token = Token {
            access_token,
            access_token_expires_at: self.base.access_token_expires_at(),
            refresh_token: None,
            refresh_token_expires_at: None,
            scope,
            grant: Self::NAME.to_string(),
            authorization_code: None,
            client: client.clone(),
            user,
        };

        Ok(self.base.model().save_token(token, request).await?)
    }
}

#[async_trait]
impl<M: ClientCredentialsModel + ?Sized> GrantType for ClientCredentialsGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        self.base.ensure_grant(client, Self::NAME)?;
        let scope = self.base.scope(request)?;
        let user = self.user_from_client(request, client).await?;
        self.save_token(request, user, client, scope).await
    }
}
