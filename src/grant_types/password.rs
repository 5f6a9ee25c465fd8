//! The `password` grant of [rfc6749 section 4.3].
//!
//! [rfc6749 section 4.3]: https://tools.ietf.org/html/rfc6749#section-4.3
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::model::PasswordModel;
use crate::primitives::grant::{Client, Token, User};
use crate::request::{Param, Request};
use crate::validator;

use super::{BaseGrant, GrantOptions, GrantType};

/// Exchanges resource owner credentials for a token pair.
pub struct PasswordGrant<M: ?Sized> {
    base: BaseGrant<M>,
}

impl<M: PasswordModel + ?Sized> PasswordGrant<M> {
    /// The `grant_type` value.
    pub const NAME: &'static str = "password";

    /// Construct the grant type.
    pub fn new(options: GrantOptions, model: Arc<M>) -> Self {
        PasswordGrant {
            base: BaseGrant::new(options, model),
        }
    }

    /// Check the `username` and `password` of the request body.
    pub async fn user(&self, request: &Request) -> Result<User, OAuthError> {
        let username = request.body.get("username");
        let password = request.body.get("password");
        if username == Param::Absent {
            return Err(OAuthError::invalid_request("Missing parameter: `username`"));
        }
        if password == Param::Absent {
            return Err(OAuthError::invalid_request("Missing parameter: `password`"));
        }

        let username = username
            .value()
            .filter(|username| validator::uchar(username))
            .ok_or_else(|| OAuthError::invalid_request("Invalid parameter: `username`"))?;
        let password = password
            .value()
            .filter(|password| validator::uchar(password))
            .ok_or_else(|| OAuthError::invalid_request("Invalid parameter: `password`"))?;

        self.base
            .model()
            .get_user(username, password, request)
            .await?
            .ok_or_else(|| OAuthError::invalid_grant("Invalid grant: user credentials are invalid"))
    }

    /// Mint and persist an access and refresh token.
    pub async fn save_token(
        &self, request: &Request, user: User, client: &Client, scope: Option<String>,
    ) -> Result<Token, OAuthError> {
        let (access_token, refresh_token) = futures::try_join!(
            self.base.generate_access_token(request),
            self.base.generate_refresh_token(request),
        )?;

        let token = Token {
            access_token,
            access_token_expires_at: self.base.access_token_expires_at(),
            refresh_token: Some(refresh_token),
            refresh_token_expires_at: self.base.refresh_token_expires_at(),
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
impl<M: PasswordModel + ?Sized> GrantType for PasswordGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        self.base.ensure_grant(client, Self::NAME)?;
        let scope = self.base.scope(request)?;
        let user = self.user(request).await?;
        self.save_token(request, user, client, scope).await
    }
}
