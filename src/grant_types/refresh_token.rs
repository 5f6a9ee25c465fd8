//! The `refresh_token` grant of [rfc6749 section 6].
//!
//! [rfc6749 section 6]: https://tools.ietf.org/html/rfc6749#section-6
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::OAuthError;
use crate::model::{RefreshTokenModel, ScopeSubject};
use crate::primitives::grant::{Client, Token, User};
use crate::primitives::scope::Scope;
use crate::request::Request;
use crate::validator;

use super::base::required;
use super::{BaseGrant, GrantOptions, GrantType};

/// Retires a token and issues a new pair in its place.
pub struct RefreshTokenGrant<M: ?Sized> {
    base: BaseGrant<M>,
}

impl<M: RefreshTokenModel + ?Sized> RefreshTokenGrant<M> {
    /// The `grant_type` value.
    pub const NAME: &'static str = "refresh_token";

    /// Construct the grant type.
    pub fn new(options: GrantOptions, model: Arc<M>) -> Self {
        RefreshTokenGrant {
            base: BaseGrant::new(options, model),
        }
    }

    /// Find the token of the `refresh_token` in the request body.
    pub async fn refresh_token(
        &self, request: &Request, client: &Client,
    ) -> Result<Token, OAuthError> {
        let refresh_token = required(request, "refresh_token", validator::vschar)?;
        let token = self
            .base
            .model()
            .get_refresh_token(refresh_token, request)
            .await?
            .filter(|token| token.client.id == client.id)
            .ok_or_else(|| OAuthError::invalid_grant("Invalid grant: refresh token is invalid"))?;

        if token.is_refresh_expired() {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: refresh token has expired",
            ));
        }

        Ok(token)
    }

    /// Decide the scope of the new token.
    ///
    /// Without a requested scope the previous one carries over. A requested scope is kept as is
    /// once accepted, by the model if it validates scopes and otherwise only if it is covered by
    /// the previous scope.
    pub async fn validate_scope(
        &self, request: &Request, token: &Token,
    ) -> Result<Option<String>, OAuthError> {
        let requested = match self.base.scope(request)? {
            Some(requested) => requested,
            None => return Ok(token.scope.clone()),
        };

        let accepted = match self.base.scope_validator() {
            Some(scope_validator) => scope_validator
                .validate_scope(ScopeSubject::Refresh { token }, Some(requested.as_str()), request)
                .await?
                .is_some(),
            None => covered_by(&requested, token.scope.as_deref()),
        };

        if !accepted {
            debug!(scope = %requested, "refusing scope of refresh request");
            return Err(OAuthError::invalid_scope(
                "Invalid scope: Requested scope is invalid",
            ));
        }

        Ok(Some(requested))
    }

    /// Retire the previous token.
    pub async fn revoke_token(&self, request: &Request, token: &Token) -> Result<(), OAuthError> {
        if self.base.model().revoke_token(token, request).await? {
            Ok(())
        } else {
            Err(OAuthError::invalid_grant("Invalid grant: refresh token is invalid"))
        }
    }

    /// Mint and persist the replacement pair.
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
impl<M: RefreshTokenModel + ?Sized> GrantType for RefreshTokenGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        self.base.ensure_grant(client, Self::NAME)?;
        let token = self.refresh_token(request, client).await?;
        let scope = self.validate_scope(request, &token).await?;
        self.revoke_token(request, &token).await?;
        self.save_token(request, token.user, client, scope).await
    }
}

fn covered_by(requested: &str, granted: Option<&str>) -> bool {
    let granted = granted.unwrap_or_default();
    match (requested.parse::<Scope>(), granted.parse::<Scope>()) {
        (Ok(requested), Ok(granted)) => requested.privileged_to(&granted),
        _ => false,
    }
}
