//! The `authorization_code` grant of [rfc6749 section 4.1.3].
//!
//! [rfc6749 section 4.1.3]: https://tools.ietf.org/html/rfc6749#section-4.1.3
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OAuthError;
use crate::model::AuthorizationCodeModel;
use crate::primitives::grant::{AuthorizationCode, Client, Token, User};
use crate::request::Request;
use crate::validator;

use super::base::required;
use super::{BaseGrant, GrantOptions, GrantType};

/// Exchanges an authorization code for a token pair.
///
/// Each code is revoked in the exchange that consumes it, a second exchange fails.
pub struct AuthorizationCodeGrant<M: ?Sized> {
    base: BaseGrant<M>,
}

impl<M: AuthorizationCodeModel + ?Sized> AuthorizationCodeGrant<M> {
    /// The `grant_type` value.
    pub const NAME: &'static str = "authorization_code";

    /// Construct the grant type.
    pub fn new(options: GrantOptions, model: Arc<M>) -> Self {
        AuthorizationCodeGrant {
            base: BaseGrant::new(options, model),
        }
    }

    /// Find the code of the request body and check it was issued to this client.
    pub async fn authorization_code(
        &self, request: &Request, client: &Client,
    ) -> Result<AuthorizationCode, OAuthError> {
        let code = required(request, "code", validator::vschar)?;
        let code = self
            .base
            .model()
            .get_authorization_code(code, request)
            .await?
            .filter(|code| code.client.id == client.id)
            .ok_or_else(|| {
                OAuthError::invalid_grant("Invalid grant: authorization code is invalid")
            })?;

        if code.is_expired() {
            return Err(OAuthError::invalid_grant(
                "Invalid grant: authorization code has expired",
            ));
        }

        if let Some(redirect_uri) = &code.redirect_uri {
            if !validator::uri(redirect_uri) {
                return Err(OAuthError::invalid_grant(
                    "Invalid grant: `redirect_uri` is not a valid URI",
                ));
            }
        }

        Ok(code)
    }

    /// The token request must repeat the redirect uri of the authorization request.
    ///
    /// Codes issued without a redirect uri accept any request.
    pub fn validate_redirect_uri(
        &self, request: &Request, code: &AuthorizationCode,
    ) -> Result<(), OAuthError> {
        let expected = match &code.redirect_uri {
            Some(expected) => expected,
            None => return Ok(()),
        };

        let redirect_uri = request
            .param("redirect_uri")
            .value()
            .filter(|redirect_uri| validator::uri(redirect_uri))
            .ok_or_else(|| {
                OAuthError::invalid_request("Invalid request: `redirect_uri` is not a valid URI")
            })?;

        if redirect_uri != expected {
            return Err(OAuthError::invalid_request(
                "Invalid request: `redirect_uri` is invalid",
            ));
        }

        Ok(())
    }

    /// Invalidate the code, failing if it was already consumed.
    pub async fn revoke_authorization_code(
        &self, request: &Request, code: &AuthorizationCode,
    ) -> Result<(), OAuthError> {
        let revoked = self
            .base
            .model()
            .revoke_authorization_code(code, request)
            .await?;

        if revoked {
            Ok(())
        } else {
            Err(OAuthError::invalid_grant(
                "Invalid grant: authorization code is invalid",
            ))
        }
    }

    /// Mint and persist an access and refresh token for the exchanged code.
    pub async fn save_token(
        &self, request: &Request, user: User, client: &Client, authorization_code: String,
        scope: Option<String>,
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
            authorization_code: Some(authorization_code),
            client: client.clone(),
            user,
        };

        Ok(self.base.model().save_token(token, request).await?)
    }
}

#[async_trait]
impl<M: AuthorizationCodeModel + ?Sized> GrantType for AuthorizationCodeGrant<M> {
    async fn handle(&self, request: &Request, client: &Client) -> Result<Token, OAuthError> {
        self.base.ensure_grant(client, Self::NAME)?;
        let code = self.authorization_code(request, client).await?;
        self.validate_redirect_uri(request, &code)?;
        self.revoke_authorization_code(request, &code).await?;

        let AuthorizationCode {
            authorization_code,
            scope,
            user,
            ..
        } = code;
        self.save_token(request, user, client, authorization_code, scope)
            .await
    }
}
