//! The `code` response type of [rfc6749 section 4.1.1].
//!
//! [rfc6749 section 4.1.1]: https://tools.ietf.org/html/rfc6749#section-4.1.1
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use url::Url;

use crate::error::OAuthError;
use crate::grant_types::expires_at;
use crate::model::CodeModel;
use crate::primitives::grant::{AuthorizationCode, Client, User};
use crate::primitives::Time;
use crate::request::{Param, Request};
use crate::validator;

use super::{
    build_error_redirect_uri, build_success_redirect_uri, AuthorizeOptions, BaseResponse, Issued,
    Redirect, ResponseType,
};

/// Issues an authorization code bound to the client and redirect uri.
pub struct CodeResponseType<M: ?Sized> {
    base: BaseResponse<M>,
    allow_empty_state: bool,
}

impl<M: CodeModel + ?Sized> CodeResponseType<M> {
    /// The `response_type` value.
    pub const NAME: &'static str = "code";

    /// Construct the response type, the code lifetime must be positive.
    pub fn new(options: AuthorizeOptions, model: Arc<M>) -> Result<Self, OAuthError> {
        Ok(CodeResponseType {
            base: BaseResponse::new(options.authorization_code_lifetime, model)?,
            allow_empty_state: options.allow_empty_state,
        })
    }

    /// The requested redirect uri, or else the first one the client registered.
    pub fn redirect_uri<'a>(
        &self, request: &'a Request, client: &'a Client,
    ) -> Result<&'a str, OAuthError> {
        match request.param("redirect_uri") {
            Param::Unique(redirect_uri) => Ok(redirect_uri),
            Param::Absent => client.redirect_uris.first().map(String::as_str).ok_or_else(|| {
                OAuthError::invalid_client("Invalid client: missing client `redirectUri`")
            }),
            Param::Repeated => Err(OAuthError::invalid_request(
                "Invalid request: `redirect_uri` is not a valid URI",
            )),
        }
    }

    /// The requested scope, a malformed one is an `invalid_scope`.
    pub fn scope(&self, request: &Request) -> Result<Option<String>, OAuthError> {
        request
            .param("scope")
            .optional(validator::nqschar)
            .map(|scope| scope.map(str::to_string))
            .map_err(|()| OAuthError::invalid_scope("Invalid parameter: `scope`"))
    }

    /// The `state` to echo back to the client.
    pub fn state(&self, request: &Request) -> Result<Option<String>, OAuthError> {
        match request.param("state") {
            Param::Absent if self.allow_empty_state => Ok(None),
            Param::Absent => Err(OAuthError::invalid_request("Missing parameter: `state`")),
            Param::Unique(state) if validator::vschar(state) => Ok(Some(state.to_string())),
            _ => Err(OAuthError::invalid_request("Invalid parameter: `state`")),
        }
    }

    /// Expiry of a code issued now.
    pub fn authorization_code_expires_at(&self) -> Time {
        let now = Utc::now();
        expires_at(now, Some(self.base.authorization_code_lifetime())).unwrap_or(Time::MAX_UTC)
    }

    /// Persist the code.
    pub async fn save_authorization_code(
        &self, request: &Request, code: AuthorizationCode,
    ) -> Result<AuthorizationCode, OAuthError> {
        Ok(self.base.model().save_authorization_code(code, request).await?)
    }

    async fn issue(
        &self, request: &Request, client: &Client, user: &User, redirect_uri: &str,
    ) -> Result<(AuthorizationCode, Option<String>), OAuthError> {
        let authorization_code = self.base.generate_authorization_code(request).await?;
        let scope = self.scope(request)?;
        let scope = self.base.validate_scope(request, client, user, scope).await?;

        let code = AuthorizationCode {
            authorization_code,
            expires_at: self.authorization_code_expires_at(),
            redirect_uri: Some(redirect_uri.to_string()),
            scope,
            client: client.clone(),
            user: user.clone(),
        };
        let code = self.save_authorization_code(request, code).await?;

        let state = self.state(request)?;
        Ok((code, state))
    }
}

#[async_trait]
impl<M: CodeModel + ?Sized> ResponseType for CodeResponseType<M> {
    async fn handle(
        &self, request: &Request, client: &Client, user: &User,
    ) -> Result<Redirect, OAuthError> {
        if !client.allows("authorization_code") {
            return Err(OAuthError::unauthorized_client(
                "Unauthorized client: `grant_type` is invalid",
            ));
        }

        let requested = self.redirect_uri(request, client)?;
        let redirect_uri = Url::parse(requested).map_err(|_| {
            OAuthError::invalid_request("Invalid request: `redirect_uri` is not a valid URI")
        })?;

        // From here on every failure is delivered through the redirect.
        match self.issue(request, client, user, requested).await {
            Ok((code, state)) => {
                let mut query = vec![("code", code.authorization_code.as_str())];
                if let Some(state) = &state {
                    query.push(("state", state.as_str()));
                }

                Ok(Redirect {
                    redirect_uri: build_success_redirect_uri(&redirect_uri, &query),
                    result: Ok(Issued::Code(code)),
                })
            }
            Err(error) => {
                debug!(client_id = %client.id, %error, "redirecting authorization error");
                Ok(Redirect {
                    redirect_uri: build_error_redirect_uri(&redirect_uri, &error, &[]),
                    result: Err(error),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::primitives::memory::MemoryStore;

    fn response_type(allow_empty_state: bool) -> CodeResponseType<MemoryStore> {
        let options = AuthorizeOptions {
            allow_empty_state,
            ..AuthorizeOptions::default()
        };
        CodeResponseType::new(options, Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn state_checks_are_repeatable() {
        let response_type = response_type(false);

        let request = Request::new().with_query(vec![("state", "foobar")]);
        assert_eq!(response_type.state(&request).unwrap().as_deref(), Some("foobar"));
        assert_eq!(response_type.state(&request).unwrap(), response_type.state(&request).unwrap());

        let first = response_type.state(&Request::new()).unwrap_err();
        let second = response_type.state(&Request::new()).unwrap_err();
        assert_eq!(first.kind(), ErrorKind::InvalidRequest);
        assert_eq!(first.message(), second.message());

        let request = Request::new().with_query(vec![("state", "foo\nbar")]);
        assert_eq!(
            response_type.state(&request).unwrap_err().message(),
            "Invalid parameter: `state`"
        );
    }

    #[test]
    fn empty_state_may_be_allowed() {
        assert_eq!(response_type(true).state(&Request::new()).unwrap(), None);
    }

    #[test]
    fn malformed_scope_is_a_scope_error() {
        let request = Request::new().with_query(vec![("scope", "foo\"bar")]);
        let error = response_type(false).scope(&request).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidScope);
    }

    #[test]
    fn redirect_uri_defaults_to_registration() {
        let client = Client::new("12345", ["authorization_code"], ["http://example.com/cb"]);
        let response_type = response_type(false);
        assert_eq!(
            response_type.redirect_uri(&Request::new(), &client).unwrap(),
            "http://example.com/cb"
        );

        let request = Request::new().with_query(vec![("redirect_uri", "http://example.com/other")]);
        assert_eq!(
            response_type.redirect_uri(&request, &client).unwrap(),
            "http://example.com/other"
        );
    }
}
