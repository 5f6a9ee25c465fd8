//! Authentication of the resource owner at the authorization endpoint.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{ErrorKind, OAuthError};
use crate::model::{AccessTokenModel, ModelError};
use crate::primitives::grant::{Token, User};
use crate::request::{Param, Request, Response};

/// Establishes the user on whose behalf a request is made.
///
/// Any type with a `handle` can stand in for the built-in [`BearerAuthenticator`], e.g. a session
/// cookie lookup.
#[async_trait]
pub trait Authenticate: Send + Sync {
    /// Identify the user, `None` if no user could be determined.
    ///
    /// The response may be prepared for a failure, for example with a `WWW-Authenticate` header.
    async fn handle(
        &self, request: &Request, response: &mut Response,
    ) -> Result<Option<User>, ModelError>;
}

/// Authenticates users by a bearer token of [rfc6750].
///
/// [rfc6750]: https://tools.ietf.org/html/rfc6750#section-2
pub struct BearerAuthenticator<M: ?Sized> {
    model: Arc<M>,
    allow_bearer_tokens_in_query_string: bool,
}

impl<M: AccessTokenModel + ?Sized> BearerAuthenticator<M> {
    /// Look up tokens through the model, tokens in the query string are refused.
    pub fn new(model: Arc<M>) -> Self {
        BearerAuthenticator {
            model,
            allow_bearer_tokens_in_query_string: false,
        }
    }

    /// Also accept the `access_token` query parameter.
    pub fn allow_query_string(mut self, allow: bool) -> Self {
        self.allow_bearer_tokens_in_query_string = allow;
        self
    }

    /// Find and check the token of the request.
    pub async fn authenticate(
        &self, request: &Request, response: &mut Response,
    ) -> Result<Token, OAuthError> {
        let result = self.token(request).await;
        if let Err(error) = &result {
            if error.kind() == ErrorKind::UnauthorizedRequest {
                response.set("WWW-Authenticate", "Bearer realm=\"Service\"");
            }
        }
        result
    }

    async fn token(&self, request: &Request) -> Result<Token, OAuthError> {
        let access_token = self.token_from_request(request)?;
        let token = self
            .model
            .get_access_token(access_token, request)
            .await?
            .ok_or_else(|| OAuthError::invalid_token("Invalid token: access token is invalid"))?;

        match token.access_token_expires_at {
            Some(expires_at) if expires_at < Utc::now() => Err(OAuthError::invalid_token(
                "Invalid token: access token has expired",
            )),
            _ => Ok(token),
        }
    }

    /// Extract the token from exactly one of header, query and body.
    pub fn token_from_request<'r>(&self, request: &'r Request) -> Result<&'r str, OAuthError> {
        let header = request.header("authorization");
        let query = request.query.get("access_token");
        let body = request.body.get("access_token");

        let sources = [header.is_some(), query != Param::Absent, body != Param::Absent];
        if sources.iter().filter(|&&present| present).count() > 1 {
            return Err(OAuthError::invalid_request(
                "Invalid request: only one authentication method is allowed",
            ));
        }

        if let Some(header) = header {
            return header
                .strip_prefix("Bearer ")
                .map(str::trim)
                .filter(|token| !token.is_empty() && !token.contains(' '))
                .ok_or_else(|| {
                    OAuthError::invalid_request("Invalid request: malformed authorization header")
                });
        }

        if query != Param::Absent {
            if !self.allow_bearer_tokens_in_query_string {
                return Err(OAuthError::invalid_request(
                    "Invalid request: do not send bearer tokens in query URLs",
                ));
            }
            return query
                .value()
                .ok_or_else(|| OAuthError::invalid_request("Invalid parameter: `access_token`"));
        }

        if body != Param::Absent {
            if request.method.eq_ignore_ascii_case("GET") {
                return Err(OAuthError::invalid_request(
                    "Invalid request: token may not be passed in the body when using the GET verb",
                ));
            }
            if !request.is("application/x-www-form-urlencoded") {
                return Err(OAuthError::invalid_request(
                    "Invalid request: content must be application/x-www-form-urlencoded",
                ));
            }
            return body
                .value()
                .ok_or_else(|| OAuthError::invalid_request("Invalid parameter: `access_token`"));
        }

        Err(OAuthError::unauthorized_request(
            "Unauthorized request: no authentication given",
        ))
    }
}

#[async_trait]
impl<M: AccessTokenModel + ?Sized> Authenticate for BearerAuthenticator<M> {
    async fn handle(
        &self, request: &Request, response: &mut Response,
    ) -> Result<Option<User>, ModelError> {
        let token = self.authenticate(request, response).await?;
        Ok(Some(token.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::memory::MemoryStore;

    fn authenticator() -> BearerAuthenticator<MemoryStore> {
        BearerAuthenticator::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn header_token() {
        let request = Request::new().with_header("Authorization", "Bearer foobar");
        assert_eq!(authenticator().token_from_request(&request).unwrap(), "foobar");

        let request = Request::new().with_header("Authorization", "Basic Zm9vOmJhcg==");
        let error = authenticator().token_from_request(&request).unwrap_err();
        assert_eq!(error.message(), "Invalid request: malformed authorization header");
    }

    #[test]
    fn single_source_only() {
        let request = Request::post()
            .with_header("Authorization", "Bearer foo")
            .with_body(vec![("access_token", "bar")]);
        let error = authenticator().token_from_request(&request).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn query_needs_opt_in() {
        let request = Request::new().with_query(vec![("access_token", "foo")]);
        assert!(authenticator().token_from_request(&request).is_err());
        let allowed = authenticator().allow_query_string(true);
        assert_eq!(allowed.token_from_request(&request).unwrap(), "foo");
    }

    #[test]
    fn body_requires_form_post() {
        let request = Request::new().with_body(vec![("access_token", "foo")]);
        assert!(authenticator().token_from_request(&request).is_err());
        let request = Request::post().with_body(vec![("access_token", "foo")]);
        assert_eq!(authenticator().token_from_request(&request).unwrap(), "foo");
    }

    #[test]
    fn missing_token_sets_challenge() {
        let mut response = Response::new();
        let error = smol::block_on(authenticator().authenticate(&Request::new(), &mut response))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnauthorizedRequest);
        assert_eq!(response.get("www-authenticate"), Some("Bearer realm=\"Service\""));
    }

    #[test]
    fn unknown_token() {
        let request = Request::new().with_header("Authorization", "Bearer foo");
        let error = smol::block_on(authenticator().authenticate(&request, &mut Response::new()))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidToken);
        assert_eq!(error.message(), "Invalid token: access token is invalid");
    }
}
