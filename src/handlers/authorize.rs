//! The authorization endpoint of [rfc6749 section 3.1].
//!
//! [rfc6749 section 3.1]: https://tools.ietf.org/html/rfc6749#section-3.1
use std::sync::Arc;

use tracing::debug;

use crate::error::{ErrorKind, OAuthError};
use crate::model::{AccessTokenModel, AuthorizeModel};
use crate::primitives::grant::{Client, User};
use crate::request::{Param, Request, Response};
use crate::response_types::{AuthorizeOptions, Outcome, Redirect, ResponseTypes};
use crate::validator;

use super::{Authenticate, BearerAuthenticator};

/// Handles authorization requests of already authenticated users.
///
/// There are two ways a request can fail. Until the redirect uri of the client is known the
/// handler returns the error directly and the caller should answer with an error page or a json
/// error. Afterwards the handler always succeeds. It redirects the response to the client with
/// the error encoded in the query and returns that error as the [`Outcome`].
pub struct AuthorizeHandler<M: ?Sized> {
    options: AuthorizeOptions,
    model: Arc<M>,
    authenticator: Arc<dyn Authenticate>,
    response_types: ResponseTypes<M>,
}

impl<M: AuthorizeModel + AccessTokenModel + ?Sized + 'static> AuthorizeHandler<M> {
    /// Authenticate users with bearer tokens looked up in the model.
    pub fn new(options: AuthorizeOptions, model: Arc<M>) -> Self {
        let authenticator = Arc::new(BearerAuthenticator::new(model.clone()));
        AuthorizeHandler::with_authenticator(options, model, authenticator)
    }
}

impl<M: AuthorizeModel + ?Sized + 'static> AuthorizeHandler<M> {
    /// Use a custom authentication of users.
    pub fn with_authenticator(
        options: AuthorizeOptions, model: Arc<M>, authenticator: Arc<dyn Authenticate>,
    ) -> Self {
        AuthorizeHandler {
            options,
            model,
            authenticator,
            response_types: ResponseTypes::with_defaults(),
        }
    }

    /// The supported response types, extension types can be registered here.
    pub fn response_types_mut(&mut self) -> &mut ResponseTypes<M> {
        &mut self.response_types
    }

    /// Process an authorization request.
    ///
    /// On success the response redirects to the client and the outcome tells whether a grant was
    /// issued or an error was redirected.
    pub async fn handle(
        &self, request: &Request, response: &mut Response,
    ) -> Result<Outcome, OAuthError> {
        if request.query.unique_value("allowed") == Some("false") {
            return Err(OAuthError::access_denied(
                "Access denied: user denied access to application",
            ));
        }

        let (client, user) =
            futures::try_join!(self.client(request), self.user(request, response))?;
        let redirect = self.handle_response_type(request, &client, &user).await?;
        response.redirect(&redirect.redirect_uri);
        Ok(redirect.result)
    }

    /// Resolve and check the client of the request.
    pub async fn client(&self, request: &Request) -> Result<Client, OAuthError> {
        let client_id = match request.param("client_id") {
            Param::Absent => {
                return Err(OAuthError::invalid_request("Missing parameter: `client_id`"))
            }
            Param::Unique(client_id) if validator::vschar(client_id) => client_id,
            _ => return Err(OAuthError::invalid_request("Invalid parameter: `client_id`")),
        };

        let redirect_uri = request
            .param("redirect_uri")
            .optional(validator::uri)
            .map_err(|()| {
                OAuthError::invalid_request("Invalid request: `redirect_uri` is not a valid URI")
            })?;

        let client = self
            .model
            .get_client(client_id, request)
            .await?
            .ok_or_else(|| {
                OAuthError::invalid_client("Invalid client: client credentials are invalid")
            })?;

        if client.grants.is_empty() {
            return Err(OAuthError::invalid_client(
                "Invalid client: missing client `grants`",
            ));
        }

        if client.redirect_uris.is_empty() {
            return Err(OAuthError::invalid_client(
                "Invalid client: missing client `redirectUri`",
            ));
        }

        if let Some(redirect_uri) = redirect_uri {
            if !client.has_redirect_uri(redirect_uri) {
                return Err(OAuthError::invalid_client(
                    "Invalid client: `redirect_uri` does not match client value",
                ));
            }
        }

        Ok(client)
    }

    /// Authenticate the resource owner.
    pub async fn user(
        &self, request: &Request, response: &mut Response,
    ) -> Result<User, OAuthError> {
        self.authenticator
            .handle(request, response)
            .await?
            .ok_or_else(|| {
                OAuthError::new(
                    ErrorKind::ServerError,
                    "Server error: `handle()` did not return a `user` object",
                )
            })
    }

    async fn handle_response_type(
        &self, request: &Request, client: &Client, user: &User,
    ) -> Result<Redirect, OAuthError> {
        let name = match request.param("response_type") {
            Param::Absent => {
                return Err(OAuthError::invalid_request(
                    "Missing parameter: `response_type`",
                ))
            }
            Param::Unique(name) if validator::nchar(name) || validator::uri(name) => name,
            _ => {
                return Err(OAuthError::invalid_request(
                    "Invalid parameter: `response_type`",
                ))
            }
        };

        let factory = self.response_types.get(name).ok_or_else(|| {
            OAuthError::unsupported_response_type(
                "Unsupported response type: `response_type` is invalid",
            )
        })?;

        debug!(response_type = name, client_id = %client.id, "dispatching authorization request");
        let response_type = factory(self.options, self.model.clone())?;
        response_type.handle(request, client, user).await
    }
}
