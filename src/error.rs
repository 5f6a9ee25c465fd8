//! Errors defined in [rfc6749], together with the failures an integration can cause.
//!
//! Every failure surfaced by this crate is an [`OAuthError`]. Its [`ErrorKind`] fixes both the
//! machine readable `error` code sent to clients and the HTTP status a frontend should answer
//! with. Whether the error is delivered directly or by redirecting the user-agent back to the
//! client is decided by the component that produced it, see [`handlers::AuthorizeHandler`].
//!
//! [rfc6749]: https://tools.ietf.org/html/rfc6749#section-5.2
//! [`handlers::AuthorizeHandler`]: ../handlers/struct.AuthorizeHandler.html
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

/// The closed set of error kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// The resource owner or authorization server denied the request.
    AccessDenied,

    /// The library was called with arguments that can not be valid, a bug in the integration.
    InvalidArgument,

    /// The client is unknown or its registration is malformed.
    InvalidClient,

    /// The provided authorization grant (e.g., authorization code, resource owner credentials) or
    /// refresh token is invalid, expired, revoked, does not match the redirection URI used in the
    /// authorization request, or was issued to another client.
    InvalidGrant,

    /// The request is missing a required parameter, includes an invalid parameter value, includes
    /// a parameter more than once, or is otherwise malformed.
    InvalidRequest,

    /// The requested scope is invalid, unknown, or malformed.
    InvalidScope,

    /// The access token provided is expired, revoked, malformed, or invalid.
    InvalidToken,

    /// The authorization server encountered an unexpected condition that prevented it from
    /// fulfilling the request.
    ServerError,

    /// The client is not authorized to use this authorization grant type.
    UnauthorizedClient,

    /// The request lacks any authentication information.
    UnauthorizedRequest,

    /// The authorization grant type is not supported by the authorization server.
    UnsupportedGrantType,

    /// The authorization server does not support obtaining an authorization code using this method.
    UnsupportedResponseType,
}

impl ErrorKind {
    /// The `error` code as transmitted to the client.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::InvalidClient => "invalid_client",
            ErrorKind::InvalidGrant => "invalid_grant",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::InvalidScope => "invalid_scope",
            ErrorKind::InvalidToken => "invalid_token",
            ErrorKind::ServerError => "server_error",
            ErrorKind::UnauthorizedClient => "unauthorized_client",
            ErrorKind::UnauthorizedRequest => "unauthorized_request",
            ErrorKind::UnsupportedGrantType => "unsupported_grant_type",
            ErrorKind::UnsupportedResponseType => "unsupported_response_type",
        }
    }

    /// The HTTP status code of a direct error response.
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::InvalidToken
            | ErrorKind::UnauthorizedClient
            | ErrorKind::UnauthorizedRequest => 401,
            ErrorKind::ServerError => 500,
            _ => 400,
        }
    }

    fn reason(self) -> &'static str {
        match self.code() {
            401 => "Unauthorized",
            500 => "Internal Server Error",
            _ => "Bad Request",
        }
    }
}

impl AsRef<str> for ErrorKind {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure of one of the grant flows.
///
/// Carries the kind, a human readable message and, when this error wraps another one, the
/// original cause. The message is what ends up as `error_description`.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct OAuthError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl OAuthError {
    /// Create an error with an explanation.
    pub fn new<M: Into<Cow<'static, str>>>(kind: ErrorKind, message: M) -> Self {
        OAuthError {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Create an error without explanation.
    ///
    /// The message defaults to the reason phrase of the kind's status code.
    pub fn from_kind(kind: ErrorKind) -> Self {
        OAuthError::new(kind, kind.reason())
    }

    /// Wrap another error, taking over its message.
    pub fn wrap<E>(kind: ErrorKind, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        OAuthError {
            kind,
            message: cause.to_string().into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// Wrap an opaque failure of the model or of extension code as a `server_error`.
    pub fn server_error(cause: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        warn!(error = %cause, "wrapping non-oauth failure as server_error");
        let message = cause.to_string();
        OAuthError {
            kind: ErrorKind::ServerError,
            message: if message.is_empty() {
                ErrorKind::ServerError.reason().into()
            } else {
                message.into()
            },
            cause: Some(Arc::from(cause)),
        }
    }

    /// Shorthand for an `access_denied` error.
    pub fn access_denied<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::AccessDenied, message)
    }

    /// Shorthand for an `invalid_argument` error.
    pub fn invalid_argument<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidArgument, message)
    }

    /// Shorthand for an `invalid_client` error.
    pub fn invalid_client<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidClient, message)
    }

    /// Shorthand for an `invalid_grant` error.
    pub fn invalid_grant<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidGrant, message)
    }

    /// Shorthand for an `invalid_request` error.
    pub fn invalid_request<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidRequest, message)
    }

    /// Shorthand for an `invalid_scope` error.
    pub fn invalid_scope<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidScope, message)
    }

    /// Shorthand for an `invalid_token` error.
    pub fn invalid_token<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::InvalidToken, message)
    }

    /// Shorthand for an `unauthorized_client` error.
    pub fn unauthorized_client<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::UnauthorizedClient, message)
    }

    /// Shorthand for an `unauthorized_request` error.
    pub fn unauthorized_request<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::UnauthorizedRequest, message)
    }

    /// Shorthand for an `unsupported_grant_type` error.
    pub fn unsupported_grant_type<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::UnsupportedGrantType, message)
    }

    /// Shorthand for an `unsupported_response_type` error.
    pub fn unsupported_response_type<M: Into<Cow<'static, str>>>(message: M) -> Self {
        OAuthError::new(ErrorKind::UnsupportedResponseType, message)
    }

    /// The formal kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The `error` code, e.g. `invalid_request`.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The HTTP status code for a direct error response.
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    /// The human readable explanation.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Iterate over the key value pairs that describe this error.
    ///
    /// These pairs appear as the form urlencoded query component of a redirect or as the members
    /// of a json error body.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let description = if self.message.is_empty() {
            None
        } else {
            Some(("error_description", self.message()))
        };

        std::iter::once(("error", self.name())).chain(description)
    }

    /// Convert the error into a json string.
    ///
    /// The string may be the content of an `application/json` body for example.
    pub fn to_json(&self) -> String {
        let asmap = self.iter().collect::<BTreeMap<_, _>>();
        serde_json::to_string(&asmap).unwrap()
    }
}
