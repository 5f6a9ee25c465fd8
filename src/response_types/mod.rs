//! Response types of the authorization endpoint.
//!
//! A response type decides what the client receives once the resource owner authorized it. Once
//! it has fixed the redirect uri, a response type never fails. Errors are instead encoded into the
//! redirect back to the client, as [rfc6749 section 4.1.2.1] demands, and reported as the
//! [`Outcome`] of the [`Redirect`].
//!
//! [rfc6749 section 4.1.2.1]: https://tools.ietf.org/html/rfc6749#section-4.1.2.1
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::DEFAULT_AUTHORIZATION_CODE_LIFETIME;
use crate::error::OAuthError;
use crate::model::CodeModel;
use crate::primitives::grant::{AuthorizationCode, Client, User};
use crate::request::Request;

mod base;
mod code;

pub use self::base::{build_error_redirect_uri, build_success_redirect_uri, BaseResponse};
pub use self::code::CodeResponseType;

/// Switches of the authorization endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizeOptions {
    /// Accept requests without a `state`.
    pub allow_empty_state: bool,

    /// Lifetime of authorization codes in seconds, must be positive.
    pub authorization_code_lifetime: u64,
}

impl Default for AuthorizeOptions {
    fn default() -> Self {
        AuthorizeOptions {
            allow_empty_state: false,
            authorization_code_lifetime: DEFAULT_AUTHORIZATION_CODE_LIFETIME,
        }
    }
}

/// What a response type issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Issued {
    /// An authorization code.
    Code(AuthorizationCode),
}

/// The issued grant, or the error that was redirected to the client instead.
pub type Outcome = Result<Issued, OAuthError>;

/// Where to send the user-agent and what happened.
#[derive(Clone, Debug)]
pub struct Redirect {
    /// The redirect uri including the encoded result.
    pub redirect_uri: Url,

    /// The grant, or the error encoded into the redirect uri.
    pub result: Outcome,
}

/// Produces the answer to an authorization request.
#[async_trait]
pub trait ResponseType: Send + Sync {
    /// Respond to the authorization request of an authenticated user.
    ///
    /// Errors returned directly happened before the redirect uri was known.
    async fn handle(
        &self, request: &Request, client: &Client, user: &User,
    ) -> Result<Redirect, OAuthError>;
}

/// Constructs a response type for a single request.
pub type ResponseTypeFactory<M> = Arc<
    dyn Fn(AuthorizeOptions, Arc<M>) -> Result<Box<dyn ResponseType>, OAuthError> + Send + Sync,
>;

/// Registry of the supported response types by name.
pub struct ResponseTypes<M: ?Sized> {
    factories: HashMap<String, ResponseTypeFactory<M>>,
}

impl<M: ?Sized + 'static> ResponseTypes<M> {
    /// A registry without any response types.
    pub fn new() -> Self {
        ResponseTypes {
            factories: HashMap::new(),
        }
    }

    /// Register a response type, replacing any previous one of the same name.
    pub fn insert<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(AuthorizeOptions, Arc<M>) -> Result<Box<dyn ResponseType>, OAuthError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Look up a response type by name.
    pub fn get(&self, name: &str) -> Option<&ResponseTypeFactory<M>> {
        self.factories.get(name)
    }

    /// If a response type of this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl<M: CodeModel + ?Sized + 'static> ResponseTypes<M> {
    /// A registry containing the `code` response type.
    pub fn with_defaults() -> Self {
        let mut response_types = ResponseTypes::new();
        response_types.insert(CodeResponseType::<M>::NAME, |options, model| {
            let response_type = CodeResponseType::new(options, model)?;
            Ok(Box::new(response_type) as Box<dyn ResponseType>)
        });
        response_types
    }
}

impl<M: ?Sized + 'static> Default for ResponseTypes<M> {
    fn default() -> Self {
        ResponseTypes::new()
    }
}

impl<M: ?Sized> fmt::Debug for ResponseTypes<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = self.factories.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("ResponseTypes")
            .field("response_types", &names)
            .finish()
    }
}
