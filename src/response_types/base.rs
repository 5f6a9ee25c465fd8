//! Shared behavior of response types: scope checks and redirect construction.
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::error::OAuthError;
use crate::model::{Model, ModelError, ScopeSubject, ScopeValidator};
use crate::primitives::generator::{RandomGenerator, TokenGenerator};
use crate::primitives::grant::{Client, User};
use crate::request::Request;
use crate::validator;

/// The characters `encodeURIComponent` leaves alone, so spaces become `%20`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Code lifetime, generation and scope checks, embedded into each response type.
pub struct BaseResponse<M: ?Sized> {
    authorization_code_lifetime: u64,
    model: Arc<M>,
    generator: Arc<dyn TokenGenerator>,
    scope_validator: Option<Arc<dyn ScopeValidator>>,
}

impl<M: Model + ?Sized> BaseResponse<M> {
    /// Construct with the code lifetime and the model.
    ///
    /// The lifetime must be positive.
    pub fn new(authorization_code_lifetime: u64, model: Arc<M>) -> Result<Self, OAuthError> {
        if authorization_code_lifetime == 0 {
            return Err(OAuthError::invalid_argument(
                "Missing parameter: `authorization_code_lifetime`",
            ));
        }

        let generator = model
            .generator()
            .unwrap_or_else(|| Arc::new(RandomGenerator::default()));
        let scope_validator = model.scope_validator();

        Ok(BaseResponse {
            authorization_code_lifetime,
            model,
            generator,
            scope_validator,
        })
    }

    /// The model used for persistence.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Lifetime of issued codes in seconds.
    pub fn authorization_code_lifetime(&self) -> u64 {
        self.authorization_code_lifetime
    }

    /// Generate an authorization code.
    pub async fn generate_authorization_code(
        &self, request: &Request,
    ) -> Result<String, ModelError> {
        self.generator.generate_authorization_code(request).await
    }

    /// The `scope` of the request body, a malformed one is an `invalid_argument`.
    pub fn scope(&self, request: &Request) -> Result<Option<String>, OAuthError> {
        request
            .body
            .get("scope")
            .optional(validator::nqschar)
            .map(|scope| scope.map(str::to_string))
            .map_err(|()| OAuthError::invalid_argument("Invalid parameter: `scope`"))
    }

    /// Let the model decide on the requested scope.
    ///
    /// Without a scope validator the requested scope is granted unchanged.
    pub async fn validate_scope(
        &self, request: &Request, client: &Client, user: &User, scope: Option<String>,
    ) -> Result<Option<String>, OAuthError> {
        let scope_validator = match &self.scope_validator {
            Some(scope_validator) => scope_validator,
            None => return Ok(scope),
        };

        let subject = ScopeSubject::Authorization { client, user };
        scope_validator
            .validate_scope(subject, scope.as_deref(), request)
            .await?
            .map(Some)
            .ok_or_else(|| OAuthError::invalid_scope("Invalid scope: Requested scope is invalid"))
    }
}

/// Replace the query of the redirect uri with the error and any extra pairs.
pub fn build_error_redirect_uri(
    redirect_uri: &Url, error: &OAuthError, query: &[(&str, &str)],
) -> Url {
    let mut pairs: Vec<(&str, &str)> = error.iter().collect();
    pairs.extend_from_slice(query);
    let mut uri = redirect_uri.clone();
    set_query(&mut uri, pairs);
    uri
}

/// Add pairs to the existing query of the redirect uri, replacing keys already present.
pub fn build_success_redirect_uri(redirect_uri: &Url, query: &[(&str, &str)]) -> Url {
    let mut pairs: Vec<(String, String)> = redirect_uri
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    for &(key, value) in query {
        match pairs.iter_mut().find(|(existing, _)| existing == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }
    }

    let mut uri = redirect_uri.clone();
    set_query(&mut uri, pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())));
    uri
}

fn set_query<'a, I>(uri: &mut Url, pairs: I)
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let query = pairs
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, COMPONENT),
                utf8_percent_encode(value, COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    uri.set_query(if query.is_empty() { None } else { Some(query.as_str()) });
}
