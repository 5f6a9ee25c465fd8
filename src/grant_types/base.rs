//! Token lifecycle shared by all grant types.
use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::OAuthError;
use crate::model::{Model, ScopeValidator};
use crate::primitives::generator::{RandomGenerator, TokenGenerator};
use crate::primitives::grant::Client;
use crate::primitives::Time;
use crate::request::{Param, Request};
use crate::validator;

use super::GrantOptions;

/// Generation, expiry and scope extraction, embedded into each grant type.
///
/// The optional capabilities of the model are resolved when this is constructed.
pub struct BaseGrant<M: ?Sized> {
    access_token_lifetime: Option<u64>,
    refresh_token_lifetime: Option<u64>,
    model: Arc<M>,
    generator: Arc<dyn TokenGenerator>,
    scope_validator: Option<Arc<dyn ScopeValidator>>,
}

impl<M: Model + ?Sized> BaseGrant<M> {
    /// Construct with the lifetimes and the model.
    pub fn new(options: GrantOptions, model: Arc<M>) -> Self {
        let generator = model
            .generator()
            .unwrap_or_else(|| Arc::new(RandomGenerator::default()));
        let scope_validator = model.scope_validator();

        BaseGrant {
            access_token_lifetime: options.access_token_lifetime,
            refresh_token_lifetime: options.refresh_token_lifetime,
            model,
            generator,
            scope_validator,
        }
    }

    /// The model used for persistence.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The custom scope check of the model, if it has one.
    pub fn scope_validator(&self) -> Option<&dyn ScopeValidator> {
        self.scope_validator.as_deref()
    }

    /// Generate an access token.
    pub async fn generate_access_token(&self, request: &Request) -> Result<String, OAuthError> {
        Ok(self.generator.generate_access_token(request).await?)
    }

    /// Generate a refresh token.
    pub async fn generate_refresh_token(&self, request: &Request) -> Result<String, OAuthError> {
        Ok(self.generator.generate_refresh_token(request).await?)
    }

    /// Expiry of an access token issued now.
    pub fn access_token_expires_at(&self) -> Option<Time> {
        expires_at(Utc::now(), self.access_token_lifetime)
    }

    /// Expiry of a refresh token issued now.
    pub fn refresh_token_expires_at(&self) -> Option<Time> {
        expires_at(Utc::now(), self.refresh_token_lifetime)
    }

    /// The `scope` of the request body.
    ///
    /// An omitted scope is valid. A malformed one, including an empty value, is an
    /// `invalid_argument`.
    pub fn scope(&self, request: &Request) -> Result<Option<String>, OAuthError> {
        let invalid = || OAuthError::invalid_argument("Invalid parameter: `scope`");
        match request.body.get("scope") {
            Param::Absent if request.body.contains_key("scope") => Err(invalid()),
            scope => scope
                .optional(validator::nqschar)
                .map(|scope| scope.map(str::to_string))
                .map_err(|()| invalid()),
        }
    }

    /// Reject clients that were not registered for the grant type.
    pub fn ensure_grant(&self, client: &Client, grant: &str) -> Result<(), OAuthError> {
        if client.allows(grant) {
            Ok(())
        } else {
            Err(OAuthError::unauthorized_client(
                "Unauthorized client: `grant_type` is invalid",
            ))
        }
    }
}

/// Expiry of a credential issued at `issued_at`.
///
/// A lifetime of `None` never expires. Lifetimes beyond the representable range are treated
/// likewise.
pub fn expires_at(issued_at: Time, lifetime: Option<u64>) -> Option<Time> {
    let seconds = i64::try_from(lifetime?).ok()?;
    issued_at.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// Read a required body parameter that must satisfy a grammar.
pub(crate) fn required<'r>(
    request: &'r Request, key: &'static str, predicate: fn(&str) -> bool,
) -> Result<&'r str, OAuthError> {
    match request.body.get(key) {
        Param::Absent => Err(OAuthError::invalid_request(format!(
            "Missing parameter: `{}`",
            key
        ))),
        Param::Unique(value) if predicate(value) => Ok(value),
        _ => Err(OAuthError::invalid_request(format!(
            "Invalid parameter: `{}`",
            key
        ))),
    }
}
