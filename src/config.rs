//! Lifetimes and switches shared by the grant and response types.
//!
//! A `Config` can be deserialized from any serde format, omitted fields take their defaults.
//! Lifetimes are given in seconds, a `null` lifetime stands for tokens that never expire.
use serde_derive::Deserialize;

use crate::grant_types::GrantOptions;
use crate::handlers::AuthorizeOptions;

/// One hour.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: u64 = 60 * 60;

/// Two weeks.
pub const DEFAULT_REFRESH_TOKEN_LIFETIME: u64 = 60 * 60 * 24 * 14;

/// Five minutes.
pub const DEFAULT_AUTHORIZATION_CODE_LIFETIME: u64 = 5 * 60;

/// Server wide settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Lifetime of access tokens, `None` if they never expire.
    pub access_token_lifetime: Option<u64>,

    /// Lifetime of refresh tokens, `None` if they never expire.
    pub refresh_token_lifetime: Option<u64>,

    /// Lifetime of authorization codes.
    pub authorization_code_lifetime: u64,

    /// Accept authorization requests without a `state` parameter.
    pub allow_empty_state: bool,
}

impl Config {
    /// Options for constructing grant types.
    pub fn grant_options(&self) -> GrantOptions {
        GrantOptions {
            access_token_lifetime: self.access_token_lifetime,
            refresh_token_lifetime: self.refresh_token_lifetime,
        }
    }

    /// Options for constructing the authorization endpoint.
    pub fn authorize_options(&self) -> AuthorizeOptions {
        AuthorizeOptions {
            allow_empty_state: self.allow_empty_state,
            authorization_code_lifetime: self.authorization_code_lifetime,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            access_token_lifetime: Some(DEFAULT_ACCESS_TOKEN_LIFETIME),
            refresh_token_lifetime: Some(DEFAULT_REFRESH_TOKEN_LIFETIME),
            authorization_code_lifetime: DEFAULT_AUTHORIZATION_CODE_LIFETIME,
            allow_empty_state: false,
        }
    }
}
