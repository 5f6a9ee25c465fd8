//! Principals, authorization codes and tokens.
use chrono::Utc;
use serde_derive::{Deserialize, Serialize};

use super::Time;

/// A registered client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// The `client_id` it authenticates with.
    pub id: String,

    /// Names of the grant types the client may use, e.g. `authorization_code`.
    ///
    /// An empty list counts as missing, such a client can not use the authorization endpoint.
    pub grants: Vec<String>,

    /// The registered redirect uris, the first one is the default.
    pub redirect_uris: Vec<String>,
}

impl Client {
    /// Create a client registration.
    pub fn new<I, R>(id: &str, grants: I, redirect_uris: R) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Client {
            id: id.to_string(),
            grants: grants.into_iter().map(Into::into).collect(),
            redirect_uris: redirect_uris.into_iter().map(Into::into).collect(),
        }
    }

    /// If the client may use the named grant type.
    pub fn allows(&self, grant: &str) -> bool {
        self.grants.iter().any(|allowed| allowed == grant)
    }

    /// If the redirect uri was registered for this client, compared exactly.
    pub fn has_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|registered| registered == redirect_uri)
    }
}

/// A resource owner, identified by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier.
    pub id: String,
}

impl User {
    /// Create a user with an identifier.
    pub fn new(id: &str) -> Self {
        User { id: id.to_string() }
    }
}

/// An authorization code together with the grant it stands for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The code handed to the client.
    pub authorization_code: String,

    /// After this point the code can no longer be exchanged.
    pub expires_at: Time,

    /// The redirect uri of the authorization request, the token request must repeat it.
    pub redirect_uri: Option<String>,

    /// The granted scope.
    pub scope: Option<String>,

    /// The client the code was issued to.
    pub client: Client,

    /// The resource owner who authorized the client.
    pub user: User,
}

impl AuthorizationCode {
    /// If the code is no longer valid.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// An issued access token with its optional refresh token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The bearer token.
    pub access_token: String,

    /// Expiry of the access token, `None` if it never expires.
    pub access_token_expires_at: Option<Time>,

    /// Used to obtain a new token.
    pub refresh_token: Option<String>,

    /// Expiry of the refresh token, `None` if it never expires.
    pub refresh_token_expires_at: Option<Time>,

    /// The granted scope.
    pub scope: Option<String>,

    /// Name of the grant type that issued this token.
    pub grant: String,

    /// The exchanged authorization code, for tokens of the `authorization_code` grant.
    pub authorization_code: Option<String>,

    /// The client the token was issued to.
    pub client: Client,

    /// The resource owner.
    pub user: User,
}

impl Token {
    /// If the access token is no longer valid.
    pub fn is_expired(&self) -> bool {
        self.access_token_expires_at
            .map_or(false, |expires_at| expires_at < Utc::now())
    }

    /// If the refresh token is no longer valid.
    pub fn is_refresh_expired(&self) -> bool {
        self.refresh_token_expires_at
            .map_or(false, |expires_at| expires_at < Utc::now())
    }
}
