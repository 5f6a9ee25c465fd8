//! # oauth2-grants
//!
//! Token and authorization code issuance for OAuth2 authorization servers, following [rfc6749].
//!
//! ## About
//!
//! This crate turns validated requests into access tokens, refresh tokens and authorization codes.
//! It decides which failures are answered directly and which are redirected back to the client,
//! computes expiries and enforces that codes and refresh tokens are used at most once. Storage is
//! left entirely to an injected [`model`], so the crate works with any database or cache and with
//! synchronous as well as asynchronous backends.
//!
//! ## Token endpoint
//!
//! The token endpoint authenticates the client with whatever scheme it chose and then hands the
//! request to a [`GrantTypes`] registry. The four grants of the rfc, `authorization_code`,
//! `client_credentials`, `password` and `refresh_token`, are registered by
//! [`GrantTypes::with_defaults`]. Custom grants identified by a uri can be added with
//! [`GrantTypes::insert`]. The issued token can be serialized with [`BearerToken`].
//!
//! ## Authorization endpoint
//!
//! The [`AuthorizeHandler`] resolves the client and the resource owner, then dispatches on the
//! `response_type`. Errors occurring before the redirect uri of the client is known are returned
//! directly. Everything afterwards is delivered by redirecting the user-agent, the handler then
//! succeeds and reports the error as the outcome.
//!
//! ## Front-ends
//!
//! No http library is assumed. A front-end translates its requests into a [`Request`] and applies
//! the resulting [`Response`], which carries status, headers and an optional body.
//!
//! [rfc6749]: https://tools.ietf.org/html/rfc6749
//! [`model`]: model/index.html
//! [`GrantTypes`]: grant_types/struct.GrantTypes.html
//! [`GrantTypes::with_defaults`]: grant_types/struct.GrantTypes.html#method.with_defaults
//! [`GrantTypes::insert`]: grant_types/struct.GrantTypes.html#method.insert
//! [`BearerToken`]: grant_types/struct.BearerToken.html
//! [`AuthorizeHandler`]: handlers/struct.AuthorizeHandler.html
//! [`Request`]: request/struct.Request.html
//! [`Response`]: request/struct.Response.html
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod grant_types;
pub mod handlers;
pub mod model;
pub mod primitives;
pub mod request;
pub mod response_types;
pub mod validator;

pub use crate::config::Config;
pub use crate::error::{ErrorKind, OAuthError};

#[cfg(test)]
mod tests;
