//! Generators produce access tokens, refresh tokens and authorization codes.
//!
//! Tokens are opaque, their security relies purely on the entropy of the generator. A model can
//! replace any of them through [`Model::generator`], methods it leaves alone fall back to
//! [`RandomGenerator`].
//!
//! [`Model::generator`]: ../../model/trait.Model.html#method.generator
use async_trait::async_trait;
use base64::encode;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{ErrorKind, OAuthError};
use crate::model::ModelError;
use crate::request::Request;

/// Overrides for the generation of tokens and codes.
#[async_trait]
pub trait TokenGenerator: Send + Sync {
    /// Produce an access token.
    async fn generate_access_token(&self, _request: &Request) -> Result<String, ModelError> {
        Ok(RandomGenerator::default().generate()?)
    }

    /// Produce a refresh token.
    async fn generate_refresh_token(&self, _request: &Request) -> Result<String, ModelError> {
        Ok(RandomGenerator::default().generate()?)
    }

    /// Produce an authorization code.
    async fn generate_authorization_code(&self, _request: &Request) -> Result<String, ModelError> {
        Ok(RandomGenerator::default().generate()?)
    }
}

/// Generates tokens from random bytes.
///
/// Each byte is chosen by the system random number generator, the token is their base64
/// encoding.
pub struct RandomGenerator {
    random: SystemRandom,
    len: usize,
}

impl RandomGenerator {
    /// Generates tokens with a specific byte length.
    pub fn new(length: usize) -> RandomGenerator {
        RandomGenerator {
            random: SystemRandom::new(),
            len: length,
        }
    }

    /// Produce a new token.
    pub fn generate(&self) -> Result<String, OAuthError> {
        let mut bytes = vec![0; self.len];
        self.random
            .fill(bytes.as_mut_slice())
            .map_err(|_| {
                OAuthError::new(ErrorKind::ServerError, "Failed to generate random token")
            })?;

        Ok(encode(&bytes))
    }
}

impl Default for RandomGenerator {
    /// 32 bytes, 44 base64 characters.
    fn default() -> Self {
        RandomGenerator::new(32)
    }
}

#[async_trait]
impl TokenGenerator for RandomGenerator {
    async fn generate_access_token(&self, _: &Request) -> Result<String, ModelError> {
        Ok(self.generate()?)
    }

    async fn generate_refresh_token(&self, _: &Request) -> Result<String, ModelError> {
        Ok(self.generate()?)
    }

    async fn generate_authorization_code(&self, _: &Request) -> Result<String, ModelError> {
        Ok(self.generate()?)
    }
}
