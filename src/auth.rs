//! Connection authentication.
//!
//! The gateway only ever sees the [`AuthVerifier`] contract: a bearer
//! token goes in, a player id comes out. The bundled implementation is a
//! static token table, enough for the demo binary and tests; a real
//! deployment would verify signed tokens behind the same trait.

use crate::errors::AuthError;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait AuthVerifier: Send + Sync {
    /// Resolve a bearer token to a player id.
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

/// Token table verifier.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, player_id: &str) -> Self {
        self.tokens.insert(token.to_string(), player_id.to_string());
        self
    }
}

#[async_trait]
impl AuthVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
