//! Credential collaborator contract.

pub mod jwt;

use async_trait::async_trait;

use crate::error::ChatError;

/// The identity claim extracted from a verified credential.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub email: String,
}

/// Password login, account creation, and token verification for the
/// reconnect-by-token flow.
#[async_trait]
pub trait Credentials: Send + Sync {
    /// Verify a password and mint a login token. Marks the user online.
    async fn signin(&self, username: &str, password: &str) -> Result<String, ChatError>;
    /// Create an account and mint a login token. The new user starts
    /// out online.
    async fn signup(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<String, ChatError>;
    /// Validate a bearer token and extract the identity claim.
    async fn verify_token(&self, token: &str) -> Result<Identity, ChatError>;
}
