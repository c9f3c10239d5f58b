//! JWT-backed credential service over the user store.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::{Credentials, Identity};
use crate::error::ChatError;
use crate::store::{ChatStore, NewUser};

/// Claims embedded in the login token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    username: String,
    email: String,
    /// Expiration (unix timestamp).
    exp: i64,
}

pub struct JwtCredentials {
    store: Arc<dyn ChatStore>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtCredentials {
    pub fn new(store: Arc<dyn ChatStore>, secret: &str, ttl_hours: i64) -> Self {
        Self {
            store,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    fn mint_token(&self, username: &str, email: &str) -> Result<String, ChatError> {
        let claims = Claims {
            username: username.to_string(),
            email: email.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| ChatError::Persistence(format!("token encode failed: {err}")))
    }
}

#[async_trait]
impl Credentials for JwtCredentials {
    async fn signin(&self, username: &str, password: &str) -> Result<String, ChatError> {
        let user = self
            .store
            .find_user(username)
            .await?
            .ok_or(ChatError::InvalidCredentials)?;

        if !verify_password(password, &user.password_digest) {
            return Err(ChatError::InvalidCredentials);
        }

        self.store.set_user_online(username, true).await?;
        self.mint_token(&user.username, &user.email)
    }

    async fn signup(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<String, ChatError> {
        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_digest: hash_password(password),
            })
            .await?;

        self.mint_token(&user.username, &user.email)
    }

    async fn verify_token(&self, token: &str) -> Result<Identity, ChatError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|_| ChatError::InvalidToken)?;

        Ok(Identity {
            username: data.claims.username,
            email: data.claims.email,
        })
    }
}

/// Salted SHA-256 digest, stored as `<salt_b64>$<hash_b64>`.
fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);

    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let hash = hasher.finalize();

    format!(
        "{}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(hash)
    )
}

fn verify_password(password: &str, digest: &str) -> bool {
    let Some((salt_b64, hash_b64)) = digest.split_once('$') else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_b64) else {
        return false;
    };

    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(password.as_bytes());
    let hash = hasher.finalize();

    URL_SAFE_NO_PAD.encode(hash) == hash_b64
}
