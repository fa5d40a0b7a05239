use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by every bearer token this service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    access_token: String,
    expires_in: u64,
}

impl IssuedToken {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub const fn expires_in(&self) -> u64 {
        self.expires_in
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Other(anyhow::Error),
}

/// Checks the configured account's password and signs HS256 tokens.
pub struct Authenticator {
    username: String,
    password_hash: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl Authenticator {
    /// `password_hash` is an argon2 PHC string.
    pub fn new(
        secret: &str,
        username: &str,
        password_hash: &str,
        ttl_secs: u64,
    ) -> anyhow::Result<Self> {
        PasswordHash::new(password_hash)
            .map_err(|err| anyhow!("Password hash is not a valid PHC string: {err}"))?;

        Ok(Self {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        })
    }

    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let hash = PasswordHash::new(&self.password_hash)
            .map_err(|err| AuthError::Other(anyhow!("Stored password hash is invalid: {err}")))?;
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok();

        if username != self.username || !password_ok {
            return Err(AuthError::InvalidCredentials);
        }
        self.issue(username)
    }

    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| AuthError::Other(anyhow!(err).context("Failed to sign token")))?;
        Ok(IssuedToken {
            access_token,
            expires_in: self.ttl_secs,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("username", &self.username)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
