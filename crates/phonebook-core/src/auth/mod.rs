//! Authentication Module
//!
//! Issues and verifies bearer tokens and resolves the user behind an
//! `Authorization` header. Tokens are HS256 JWTs carrying `{username, id}`.
//! They have no expiry and are never stored, so there is nothing to revoke.

pub mod policy;

pub use policy::{CredentialPolicy, SharedSecretPolicy};

use crate::error::{Error, Result};
use crate::models::{User, UserId};
use crate::store::PhonebookStore;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity encoded in a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub username: String,
    pub id: String,
}

/// Signed credential returned by login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
}

/// Token part of a bearer `Authorization` header. The scheme is matched
/// case-insensitively.
pub fn bearer_token(header: &str) -> Option<&str> {
    let scheme = header.get(..7)?;
    if scheme.eq_ignore_ascii_case("bearer ") {
        header.get(7..)
    } else {
        None
    }
}

/// Auth manager handles token issue/verification and login
pub struct AuthManager {
    store: Arc<dyn PhonebookStore>,
    policy: Arc<dyn CredentialPolicy>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthManager {
    pub fn new(
        store: Arc<dyn PhonebookStore>,
        secret: &SecretString,
        policy: Arc<dyn CredentialPolicy>,
    ) -> Self {
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            store,
            policy,
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            validation,
        }
    }

    /// Signs `{username, id}` for the user. Same user, same token.
    pub fn issue_token(&self, user: &User) -> Result<Token> {
        let claims = TokenClaims {
            username: user.username.clone(),
            id: user.id.to_string(),
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(Token { value })
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("[Auth] Token rejected: {}", e);
                Error::Authentication("invalid token".to_string())
            })
    }

    /// User behind an `Authorization` header, with friends resolved.
    ///
    /// No header or a non-bearer scheme is anonymous (`Ok(None)`). A bearer
    /// token that fails verification is an error, not anonymous.
    pub async fn resolve_current_user(&self, auth_header: Option<&str>) -> Result<Option<User>> {
        let Some(token) = auth_header.and_then(bearer_token) else {
            return Ok(None);
        };

        let claims = self.verify_token(token)?;
        let id: UserId = claims
            .id
            .parse()
            .map_err(|_| Error::Authentication("invalid token".to_string()))?;

        let user = self.store.find_user_by_id(id, true).await?;
        if user.is_none() {
            warn!("[Auth] Token for unknown user {}", claims.username);
        }
        Ok(user)
    }

    /// Checks credentials and issues a token. Unknown user and rejected
    /// password fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<Token> {
        let user = self.store.find_user_by_username(username).await?;

        let Some(user) = user.filter(|u| self.policy.verify(u, password)) else {
            warn!("[Auth] Failed login attempt for {}", username);
            return Err(Error::wrong_credentials());
        };

        let token = self.issue_token(&user)?;
        info!("[Auth] User logged in: {}", user.username);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager(store: Arc<MemoryStore>, secret: &str) -> AuthManager {
        AuthManager::new(
            store,
            &SecretString::from(secret.to_string()),
            Arc::new(SharedSecretPolicy::default()),
        )
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bear"), None);
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let store = Arc::new(MemoryStore::new());
        let user = store.create_user("alice").await.unwrap();
        let auth = manager(store, "jwt-test-secret");

        let token = auth.issue_token(&user).unwrap();
        assert_eq!(token, auth.issue_token(&user).unwrap());

        let claims = auth.verify_token(&token.value).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.id, user.id.to_string());
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let store = Arc::new(MemoryStore::new());
        let user = store.create_user("alice").await.unwrap();
        let ours = manager(store.clone(), "jwt-test-secret");
        let theirs = manager(store, "some-other-secret");

        let token = theirs.issue_token(&user).unwrap();
        let err = ours.verify_token(&token.value).unwrap_err();
        assert!(err.is_authentication());
        assert!(ours.verify_token("not.a.jwt").unwrap_err().is_authentication());
    }

    #[tokio::test]
    async fn test_resolve_current_user() {
        let store = Arc::new(MemoryStore::new());
        let user = store.create_user("alice").await.unwrap();
        let auth = manager(store, "jwt-test-secret");
        let token = auth.issue_token(&user).unwrap();

        assert_eq!(auth.resolve_current_user(None).await.unwrap(), None);
        assert_eq!(
            auth.resolve_current_user(Some("Basic abc")).await.unwrap(),
            None
        );

        let header = format!("bearer {}", token.value);
        let current = auth
            .resolve_current_user(Some(&header))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.id, user.id);
        assert!(matches!(current.friends, crate::models::Friends::Resolved(_)));

        let err = auth
            .resolve_current_user(Some("Bearer garbage"))
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_login_errors_are_indistinguishable() {
        let store = Arc::new(MemoryStore::new());
        store.create_user("alice").await.unwrap();
        let auth = manager(store, "jwt-test-secret");

        let token = auth.login("alice", "secret").await.unwrap();
        assert_eq!(auth.verify_token(&token.value).unwrap().username, "alice");

        let wrong_password = auth.login("alice", "wrong").await.unwrap_err();
        let unknown_user = auth.login("nonexistent", "secret").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), "wrong credentials");
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }
}
