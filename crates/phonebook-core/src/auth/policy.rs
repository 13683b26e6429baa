use crate::models::User;
use secrecy::{ExposeSecret, SecretString};

/// Decides whether a login password is accepted for a user
pub trait CredentialPolicy: Send + Sync {
    fn verify(&self, user: &User, password: &str) -> bool;
}

/// Every user shares one configured password.
///
/// No per-user hash is stored. Not suitable outside demo deployments.
pub struct SharedSecretPolicy {
    secret: SecretString,
}

impl SharedSecretPolicy {
    pub const DEFAULT_SECRET: &'static str = "secret";

    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }
}

impl Default for SharedSecretPolicy {
    fn default() -> Self {
        Self::new(SecretString::from(Self::DEFAULT_SECRET.to_string()))
    }
}

impl CredentialPolicy for SharedSecretPolicy {
    fn verify(&self, _user: &User, password: &str) -> bool {
        self.secret.expose_secret() == password
    }
}
