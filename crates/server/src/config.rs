//! Phonebook server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use phonebook_core::store::demo_persons;
use phonebook_core::{
    AuthManager, Clock, MemoryStore, PhonebookStore, SharedSecretPolicy, SqliteStore,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

use crate::graphql::{build_schema, PhonebookSchema};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Configuration for the phonebook server
#[derive(Debug)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// SQLite URL; `None` keeps everything in memory
    pub database_url: Option<String>,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Password every user logs in with
    pub login_password: SecretString,
    /// Seed the in-memory store with demo persons
    pub seed_demo_data: bool,
}

impl ServerConfig {
    pub const DEFAULT_PORT: u16 = 4000;

    /// In-memory defaults around the given signing secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: Self::DEFAULT_PORT,
            database_url: None,
            jwt_secret: SecretString::from(jwt_secret.into()),
            login_password: SecretString::from(SharedSecretPolicy::DEFAULT_SECRET.to_string()),
            seed_demo_data: false,
        }
    }

    /// Reads `JWT_SECRET`, `DATABASE_URL`, `BIND_ADDR`, `PORT`,
    /// `LOGIN_PASSWORD` and `SEED_DEMO_DATA`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let mut config = Self::new(jwt_secret);

        config.database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|_| ConfigError::Invalid {
                var: "BIND_ADDR",
                value: addr.clone(),
            })?;
        }

        if let Some(port) = lookup("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: port.clone(),
            })?;
        }

        if let Some(password) = lookup("LOGIN_PASSWORD") {
            config.login_password = SecretString::from(password);
        }

        if let Some(seed) = lookup("SEED_DEMO_DATA") {
            config.seed_demo_data = match seed.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SEED_DEMO_DATA",
                        value: seed,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Opens the configured store.
    ///
    /// A database that cannot be reached is logged and the store is still
    /// returned: the server keeps accepting requests and individual
    /// operations fail until the database comes back.
    pub async fn open_store(&self) -> anyhow::Result<Arc<dyn PhonebookStore>> {
        match &self.database_url {
            Some(url) => {
                let store = SqliteStore::connect_lazy(url)?;
                match store.init_schema().await {
                    Ok(()) => info!("[Store] Connected to database"),
                    Err(e) => error!("[Store] Error connecting to database: {}", e),
                }
                Ok(Arc::new(store))
            }
            None if self.seed_demo_data => {
                Ok(Arc::new(MemoryStore::with_persons(demo_persons())?))
            }
            None => {
                info!("[Store] Using empty in-memory store");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
    pub schema: PhonebookSchema,
}

impl AppState {
    pub fn new(config: &ServerConfig, store: Arc<dyn PhonebookStore>, clock: Arc<dyn Clock>) -> Self {
        let password = SecretString::from(config.login_password.expose_secret().to_string());
        let policy = Arc::new(SharedSecretPolicy::new(password));
        let auth = Arc::new(AuthManager::new(store.clone(), &config.jwt_secret, policy));
        let schema = build_schema(store, auth.clone(), clock);
        Self { auth, schema }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_secret_is_required() {
        let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cr3t")])).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.database_url, None);
        assert_eq!(config.login_password.expose_secret(), "secret");
        assert!(!config.seed_demo_data);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:4000");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cr3t"),
            ("DATABASE_URL", "sqlite://phonebook.sqlite"),
            ("BIND_ADDR", "127.0.0.1"),
            ("PORT", "8080"),
            ("LOGIN_PASSWORD", "hunter22"),
            ("SEED_DEMO_DATA", "true"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("sqlite://phonebook.sqlite"));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.login_password.expose_secret(), "hunter22");
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_bad_port_rejected() {
        let err =
            ServerConfig::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn test_secrets_not_in_debug_output() {
        let config = ServerConfig::new("very-private-value");
        assert!(!format!("{config:?}").contains("very-private-value"));
    }
}
