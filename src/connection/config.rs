use crate::core::{DbError, Result};
use std::fmt;

/// PostgreSQL port. Not configurable.
pub const POSTGRES_PORT: u16 = 5432;

pub const HOST_VAR: &str = "POSTGRES_HOST";
pub const DATABASE_VAR: &str = "POSTGRES_DB";
pub const USER_VAR: &str = "POSTGRES_USER";
pub const PASSWORD_VAR: &str = "POSTGRES_PASSWORD";

/// Credentials and location of the backing store.
///
/// Built explicitly and handed to a connector; nothing below this type
/// reads the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database host
    pub host: String,

    /// Database name
    pub database: String,

    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,
}

impl ConnectionConfig {
    /// Create a configuration for `localhost` with the given credentials
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            host: "localhost".to_string(),
            database: "postgres".to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Set the database name
    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_string();
        self
    }

    /// Set the host
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(&self) -> u16 {
        POSTGRES_PORT
    }

    /// Read `POSTGRES_HOST`, `POSTGRES_DB`, `POSTGRES_USER` and
    /// `POSTGRES_PASSWORD`, after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key).ok_or_else(|| DbError::Config(format!("{} is not set", key)))
        };

        let config = Self {
            host: require(HOST_VAR)?,
            database: require(DATABASE_VAR)?,
            username: require(USER_VAR)?,
            password: require(PASSWORD_VAR)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Convert to a connection string, password masked
    pub fn to_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, "***", self.host, POSTGRES_PORT, self.database
        )
    }

    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(POSTGRES_PORT)
            .dbname(&self.database)
            .user(&self.username)
            .password(&self.password)
            .application_name("plantdb");
        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(DbError::Config("host cannot be empty".to_string()));
        }

        if self.database.is_empty() {
            return Err(DbError::Config("database cannot be empty".to_string()));
        }

        if self.username.is_empty() {
            return Err(DbError::Config("username cannot be empty".to_string()));
        }

        Ok(())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &POSTGRES_PORT)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builder_pattern() {
        let config = ConnectionConfig::new("user", "pass")
            .host("db.example.com")
            .database("plants");

        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.database, "plants");
        assert_eq!(config.port(), 5432);
    }

    #[test]
    fn test_from_lookup() {
        let vars = env(&[
            (HOST_VAR, "postgres"),
            (DATABASE_VAR, "powerplant_db"),
            (USER_VAR, "alice"),
            (PASSWORD_VAR, "secret"),
        ]);

        let config = ConnectionConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.host, "postgres");
        assert_eq!(config.database, "powerplant_db");
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn test_from_lookup_missing_variable() {
        let vars = env(&[(HOST_VAR, "postgres"), (USER_VAR, "alice")]);

        let err = ConnectionConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, DbError::Config(msg) if msg.contains(DATABASE_VAR)));
    }

    #[test]
    fn test_validate() {
        assert!(ConnectionConfig::new("user", "pass").validate().is_ok());
        assert!(ConnectionConfig::new("", "pass").validate().is_err());
        assert!(ConnectionConfig::new("user", "pass").host("").validate().is_err());
    }

    #[test]
    fn test_password_never_printed() {
        let config = ConnectionConfig::new("alice", "secret123").database("plants");

        assert!(!config.to_url().contains("secret123"));
        assert!(config.to_url().contains("***"));
        assert!(!format!("{:?}", config).contains("secret123"));
    }
}
