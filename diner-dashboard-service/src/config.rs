use std::env;

use dotenvy::dotenv;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
}

impl Config {
    /// Reads the process environment after loading `.env`, if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        Ok(Self { database_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_is_required() {
        assert_eq!(
            Config::from_lookup(|_| None).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert!(Config::from_lookup(|_| Some(String::new())).is_err());
    }

    #[test]
    fn test_database_url_is_read() {
        let config = Config::from_lookup(|key| {
            (key == "DATABASE_URL").then(|| "postgres://localhost/diner".to_string())
        })
        .unwrap();
        assert_eq!(config.database_url, "postgres://localhost/diner");
    }
}
