use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::{env, str::FromStr};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_expiry_hours: parse_or(&lookup, "JWT_EXPIRY_HOURS", 24)?,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults_for_optional_keys() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/payroll"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.server_addr(), "127.0.0.1:3000");
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.jwt_expiry_hours, 24);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/payroll"),
            ("JWT_SECRET", "secret"),
            ("SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}
