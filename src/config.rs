use std::env;
use std::str::FromStr;

use log::warn;
use uuid::Uuid;

use crate::auth::jwt::JwtConfig;

/// Ten years; keeps token expiry arithmetic far from overflow.
const MAX_EXPIRY_DAYS: i64 = 3650;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// | Env Var              | Default            |
/// |----------------------|--------------------|
/// | `HOST`               | `0.0.0.0`          |
/// | `PORT`               | `8080`             |
/// | `DATABASE_URL`       | unset (in-memory)  |
/// | `DB_MAX_CONNECTIONS` | `5`                |
/// | `JWT_SECRET`         | random per process |
/// | `JWT_EXPIRY_DAYS`    | `7`                |
/// | `SEED_DEMO_DATA`     | `true`             |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_demo_data: bool,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", 8080u16, "u16")?;
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let max_connections = parse_var("DB_MAX_CONNECTIONS", 5u32, "u32")?;
        let seed_demo_data = parse_var("SEED_DEMO_DATA", true, "bool")?;

        let secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("JWT_SECRET is not set; tokens will not survive a restart");
                Uuid::new_v4().to_string()
            }
        };
        let expiry_days = parse_var("JWT_EXPIRY_DAYS", 7i64, "i64")?;
        if !(1..=MAX_EXPIRY_DAYS).contains(&expiry_days) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_DAYS",
                expected: "number of days between 1 and 3650",
                value: expiry_days.to_string(),
            });
        }

        Ok(Self {
            host,
            port,
            database_url,
            max_connections,
            seed_demo_data,
            jwt: JwtConfig {
                secret,
                expiry_days,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    key: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_falls_back_to_default() {
        let value = parse_var("TMA_TEST_UNSET_VARIABLE", 42u16, "u16").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn malformed_variable_is_reported() {
        env::set_var("TMA_TEST_BAD_PORT", "eighty");
        let err = parse_var("TMA_TEST_BAD_PORT", 8080u16, "u16").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TMA_TEST_BAD_PORT must be a valid u16, got \"eighty\""
        );
        env::remove_var("TMA_TEST_BAD_PORT");
    }

    #[test]
    fn token_expiry_must_be_in_range() {
        for value in ["0", "-3", "100000000000000"] {
            env::set_var("JWT_EXPIRY_DAYS", value);
            let err = ServerConfig::from_env().unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("JWT_EXPIRY_DAYS must be a valid number of days between 1 and 3650, got {value:?}")
            );
        }

        env::set_var("JWT_EXPIRY_DAYS", "30");
        assert_eq!(ServerConfig::from_env().unwrap().jwt.expiry_days, 30);
        env::remove_var("JWT_EXPIRY_DAYS");
    }
}
