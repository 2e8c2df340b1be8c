use dotenv::dotenv;
use std::env;
use std::str::FromStr;

use crate::errors::{ErrorKind, Result};

const DEFAULT_DATABASE_URL: &str = "articles.db";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_SLUG_RETRY_LIMIT: u32 = 5;

/// Settings read once at startup and kept in rocket managed state.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
    pub jwt_secret: String,
    pub slug_retry_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        dotenv().ok();
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            Ok(_) | Err(env::VarError::NotPresent) => {
                return Err(ErrorKind::MissingSetting("JWT_SECRET").into())
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            pool_size: parse_or("DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?,
            jwt_secret,
            slug_retry_limit: parse_or("SLUG_RETRY_LIMIT", DEFAULT_SLUG_RETRY_LIMIT)?,
        })
    }

    /// A single-connection in-memory database, used by tests.
    pub fn in_memory(jwt_secret: &str) -> Config {
        Config {
            database_url: ":memory:".to_string(),
            pool_size: 1,
            jwt_secret: jwt_secret.to_string(),
            slug_retry_limit: DEFAULT_SLUG_RETRY_LIMIT,
        }
    }
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr<Err = ::std::num::ParseIntError>,
{
    match env::var(name) {
        Ok(raw) => Ok(raw.trim().parse::<T>()?),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(e.into()),
    }
}
