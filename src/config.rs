use std::{env, fmt::Display, str::FromStr};

use crate::error::TypeError;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, TypeError> {
        Ok(Self {
            port: try_load("PORT", "8000")?,
            database_url: require("DATABASE_URL")?,
            database_max_connections: try_load("DATABASE_MAX_CONNECTIONS", "5")?,
            jwt_secret: require("JWT_SECRET")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn require(key: &str) -> Result<String, TypeError> {
    var(key).ok_or_else(|| {
        log::error!("Environment variable {key} not found");
        TypeError::new(&format!("Missing environment variable {key}"))
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, TypeError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            log::warn!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e| {
            log::error!("Invalid {key} value: {e}");
            TypeError::new(&format!("Invalid value for {key}"))
        })
}
