use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub session_ttl_days: u64,
    pub otp_ttl_minutes: u64,
    pub email_domain: String,
    pub cleanup_interval_secs: u64,
    pub order_retention_hours: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("CANTEEN_PORT", "5001"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            session_ttl_days: try_load("SESSION_TTL_DAYS", "30"),
            otp_ttl_minutes: try_load("OTP_TTL_MINUTES", "10"),
            email_domain: try_load("EMAIL_DOMAIN", "rishihood.edu.in"),
            cleanup_interval_secs: try_load("CLEANUP_INTERVAL_SECS", "3600"),
            order_retention_hours: try_load("ORDER_RETENTION_HOURS", "24"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
