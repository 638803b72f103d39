use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use crate::{screens::status::StatusPolicy, upload::OrphanPolicy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Secret {0} is neither mounted nor set in the environment")]
    MissingSecret(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gateway_url: String,
    pub gateway_anon_key: String,
    pub session_cookie: String,
    pub cookie_secure: bool,
    pub status_policy: StatusPolicy,
    pub orphan_policy: OrphanPolicy,
    pub upload_buckets: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let buckets: String = try_load("UPLOAD_BUCKETS", "products")?;

        Ok(Self {
            port: try_load("RUST_PORT", "8080")?,
            gateway_url: try_load("GATEWAY_URL", "http://localhost:54321")?,
            gateway_anon_key: read_secret("GATEWAY_ANON_KEY")?,
            session_cookie: try_load("SESSION_COOKIE", "admin-session")?,
            cookie_secure: try_load("COOKIE_SECURE", "true")?,
            status_policy: try_load("STATUS_POLICY", "permissive")?,
            orphan_policy: try_load("ORPHAN_POLICY", "keep")?,
            upload_buckets: split_list(&buckets),
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", "5242880")?,
        })
    }

    pub fn allows_bucket(&self, bucket: &str) -> bool {
        self.upload_buckets.iter().any(|allowed| allowed == bucket)
    }

    #[cfg(test)]
    pub fn testing() -> Self {
        Self {
            port: 0,
            gateway_url: "http://gateway.test".to_string(),
            gateway_anon_key: "anon".to_string(),
            session_cookie: "admin-session".to_string(),
            cookie_secure: false,
            status_policy: StatusPolicy::Permissive,
            orphan_policy: OrphanPolicy::Keep,
            upload_buckets: vec!["products".to_string()],
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &'static str) -> Result<String, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .or_else(|e| {
            info!("Failed to read {secret_name} from file ({e}), trying environment");
            var(secret_name).ok_or(ConfigError::MissingSecret(secret_name))
        })
}
