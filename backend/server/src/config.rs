use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use store::Backend;
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub redis_url: String,
    pub sqlite_path: String,
    pub meili_url: Option<String>,
    pub meili_key: Option<String>,
    pub auth_secret: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "9000"),
            backend: try_load("STORE_BACKEND", "sqlite"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            sqlite_path: try_load("SQLITE_PATH", "workshop.db"),
            meili_url: var("MEILI_URL").ok(),
            meili_key: load_secret("MEILI_ADMIN_KEY"),
            auth_secret: load_secret("ACCESS_TOKEN_SECRET").unwrap_or_else(|| {
                warn!("ACCESS_TOKEN_SECRET not set, tokens are signed with a development secret");
                "workshop-dev-secret".to_string()
            }),
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

/// A secret may come from the environment directly or from a mounted
/// `/run/secrets` file; absence is fine, callers decide what to do.
fn load_secret(secret_name: &str) -> Option<String> {
    if let Ok(value) = env::var(secret_name) {
        return Some(value);
    }
    let path = format!("/run/secrets/{secret_name}");
    read_to_string(&path).map(|s| s.trim().to_string()).ok()
}
