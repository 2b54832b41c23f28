use std::{fmt::Display, str::FromStr};

use tracing::{info, warn, Level};

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_AI_URL: &str = "http://localhost:5000";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_STORE_PATH: &str = "trainer-store.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub ai_base_url: String,
    pub log_level: Level,
    pub store_path: String,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(var)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_base_url: trim_url(try_load(&lookup, "TRAINER_API_URL", DEFAULT_API_URL)),
            ai_base_url: trim_url(try_load(&lookup, "TRAINER_AI_URL", DEFAULT_AI_URL)),
            log_level: try_load(&lookup, "TRAINER_LOG", DEFAULT_LOG_LEVEL),
            store_path: try_load(&lookup, "TRAINER_STORE", DEFAULT_STORE_PATH),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

// The browser has no process environment, so wasm builds bake values in at compile time.
#[cfg(target_arch = "wasm32")]
fn var(key: &str) -> Option<String> {
    let value = match key {
        "TRAINER_API_URL" => option_env!("TRAINER_API_URL"),
        "TRAINER_AI_URL" => option_env!("TRAINER_AI_URL"),
        "TRAINER_LOG" => option_env!("TRAINER_LOG"),
        "TRAINER_STORE" => option_env!("TRAINER_STORE"),
        _ => None,
    };
    value.map(str::to_string)
}

#[cfg(not(target_arch = "wasm32"))]
fn var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default.parse()
    })
    .unwrap_or_else(|_| unreachable!("default for {key} must parse"))
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
