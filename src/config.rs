use std::env;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: String,
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_image_model: String,
    pub gemini_api_base: String,
    pub gemini_request_timeout_seconds: u64,
    pub image_output_mime_type: String,
    pub image_aspect_ratio: String,
    pub default_temperature: f64,
    pub persist_queue_capacity: usize,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_database_url(value: String) -> String {
    if value.starts_with("sqlite+aiosqlite://") {
        return value.replacen("sqlite+aiosqlite://", "sqlite://", 1);
    }
    value
}

fn normalize_api_base(value: String) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "https://generativelanguage.googleapis.com/v1beta".to_string();
    }
    trimmed.to_string()
}

fn normalize_temperature(value: f64) -> f64 {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        return value;
    }
    warn!(
        "DEFAULT_TEMPERATURE {} is outside [0, 1]; using 0.5 instead.",
        value
    );
    0.5
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info"),
            log_dir: env_string("LOG_DIR", "logs"),
            database_url: normalize_database_url(env_string(
                "DATABASE_URL",
                "sqlite://aesthetic_explorer.db",
            )),
            gemini_api_key: env_string("GEMINI_API_KEY", "").trim().to_string(),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "imagen-4.0-generate-001"),
            gemini_api_base: normalize_api_base(env_string(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
            )),
            gemini_request_timeout_seconds: env_u64("GEMINI_REQUEST_TIMEOUT_SECONDS", 90).max(1),
            image_output_mime_type: env_string("IMAGE_OUTPUT_MIME_TYPE", "image/jpeg"),
            image_aspect_ratio: env_string("IMAGE_ASPECT_RATIO", "1:1"),
            default_temperature: normalize_temperature(env_f64("DEFAULT_TEMPERATURE", 0.5)),
            persist_queue_capacity: env_usize("PERSIST_QUEUE_CAPACITY", 256).max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_aiosqlite_scheme() {
        assert_eq!(
            normalize_database_url("sqlite+aiosqlite://data.db".to_string()),
            "sqlite://data.db"
        );
        assert_eq!(
            normalize_database_url("sqlite::memory:".to_string()),
            "sqlite::memory:"
        );
    }

    #[test]
    fn strips_trailing_slash_from_api_base() {
        assert_eq!(
            normalize_api_base("https://example.test/v1beta/".to_string()),
            "https://example.test/v1beta"
        );
        assert_eq!(
            normalize_api_base("   ".to_string()),
            "https://generativelanguage.googleapis.com/v1beta"
        );
    }

    #[test]
    fn out_of_range_default_temperature_falls_back() {
        assert_eq!(normalize_temperature(0.7), 0.7);
        assert_eq!(normalize_temperature(1.5), 0.5);
        assert_eq!(normalize_temperature(f64::NAN), 0.5);
    }
}
