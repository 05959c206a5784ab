// src/config.rs

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 100;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings resolved once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// `None` leaves the cap to the upstream default.
    pub max_output_tokens: Option<u32>,
    pub temperature: f32,
    pub base_url: String,
    pub timeout: Duration,
    pub enable_cors: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: Some(DEFAULT_MAX_OUTPUT_TOKENS),
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            enable_cors: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source; unset or blank values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string());
        let mut cfg = Self::default();

        cfg.api_key = get("GEMINI_API_KEY").filter(|v| !v.is_empty());

        if let Some(model) = get("GEMINI_MODEL").filter(|v| !v.is_empty()) {
            cfg.model = model;
        }

        if let Some(raw) = get("GEMINI_MAX_OUTPUT_TOKENS") {
            cfg.max_output_tokens = match raw.to_ascii_lowercase().as_str() {
                "" | "none" | "unset" => None,
                _ => Some(parse("GEMINI_MAX_OUTPUT_TOKENS", &raw)?),
            };
        }

        if let Some(raw) = get("GEMINI_TEMPERATURE").filter(|v| !v.is_empty()) {
            cfg.temperature = parse("GEMINI_TEMPERATURE", &raw)?;
        }

        if let Some(url) = get("GEMINI_BASE_URL").filter(|v| !v.is_empty()) {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = get("UPSTREAM_TIMEOUT_SECS").filter(|v| !v.is_empty()) {
            let secs: u64 = parse("UPSTREAM_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    var: "UPSTREAM_TIMEOUT_SECS",
                    value: raw,
                    reason: "must be greater than zero".into(),
                });
            }
            cfg.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = get("ENABLE_CORS").filter(|v| !v.is_empty()) {
            cfg.enable_cors = parse_bool("ENABLE_CORS", &raw)?;
        }

        if let Some(host) = get("HOST").filter(|v| !v.is_empty()) {
            cfg.host = host;
        }

        if let Some(raw) = get("PORT").filter(|v| !v.is_empty()) {
            cfg.port = parse("PORT", &raw)?;
        }

        Ok(cfg)
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = from_pairs(&[]).unwrap();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.model, "gemini-flash-latest");
        assert_eq!(cfg.max_output_tokens, Some(100));
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert!(cfg.enable_cors);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = from_pairs(&[("GEMINI_API_KEY", "   ")]).unwrap();
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn legacy_variant_is_expressible() {
        let cfg = from_pairs(&[
            ("GEMINI_API_KEY", "KEY"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("GEMINI_MAX_OUTPUT_TOKENS", "none"),
            ("ENABLE_CORS", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("KEY"));
        assert_eq!(cfg.model, "gemini-1.5-flash");
        assert_eq!(cfg.max_output_tokens, None);
        assert!(!cfg.enable_cors);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let cfg = from_pairs(&[("GEMINI_BASE_URL", "http://localhost:9000/")]).unwrap();
        assert_eq!(cfg.base_url, "http://localhost:9000");
    }

    #[test]
    fn unparseable_values_name_the_variable() {
        let err = from_pairs(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = from_pairs(&[("ENABLE_CORS", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("ENABLE_CORS"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = from_pairs(&[("UPSTREAM_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }
}
