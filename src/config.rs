//! Process configuration loaded from the environment (and `.env`).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::AppError;
use crate::teamtailor::LoggingMode;

/// Default upstream API root.
pub const DEFAULT_BASE_URL: &str = "https://api.teamtailor.com/v1";

/// Default HTTP port for the export server.
pub const DEFAULT_PORT: u16 = 3000;

/// Settings for the exporter.
///
/// `api_key` is wrapped in `SecretString` so it never shows up in `Debug`
/// output or logs.
#[derive(Clone)]
pub struct ExportConfig {
    pub api_key: SecretString,
    pub base_url: Url,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Zero disables the fetch cache.
    pub cache_ttl: Duration,
    pub log_level: String,
    /// How upstream request URLs appear in logs.
    pub log_query: LoggingMode,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url.as_str())
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("cache_ttl", &self.cache_ttl)
            .field("log_level", &self.log_level)
            .field("log_query", &self.log_query)
            .finish()
    }
}

impl ExportConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `API_KEY` is missing or empty, or when
    /// any optional variable is present but unparseable.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("API_KEY environment variable is required".into()))?;

        let base_url = match lookup("TEAMTAILOR_BASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_base_url(raw.trim())?,
            None => parse_base_url(DEFAULT_BASE_URL)?,
        };

        let bind_addr = match lookup("BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| AppError::Config(format!("BIND_ADDR is not an IP address: {}", raw)))?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port = parse_number("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let cache_ttl = Duration::from_secs(parse_number("CACHE_TTL_SECS", lookup("CACHE_TTL_SECS"), 0u64)?);

        let log_level = lookup("LOG_LEVEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        let log_query = parse_logging_mode(lookup("LOG_QUERY"))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            base_url,
            bind_addr,
            port,
            cache_ttl,
            log_level,
            log_query,
        })
    }

    /// Address the export server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn cache_enabled(&self) -> bool {
        !self.cache_ttl.is_zero()
    }
}

/// Parses the base URL, ensuring a trailing slash so `join` appends
/// resource paths instead of replacing the last segment.
fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    let url = Url::parse(&normalized)
        .map_err(|e| AppError::Config(format!("TEAMTAILOR_BASE_URL is invalid: {}", e)))?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config("TEAMTAILOR_BASE_URL cannot be a base URL".into()));
    }
    Ok(url)
}

/// `LOG_QUERY`: `path` (default) logs only the request path, `redacted` adds
/// the query string with sensitive values masked.
fn parse_logging_mode(raw: Option<String>) -> Result<LoggingMode, AppError> {
    match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(LoggingMode::PathOnly),
        Some(v) if v.eq_ignore_ascii_case("path") => Ok(LoggingMode::PathOnly),
        Some(v) if v.eq_ignore_ascii_case("redacted") => Ok(LoggingMode::PathAndQueryRedacted),
        Some(v) => Err(AppError::Config(format!(
            "LOG_QUERY must be \"path\" or \"redacted\", got {:?}",
            v
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw.filter(|v| !v.trim().is_empty()) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{} must be a non-negative integer, got {:?}", key, v))),
        None => Ok(default),
    }
}
