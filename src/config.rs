//! API server configuration from environment variables

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RASTER_MB: usize = 100;

/// Settings of the overlay API server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen address (`FIREMAP_BIND_ADDR`)
    pub bind_addr: SocketAddr,
    /// Forecast server the `url` query parameter is resolved against
    /// (`PYRECAST_BASE_URL`). Required by the server binary.
    pub forecast_base_url: String,
    /// Raster download timeout (`FIREMAP_FETCH_TIMEOUT_SECS`)
    pub fetch_timeout: Duration,
    /// Largest raster downloaded, in bytes (`FIREMAP_MAX_RASTER_MB`)
    pub max_raster_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            forecast_base_url: String::new(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_raster_bytes: DEFAULT_MAX_RASTER_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup. Unset or
    /// unparsable variables fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = parse_var(&lookup, "FIREMAP_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let forecast_base_url = lookup("PYRECAST_BASE_URL")
            .map(|url| url.trim().to_string())
            .unwrap_or_default();
        let fetch_timeout = parse_var::<u64, _>(&lookup, "FIREMAP_FETCH_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);
        let max_raster_bytes = parse_var::<usize, _>(&lookup, "FIREMAP_MAX_RASTER_MB")
            .map(|mb| mb.saturating_mul(1024 * 1024))
            .unwrap_or(defaults.max_raster_bytes);

        Self {
            bind_addr,
            forecast_base_url,
            fetch_timeout,
            max_raster_bytes,
        }
    }

    /// Resolves the `url` query parameter against the forecast base URL.
    ///
    /// Returns `None` when no base URL is configured or when `path` would
    /// leave the forecast server: absolute and scheme-relative URLs, or any
    /// path resolving to another scheme, host or port.
    pub fn forecast_url(&self, path: &str) -> Option<String> {
        let base = Url::parse(self.forecast_base_url.trim()).ok()?;
        let path = path.trim();
        if path.contains("://") || path.starts_with("//") || path.contains('\\') {
            return None;
        }

        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let url = Url::parse(&joined).ok()?;
        let same_origin = url.scheme() == base.scheme()
            && url.host_str() == base.host_str()
            && url.port_or_known_default() == base.port_or_known_default();
        same_origin.then(|| url.to_string())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}
