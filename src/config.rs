use std::time::Duration;

/// Redis always listens on its conventional port.
pub const REDIS_PORT: u16 = 6379;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    /// Process-local store. Contents are lost on exit; for local development.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_host: String,
    pub redis_password: Option<String>,
    pub store_backend: StoreBackend,
    /// Directory the admin UI is served from.
    pub assets_dir: String,
    /// Upper bound on every single store call.
    pub store_timeout: Duration,
    /// Upper bound on a whole HTTP request.
    pub request_timeout: Duration,
}

impl Config {
    /// Connection URL for the configured Redis host.
    pub fn redis_url(&self) -> String {
        match self.redis_password.as_deref() {
            Some(password) => format!(
                "redis://:{}@{}:{}/0",
                urlencoding::encode(password),
                self.redis_host,
                REDIS_PORT
            ),
            None => format!("redis://{}:{}/0", self.redis_host, REDIS_PORT),
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_vars(|name| std::env::var(name).ok())
}

/// Build the config from a variable lookup. Split out from `load` so tests
/// don't have to mutate the process environment.
pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    let store_backend = match var("EDL_ADMIN_STORE").as_deref().map(str::trim) {
        None | Some("") | Some("redis") => StoreBackend::Redis,
        Some("memory") => StoreBackend::Memory,
        Some(other) => anyhow::bail!(
            "invalid EDL_ADMIN_STORE: {}. Must be 'redis' or 'memory'",
            other
        ),
    };

    let store_timeout_ms: u64 = var("EDL_ADMIN_STORE_TIMEOUT_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(2000);
    let request_timeout_secs: u64 = var("EDL_ADMIN_REQUEST_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    if store_timeout_ms == 0 || request_timeout_secs == 0 {
        anyhow::bail!("store and request timeouts must be greater than zero");
    }

    Ok(Config {
        port: var("EDL_ADMIN_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(80),
        redis_host: var("REDIS_HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "127.0.0.1".into()),
        redis_password: var("REDIS_PASSWORD").filter(|p| !p.is_empty()),
        store_backend,
        assets_dir: var("EDL_ADMIN_ASSETS_DIR").unwrap_or_else(|| "./assets".into()),
        store_timeout: Duration::from_millis(store_timeout_ms),
        request_timeout: Duration::from_secs(request_timeout_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.port, 80);
        assert_eq!(cfg.redis_host, "127.0.0.1");
        assert_eq!(cfg.store_backend, StoreBackend::Redis);
        assert_eq!(cfg.assets_dir, "./assets");
        assert_eq!(cfg.store_timeout, Duration::from_millis(2000));
        assert_eq!(cfg.redis_url(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_redis_url_with_password_is_encoded() {
        let cfg = config_from(&[("REDIS_HOST", "cache.internal"), ("REDIS_PASSWORD", "p@ss:w/rd")])
            .unwrap();
        assert_eq!(cfg.redis_url(), "redis://:p%40ss%3Aw%2Frd@cache.internal:6379/0");
    }

    #[test]
    fn test_memory_backend() {
        let cfg = config_from(&[("EDL_ADMIN_STORE", "memory")]).unwrap();
        assert_eq!(cfg.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn test_invalid_backend_rejected() {
        assert!(config_from(&[("EDL_ADMIN_STORE", "postgres")]).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(config_from(&[("EDL_ADMIN_STORE_TIMEOUT_MS", "0")]).is_err());
    }
}
