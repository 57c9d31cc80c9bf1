use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_SEED_PER_SUMMARY: usize = 5;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5000;

/// Process settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Persistent store location; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub seed: u64,
    /// Forecasts generated per summary when the store starts empty. Zero disables seeding.
    pub seed_per_summary: usize,
    pub max_page_size: u32,
    pub query_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let default_addr = SocketAddr::from(([0, 0, 0, 0], 8080));
        Self {
            bind_addr: parse_or(&get, "BIND_ADDR", default_addr),
            data_dir: get("DATA_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            seed: parse_or(&get, "SEED", DEFAULT_SEED),
            seed_per_summary: parse_or(&get, "SEED_PER_SUMMARY", DEFAULT_SEED_PER_SUMMARY),
            max_page_size: match parse_or(&get, "MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE) {
                0 => {
                    warn!("MAX_PAGE_SIZE must be positive; using {}", DEFAULT_MAX_PAGE_SIZE);
                    DEFAULT_MAX_PAGE_SIZE
                }
                n => n,
            },
            query_timeout: Duration::from_millis(parse_or(
                &get,
                "QUERY_TIMEOUT_MS",
                DEFAULT_QUERY_TIMEOUT_MS,
            )),
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match get(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, "malformed setting; using default {}", default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.data_dir.is_none());
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.seed_per_summary, 5);
        assert_eq!(cfg.max_page_size, 100);
        assert_eq!(cfg.query_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATA_DIR", "/var/lib/queryspec"),
            ("MAX_PAGE_SIZE", "25"),
            ("QUERY_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/queryspec")));
        assert_eq!(cfg.max_page_size, 25);
        assert_eq!(cfg.query_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let cfg = Config::from_lookup(lookup(&[
            ("SEED", "forty-two"),
            ("MAX_PAGE_SIZE", "0"),
            ("BIND_ADDR", "nowhere"),
            ("DATA_DIR", "  "),
        ]));
        assert_eq!(cfg.seed, DEFAULT_SEED);
        assert_eq!(cfg.max_page_size, DEFAULT_MAX_PAGE_SIZE);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.data_dir.is_none());
    }
}
