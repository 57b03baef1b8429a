//! # config — runtime settings from environment variables
//!
//! | Variable               | Default              |
//! |------------------------|----------------------|
//! | `BIND_ADDR`            | `0.0.0.0:3000`       |
//! | `REFRESH_INTERVAL_MS`  | `3000`               |
//! | `MARKET_TTL_SECS`      | `2`                  |
//! | `CANDLE_TTL_SECS`      | `2`                  |
//! | `POSITION_TTL_SECS`    | `10`                 |
//! | `FETCH_TIMEOUT_MS`     | `10000`              |
//! | `SIMULATED_LATENCY_MS` | `0`                  |
//! | `GENERATOR_SEED`       | unset (OS entropy)   |
//! | `DEFAULT_SYMBOL`       | `BTC/USDT`           |
//! | `DEFAULT_TIMEFRAME`    | `1h`                 |
//! | `CANDLE_LIMIT`         | `500`                |
//! | `PREFERENCES_PATH`     | `.preferences.json`  |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::generator::{DEFAULT_CANDLE_LIMIT, MAX_CANDLE_LIMIT};
use crate::models::{Symbol, Timeframe};
use crate::refresh::RefreshConfig;
use crate::service::ServiceConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub refresh: RefreshConfig,
    pub service: ServiceConfig,
    /// `None` seeds the generator from OS entropy.
    pub generator_seed: Option<u64>,
    pub preferences_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_addr: SocketAddr = get("BIND_ADDR", "0.0.0.0:3000")
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let symbol = Symbol::from_str(&get("DEFAULT_SYMBOL", "BTC/USDT")).map_err(anyhow::Error::msg)?;
        let timeframe = Timeframe::from_str(&get("DEFAULT_TIMEFRAME", "1h")).map_err(anyhow::Error::msg)?;

        let candle_limit: usize = parse(&lookup, "CANDLE_LIMIT", DEFAULT_CANDLE_LIMIT)?;
        if candle_limit == 0 || candle_limit > MAX_CANDLE_LIMIT {
            bail!("CANDLE_LIMIT must be between 1 and {MAX_CANDLE_LIMIT}, got {candle_limit}");
        }

        let interval_ms: u64 = parse(&lookup, "REFRESH_INTERVAL_MS", 3_000)?;
        if interval_ms == 0 {
            bail!("REFRESH_INTERVAL_MS must be greater than zero");
        }

        let defaults = ServiceConfig::default();
        let service = ServiceConfig {
            market_ttl: Duration::from_secs(parse(&lookup, "MARKET_TTL_SECS", defaults.market_ttl.as_secs())?),
            candle_ttl: Duration::from_secs(parse(&lookup, "CANDLE_TTL_SECS", defaults.candle_ttl.as_secs())?),
            position_ttl: Duration::from_secs(parse(&lookup, "POSITION_TTL_SECS", defaults.position_ttl.as_secs())?),
            fetch_timeout: Duration::from_millis(parse(&lookup, "FETCH_TIMEOUT_MS", 10_000)?),
            simulated_latency: Duration::from_millis(parse(&lookup, "SIMULATED_LATENCY_MS", 0)?),
        };

        let generator_seed = match lookup("GENERATOR_SEED") {
            Some(raw) => Some(raw.parse().context("GENERATOR_SEED must be an unsigned integer")?),
            None => None,
        };

        Ok(Self {
            bind_addr,
            refresh: RefreshConfig {
                interval: Duration::from_millis(interval_ms),
                symbol,
                timeframe,
                candle_limit,
            },
            service,
            generator_seed,
            preferences_path: PathBuf::from(get("PREFERENCES_PATH", ".preferences.json")),
        })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.refresh.interval, Duration::from_secs(3));
        assert_eq!(cfg.refresh.symbol, Symbol::BtcUsdt);
        assert_eq!(cfg.refresh.timeframe, Timeframe::OneHour);
        assert_eq!(cfg.refresh.candle_limit, DEFAULT_CANDLE_LIMIT);
        assert_eq!(cfg.service.fetch_timeout, Duration::from_secs(10));
        assert!(cfg.service.simulated_latency.is_zero());
        assert!(cfg.generator_seed.is_none());
        assert_eq!(cfg.preferences_path, PathBuf::from(".preferences.json"));
    }

    #[test]
    fn test_overrides() {
        let cfg = from_pairs(&[
            ("REFRESH_INTERVAL_MS", "1500"),
            ("DEFAULT_SYMBOL", "eth/usdt"),
            ("DEFAULT_TIMEFRAME", "5m"),
            ("GENERATOR_SEED", "42"),
            ("POSITION_TTL_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(cfg.refresh.interval, Duration::from_millis(1500));
        assert_eq!(cfg.refresh.symbol, Symbol::EthUsdt);
        assert_eq!(cfg.refresh.timeframe, Timeframe::FiveMinutes);
        assert_eq!(cfg.generator_seed, Some(42));
        assert_eq!(cfg.service.position_ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(from_pairs(&[("CANDLE_LIMIT", "0")]).is_err());
        assert!(from_pairs(&[("CANDLE_LIMIT", "5000")]).is_err());
        assert!(from_pairs(&[("REFRESH_INTERVAL_MS", "abc")]).is_err());
        assert!(from_pairs(&[("DEFAULT_SYMBOL", "DOGE/USDT")]).is_err());
        assert!(from_pairs(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
