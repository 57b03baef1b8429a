//! # models::symbol
//!
//! The closed universe of trading pairs the simulated feed knows about, plus
//! the candle [`Timeframe`]s the chart can request.
//!
//! Both enums serialise to the exact strings the dashboard uses
//! (`"BTC/USDT"`, `"1h"`, ...). Deserialising goes through [`FromStr`], so a
//! query string and a JSON body accept the same spellings and unknown values
//! are rejected at the edge instead of deep inside the data layer.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

// ─── Symbol ───────────────────────────────────────────────────────────────────

/// A supported trading pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Symbol {
    #[serde(rename = "BTC/USDT")]
    BtcUsdt,
    #[serde(rename = "ETH/USDT")]
    EthUsdt,
    #[serde(rename = "BNB/USDT")]
    BnbUsdt,
    #[serde(rename = "SOL/USDT")]
    SolUsdt,
    #[serde(rename = "ADA/USDT")]
    AdaUsdt,
}

impl Symbol {
    /// Every supported pair, in display order.
    pub const ALL: [Symbol; 5] = [
        Symbol::BtcUsdt,
        Symbol::EthUsdt,
        Symbol::BnbUsdt,
        Symbol::SolUsdt,
        Symbol::AdaUsdt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::BtcUsdt => "BTC/USDT",
            Symbol::EthUsdt => "ETH/USDT",
            Symbol::BnbUsdt => "BNB/USDT",
            Symbol::SolUsdt => "SOL/USDT",
            Symbol::AdaUsdt => "ADA/USDT",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::ALL
            .iter()
            .copied()
            .find(|sym| sym.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid symbol: {s}"))
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ─── Timeframe ────────────────────────────────────────────────────────────────

/// Candle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::OneMinute,
        Timeframe::FiveMinutes,
        Timeframe::OneHour,
        Timeframe::OneDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::OneHour => "1h",
            Timeframe::OneDay => "1d",
        }
    }

    /// Length of one bar.
    pub fn interval(&self) -> Duration {
        match self {
            Timeframe::OneMinute => Duration::minutes(1),
            Timeframe::FiveMinutes => Duration::minutes(5),
            Timeframe::OneHour => Duration::hours(1),
            Timeframe::OneDay => Duration::days(1),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str() == s.trim())
            .ok_or_else(|| format!("Invalid timeframe: {s}"))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_parses_wire_names() {
        assert_eq!("BTC/USDT".parse::<Symbol>().unwrap(), Symbol::BtcUsdt);
        assert_eq!("sol/usdt".parse::<Symbol>().unwrap(), Symbol::SolUsdt);
        assert!("DOGE/USDT".parse::<Symbol>().is_err());
    }

    #[test]
    fn symbol_serde_uses_pair_string() {
        let json = serde_json::to_string(&Symbol::EthUsdt).unwrap();
        assert_eq!(json, r#""ETH/USDT""#);
        assert!(serde_json::from_str::<Symbol>(r#""XRP/USDT""#).is_err());
    }

    #[test]
    fn serde_and_from_str_accept_same_spellings() {
        for raw in ["BTC/USDT", "btc/usdt", " Btc/Usdt "] {
            let parsed = raw.parse::<Symbol>().unwrap();
            let json = serde_json::to_string(raw).unwrap();
            assert_eq!(serde_json::from_str::<Symbol>(&json).unwrap(), parsed);
        }
        assert_eq!(serde_json::from_str::<Timeframe>(r#""1d""#).unwrap(), Timeframe::OneDay);
        assert!(serde_json::from_str::<Timeframe>(r#""2h""#).is_err());
    }

    #[test]
    fn timeframe_intervals() {
        assert_eq!("5m".parse::<Timeframe>().unwrap().interval(), Duration::minutes(5));
        assert_eq!(Timeframe::OneDay.interval(), Duration::hours(24));
        assert_eq!(Timeframe::default(), Timeframe::OneHour);
        assert!("4h".parse::<Timeframe>().is_err());
    }
}
