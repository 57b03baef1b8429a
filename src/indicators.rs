//! # indicators
//!
//! Read-only glossary of the technical indicators the dashboard explains.
//! The catalogue is a `static` table; every lookup borrows from it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Trend,
    Momentum,
    Volume,
    Volatility,
    Pattern,
}

impl IndicatorCategory {
    pub const ALL: [IndicatorCategory; 5] = [
        IndicatorCategory::Trend,
        IndicatorCategory::Momentum,
        IndicatorCategory::Volume,
        IndicatorCategory::Volatility,
        IndicatorCategory::Pattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorCategory::Trend => "trend",
            IndicatorCategory::Momentum => "momentum",
            IndicatorCategory::Volume => "volume",
            IndicatorCategory::Volatility => "volatility",
            IndicatorCategory::Pattern => "pattern",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IndicatorCategory::Trend => "Trend / Moving Averages",
            IndicatorCategory::Momentum => "Momentum",
            IndicatorCategory::Volume => "Volume",
            IndicatorCategory::Volatility => "Volatility / Risk",
            IndicatorCategory::Pattern => "Pattern / Trend Following",
        }
    }
}

impl std::str::FromStr for IndicatorCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndicatorCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown indicator category '{s}'"))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDoc {
    pub id: &'static str,
    pub name: &'static str,
    pub category: IndicatorCategory,
    pub definition: &'static str,
    pub formula: &'static str,
    pub usage: &'static [&'static str],
    pub risk_warning: &'static str,
    pub example: &'static str,
    pub tags: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub value: IndicatorCategory,
    pub label: &'static str,
    pub count: usize,
}

/// Shown first when a client asks for "popular" indicators, in this order.
const POPULAR_IDS: [&str; 6] = ["ma", "ema", "macd", "rsi", "volume", "bollinger"];

pub const DEFAULT_POPULAR_LIMIT: usize = 6;

static INDICATORS: &[IndicatorDoc] = &[
    // ── Trend ─────────────────────────────────────────────────────────────────
    IndicatorDoc {
        id: "ma",
        name: "MA (Moving Average)",
        category: IndicatorCategory::Trend,
        definition: "The most basic trend indicator: the average price over a fixed window, smoothing out noise to reveal trend direction.",
        formula: "MA = (P1 + P2 + ... + Pn) / n, where P is price and n the period",
        usage: &[
            "Price above MA: uptrend",
            "Price below MA: downtrend",
            "MA slope: trend strength",
            "Crossing MAs: entry and exit signals",
        ],
        risk_warning: "Lags price and whipsaws in ranging markets; not suited to picking exact tops or bottoms.",
        example: "BTC 20-day MA at $50,000 with price at $52,000 suggests a short-term uptrend.",
        tags: &["trend", "moving average", "basic", "lagging"],
    },
    IndicatorDoc {
        id: "ema",
        name: "EMA (Exponential Moving Average)",
        category: IndicatorCategory::Trend,
        definition: "A moving average that weights recent prices more heavily, reacting faster than a simple MA.",
        formula: "EMA = Close × α + EMA_prev × (1 − α), with α = 2 / (n + 1)",
        usage: &[
            "Reacts quickly to price changes",
            "Suited to short-term trading",
            "Building block of MACD",
            "Dynamic support and resistance",
        ],
        risk_warning: "More sensitive to noise; generates more signals that need filtering.",
        example: "ETH 12-day EMA at $2,800 with price at $2,750 points to weak short-term momentum.",
        tags: &["trend", "moving average", "fast", "short-term"],
    },
    IndicatorDoc {
        id: "sma",
        name: "SMA (Simple Moving Average)",
        category: IndicatorCategory::Trend,
        definition: "A moving average giving every price in the window equal weight; the most stable variant.",
        formula: "SMA = (P1 + P2 + ... + Pn) / n",
        usage: &[
            "Long-term trend direction",
            "Key support and resistance levels",
            "Widely watched by institutions",
            "Combined with EMA for crossovers",
        ],
        risk_warning: "Slow to react; can miss the best entries in fast markets.",
        example: "BNB 50-day SMA at $300 with price at $310 indicates a healthy medium-term trend.",
        tags: &["trend", "moving average", "stable", "long-term"],
    },
    IndicatorDoc {
        id: "bollinger",
        name: "Bollinger Bands",
        category: IndicatorCategory::Trend,
        definition: "A middle MA with upper and lower bands at a multiple of standard deviation, showing volatility and relative extremes.",
        formula: "Middle = MA(20); Upper / Lower = Middle ± 2 × σ",
        usage: &[
            "Touching the upper band: overbought",
            "Touching the lower band: oversold",
            "Band squeeze: breakout ahead",
            "Return to the middle band: trend continuation",
        ],
        risk_warning: "In strong trends price can ride a band for a long time; not a reversal signal on its own.",
        example: "SOL upper band $110, lower $95, price $108: short-term overbought.",
        tags: &["trend", "volatility", "overbought", "channel"],
    },
    // ── Momentum ──────────────────────────────────────────────────────────────
    IndicatorDoc {
        id: "macd",
        name: "MACD (Moving Average Convergence Divergence)",
        category: IndicatorCategory::Momentum,
        definition: "The spread between a fast and a slow EMA, capturing shifts in momentum; the most widely used momentum indicator.",
        formula: "MACD = EMA(12) − EMA(26); Signal = EMA(MACD, 9); Histogram = MACD − Signal",
        usage: &[
            "MACD crosses above signal: buy",
            "MACD crosses below signal: sell",
            "Histogram turns positive: momentum building",
            "Divergence: reversal warning",
        ],
        risk_warning: "Crosses frequently in ranging markets; pair it with a trend filter.",
        example: "BTC MACD positive and rising: bullish momentum strengthening.",
        tags: &["momentum", "trend", "crossover", "divergence"],
    },
    IndicatorDoc {
        id: "rsi",
        name: "RSI (Relative Strength Index)",
        category: IndicatorCategory::Momentum,
        definition: "Measures the speed and size of price moves to spot overbought and oversold conditions.",
        formula: "RSI = 100 − 100 / (1 + RS), RS = average gain / average loss over N periods",
        usage: &[
            "RSI > 70: overbought",
            "RSI < 30: oversold",
            "Divergence: new price extreme not confirmed by RSI",
            "RSI = 50: balance line",
        ],
        risk_warning: "Can stay overbought or oversold for a long time in strong trends.",
        example: "ETH RSI at 75 is overbought; watch for a short-term pullback.",
        tags: &["momentum", "overbought", "oscillator", "divergence"],
    },
    IndicatorDoc {
        id: "kdj",
        name: "KDJ (Stochastic Oscillator)",
        category: IndicatorCategory::Momentum,
        definition: "Locates the close within the recent high-low range to gauge relative position and momentum.",
        formula: "RSV = (Close − Lowest) / (Highest − Lowest) × 100; K = SMA(RSV, 3); D = SMA(K, 3); J = 3K − 2D",
        usage: &[
            "K > 80: overbought",
            "K < 20: oversold",
            "K crosses above D: buy",
            "K crosses below D: sell",
        ],
        risk_warning: "Very sensitive to price changes; needs filtering to avoid overtrading.",
        example: "BNB K at 85 with D flattening at 70: upside momentum fading.",
        tags: &["momentum", "overbought", "fast", "short-term"],
    },
    // ── Volume ────────────────────────────────────────────────────────────────
    IndicatorDoc {
        id: "volume",
        name: "Volume",
        category: IndicatorCategory::Volume,
        definition: "Traded quantity over a period; reflects participation and confirms whether a price move is genuine.",
        formula: "Volume = units traded within the period",
        usage: &[
            "Rising price on rising volume: uptrend confirmed",
            "Falling price on rising volume: downtrend confirmed",
            "Rising price on falling volume: rally losing steam",
            "Falling price on falling volume: selling easing",
        ],
        risk_warning: "Volume can be manipulated; read it alongside price structure.",
        example: "BTC broke $50,000 on double the usual volume, supporting the breakout.",
        tags: &["volume", "confirmation", "flow", "basic"],
    },
    IndicatorDoc {
        id: "obv",
        name: "OBV (On-Balance Volume)",
        category: IndicatorCategory::Volume,
        definition: "Running total of volume signed by price direction, used as a leading gauge of price moves.",
        formula: "OBV = OBV_prev + Volume (up day) or − Volume (down day)",
        usage: &[
            "OBV new high: price may follow",
            "OBV new low: price may follow down",
            "Divergence: possible reversal",
            "Flat OBV: accumulation",
        ],
        risk_warning: "Misleading around false breakouts or manipulated moves.",
        example: "SOL price made a new high but OBV did not; beware a pullback.",
        tags: &["volume", "flow", "leading", "divergence"],
    },
    IndicatorDoc {
        id: "vwap",
        name: "VWAP (Volume Weighted Average Price)",
        category: IndicatorCategory::Volume,
        definition: "Average price weighted by volume; approximates the session's average cost basis.",
        formula: "VWAP = Σ(Price × Volume) / Σ(Volume)",
        usage: &[
            "Price above VWAP: buyers in control",
            "Price below VWAP: sellers in control",
            "Intraday support and resistance",
            "Institutional execution benchmark",
        ],
        risk_warning: "Describes trades already done; it has no predictive power.",
        example: "ETH VWAP $2,750 with price $2,780: buyers slightly ahead.",
        tags: &["volume", "average price", "cost", "institutional"],
    },
    // ── Volatility / risk ─────────────────────────────────────────────────────
    IndicatorDoc {
        id: "atr",
        name: "ATR (Average True Range)",
        category: IndicatorCategory::Volatility,
        definition: "Average size of price ranges, used for stop placement and position sizing.",
        formula: "ATR = N-period average of TR, TR = max(High − Low, |High − Close_prev|, |Low − Close_prev|)",
        usage: &[
            "Rising ATR: volatility expanding",
            "Falling ATR: volatility contracting",
            "2 × ATR: stop distance guide",
            "Compare risk across instruments",
        ],
        risk_warning: "Measures magnitude only, never direction.",
        example: "BTC ATR at $1,500: consider a stop $1,500 below entry.",
        tags: &["volatility", "risk", "stop loss", "sizing"],
    },
    IndicatorDoc {
        id: "volatility",
        name: "Volatility",
        category: IndicatorCategory::Volatility,
        definition: "How violently price moves; the core input to risk assessment and option pricing.",
        formula: "Volatility = stdev(returns) × √(periods per year)",
        usage: &[
            "High volatility: higher risk and reward",
            "Low volatility: lower risk and reward",
            "Volatility mean-reverts",
            "Implied volatility: market expectations",
        ],
        risk_warning: "Volatility regimes shift abruptly; history does not bound the future.",
        example: "SOL annualised volatility of 120% calls for careful sizing.",
        tags: &["volatility", "risk", "return", "options"],
    },
    IndicatorDoc {
        id: "max-drawdown",
        name: "Maximum Drawdown",
        category: IndicatorCategory::Volatility,
        definition: "Largest peak-to-trough decline; a key measure of strategy risk.",
        formula: "Max Drawdown = (Peak − Trough) / Peak",
        usage: &[
            "Gauge the pain a strategy demands",
            "Reference for risk limits",
            "Product risk classification",
            "Matching investors to risk",
        ],
        risk_warning: "Backward-looking; the next drawdown can be deeper.",
        example: "A strategy with 25% max drawdown suits investors with high risk tolerance.",
        tags: &["risk", "drawdown", "risk control", "evaluation"],
    },
    IndicatorDoc {
        id: "sharpe",
        name: "Sharpe Ratio",
        category: IndicatorCategory::Volatility,
        definition: "Excess return earned per unit of risk; the standard risk-adjusted performance measure.",
        formula: "Sharpe = (Portfolio return − Risk-free rate) / Portfolio σ",
        usage: &[
            "Risk-adjusted return",
            "Compare strategies",
            "Portfolio optimisation",
            "Performance benchmark",
        ],
        risk_warning: "Assumes normally distributed returns; misleading in tail events.",
        example: "30% return, 20% volatility, 2% risk-free: Sharpe 1.4.",
        tags: &["risk", "return", "performance", "evaluation"],
    },
    // ── Pattern / trend following ─────────────────────────────────────────────
    IndicatorDoc {
        id: "sar",
        name: "Parabolic SAR",
        category: IndicatorCategory::Pattern,
        definition: "Trend-following stop that accelerates toward price, used to ride trends and trail stops.",
        formula: "SAR = SAR_prev + AF × (EP − SAR_prev), AF = acceleration factor",
        usage: &[
            "Price above SAR: hold long",
            "Price below SAR: hold short",
            "SAR flip: possible reversal",
            "Trailing stop placement",
        ],
        risk_warning: "Flips constantly in ranging markets.",
        example: "BTC at $52,000 with SAR at $50,500: uptrend, stop at $50,500.",
        tags: &["trend", "trailing", "stop loss", "reversal"],
    },
    IndicatorDoc {
        id: "adx",
        name: "ADX (Average Directional Index)",
        category: IndicatorCategory::Pattern,
        definition: "Measures trend strength without direction, separating trending from ranging markets.",
        formula: "ADX = N-period smoothed DX, DX = |DI+ − DI−| / (DI+ + DI−) × 100",
        usage: &[
            "ADX > 25: clear trend",
            "ADX < 20: ranging market",
            "Rising ADX: trend strengthening",
            "Falling ADX: trend weakening",
        ],
        risk_warning: "Says nothing about direction; read DI+ and DI− for that.",
        example: "ETH ADX at 35: strong trend, direction from other indicators.",
        tags: &["trend", "strength", "direction", "oscillator"],
    },
    IndicatorDoc {
        id: "ichimoku",
        name: "Ichimoku Cloud",
        category: IndicatorCategory::Pattern,
        definition: "Multi-line Japanese system giving support, resistance, trend direction and signals at once.",
        formula: "Tenkan = 9-period high/low midpoint; Kijun = 26-period midpoint; Senkou A/B = cloud bounds",
        usage: &[
            "Price above the cloud: bullish",
            "Price below the cloud: bearish",
            "Cloud thickness: strength of support",
            "Tenkan crosses above Kijun: buy",
        ],
        risk_warning: "Complex; needs study and practice to apply correctly.",
        example: "BTC above a rising cloud: medium-term uptrend established.",
        tags: &["trend", "composite", "japanese", "complex"],
    },
];

// ─── Lookups ──────────────────────────────────────────────────────────────────

pub fn all() -> &'static [IndicatorDoc] {
    INDICATORS
}

pub fn by_id(id: &str) -> Option<&'static IndicatorDoc> {
    INDICATORS.iter().find(|doc| doc.id == id)
}

pub fn by_category(category: IndicatorCategory) -> Vec<&'static IndicatorDoc> {
    INDICATORS.iter().filter(|doc| doc.category == category).collect()
}

/// Case-insensitive substring match over name, definition and tags.
pub fn search(query: &str) -> Vec<&'static IndicatorDoc> {
    let query = query.to_lowercase();
    INDICATORS
        .iter()
        .filter(|doc| {
            doc.name.to_lowercase().contains(&query)
                || doc.definition.to_lowercase().contains(&query)
                || doc.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
        })
        .collect()
}

pub fn categories() -> Vec<CategorySummary> {
    IndicatorCategory::ALL
        .into_iter()
        .map(|category| CategorySummary {
            value: category,
            label: category.label(),
            count: INDICATORS.iter().filter(|doc| doc.category == category).count(),
        })
        .collect()
}

pub fn popular(limit: usize) -> Vec<&'static IndicatorDoc> {
    POPULAR_IDS.iter().filter_map(|id| by_id(id)).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_shape() {
        assert_eq!(all().len(), 17);
        let ids: HashSet<_> = all().iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 17, "ids must be unique");
        assert!(all().iter().all(|d| !d.usage.is_empty() && !d.tags.is_empty()));
    }

    #[test]
    fn test_by_id() {
        assert_eq!(by_id("rsi").unwrap().category, IndicatorCategory::Momentum);
        assert!(by_id("RSI").is_none(), "ids are exact");
        assert!(by_id("nope").is_none());
    }

    #[test]
    fn test_categories_counts_sum_to_total() {
        let cats = categories();
        assert_eq!(cats.len(), 5);
        assert_eq!(cats.iter().map(|c| c.count).sum::<usize>(), 17);
        let trend = cats.iter().find(|c| c.value == IndicatorCategory::Trend).unwrap();
        assert_eq!(trend.count, 4);
        assert_eq!(by_category(IndicatorCategory::Volatility).len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let hits: Vec<_> = search("MOVING AVERAGE").into_iter().map(|d| d.id).collect();
        assert!(hits.contains(&"ma"));
        assert!(hits.contains(&"ema"));
        assert!(search("divergence").iter().any(|d| d.id == "obv"));
        assert!(search("zzzz").is_empty());
    }

    #[test]
    fn test_popular_order_and_limit() {
        let ids: Vec<_> = popular(3).into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["ma", "ema", "macd"]);
        assert_eq!(popular(100).len(), 6);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Volume".parse::<IndicatorCategory>(), Ok(IndicatorCategory::Volume));
        assert!("foo".parse::<IndicatorCategory>().is_err());
    }
}
