pub mod path;
pub mod premium;

/// Ticker of the single simulated stock.
pub const STOCK_TICKER: &str = "APEX";

/// Day-0 price of every generated path.
pub const INITIAL_STOCK_PRICE: f64 = 100.0;

/// Base per-day step volatility for path generation.
pub const BASE_VOLATILITY: f64 = 0.02;

/// Flat implied volatility used for premium quotes at all call sites.
pub const PRICING_VOLATILITY: f64 = 0.2;

/// One point on the simulated daily price path.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PricePoint {
    pub day: u32,
    pub price: f64,
}

/// Market regime for path generation. Selects drift/volatility parameters
/// for the generator; nothing else depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum MarketScenario {
    Classic,
    Bullish,
    Bearish,
    Volatile,
    Sideways,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 5] = [
        Self::Classic,
        Self::Bullish,
        Self::Bearish,
        Self::Volatile,
        Self::Sideways,
    ];
}

impl std::fmt::Display for MarketScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classic => write!(f, "Classic"),
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
            Self::Volatile => write!(f, "Volatile"),
            Self::Sideways => write!(f, "Sideways"),
        }
    }
}

impl std::str::FromStr for MarketScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            "volatile" => Ok(Self::Volatile),
            "sideways" => Ok(Self::Sideways),
            other => Err(format!("unknown scenario: {other}")),
        }
    }
}
