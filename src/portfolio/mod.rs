pub mod ledger;
pub mod metrics;

use uuid::Uuid;

/// Shares controlled by one option contract.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

impl std::str::FromStr for OptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            other => Err(format!("unknown option type: {other}")),
        }
    }
}

/// One long option position.
///
/// Identity fields are fixed at open. While the position is open,
/// `current_value` and `pnl` are rewritten by the daily mark; settlement
/// bakes in the final values and removes the position from the open set,
/// after which it is never mutated again. Invariant while open:
/// `pnl == current_value - cost_basis` and `current_value >= 0`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Position {
    pub id: Uuid,
    pub option_type: OptionType,
    pub strike_price: f64,
    pub purchase_day: u32,
    pub expiration_day: u32,
    pub contracts: u32,
    /// Total premium paid at open: per-share premium x 100 x contracts.
    pub cost_basis: f64,
    /// Spot at the moment of purchase.
    pub initial_stock_price: f64,
    /// Mark-to-market notional while open; settlement payout once expired.
    pub current_value: f64,
    pub pnl: f64,
}

impl Position {
    /// Days remaining before expiry as seen from `day`. Zero or negative
    /// means the position settles on this tick.
    #[inline]
    pub fn days_to_expiration(&self, day: u32) -> i64 {
        self.expiration_day as i64 - day as i64
    }

    #[inline]
    pub fn is_expired(&self, day: u32) -> bool {
        day >= self.expiration_day
    }

    /// Premium paid per underlying share.
    #[inline]
    pub fn premium_per_share(&self) -> f64 {
        self.cost_basis / (CONTRACT_MULTIPLIER * self.contracts as f64)
    }
}
