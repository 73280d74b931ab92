//! Portfolio summary computation.
//! Pure functions over ledger state; used by the CLI portfolio view.

use crate::portfolio::ledger::PositionLedger;

#[derive(Debug, Clone, serde::Serialize)]
pub struct PortfolioMetrics {
    pub cash: f64,
    pub open_value: f64,
    pub total_value: f64,
    pub open_positions: usize,
    pub realized_pnl: f64,
    pub settled_trades: u32,
    pub winning_trades: u32,
    pub win_rate: f64,
}

/// Compute the portfolio summary from ledger state. Pure function.
pub fn compute(ledger: &PositionLedger) -> PortfolioMetrics {
    let settled = ledger.settled_trades();
    let win_rate = if settled == 0 {
        0.0
    } else {
        ledger.winning_trades() as f64 / settled as f64
    };

    PortfolioMetrics {
        cash: ledger.cash(),
        open_value: ledger.open_value(),
        total_value: ledger.total_value(),
        open_positions: ledger.open_positions().len(),
        realized_pnl: ledger.realized_pnl(),
        settled_trades: settled,
        winning_trades: ledger.winning_trades(),
        win_rate,
    }
}
