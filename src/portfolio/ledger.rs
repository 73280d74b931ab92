use crate::errors::{SimError, SimResult};
use crate::market::{premium, PRICING_VOLATILITY};
use crate::portfolio::{OptionType, Position, CONTRACT_MULTIPLIER};
use smallvec::SmallVec;
use uuid::Uuid;

/// Cash plus the set of open positions for one simulation session.
///
/// Total account value (cash + sum of open `current_value`) only moves
/// through `open` and `settle_expired`; the daily mark rewrites position
/// values without touching cash. Every mutating operation either commits
/// fully or rejects before any state changes.
pub struct PositionLedger {
    cash: f64,
    open_positions: Vec<Position>,
    realized_pnl: f64,
    settled_trades: u32,
    winning_trades: u32,
}

impl PositionLedger {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            open_positions: Vec::new(),
            realized_pnl: 0.0,
            settled_trades: 0,
            winning_trades: 0,
        }
    }

    /// Wipe positions and counters, restoring the starting endowment.
    pub fn reset(&mut self, cash: f64) {
        self.cash = cash;
        self.open_positions.clear();
        self.realized_pnl = 0.0;
        self.settled_trades = 0;
        self.winning_trades = 0;
    }

    #[inline]
    pub fn cash(&self) -> f64 {
        self.cash
    }

    #[inline]
    pub fn open_positions(&self) -> &[Position] {
        &self.open_positions
    }

    /// Sum of mark-to-market values across open positions.
    pub fn open_value(&self) -> f64 {
        self.open_positions.iter().map(|p| p.current_value).sum()
    }

    /// Cash plus open value.
    pub fn total_value(&self) -> f64 {
        self.cash + self.open_value()
    }

    #[inline]
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    #[inline]
    pub fn settled_trades(&self) -> u32 {
        self.settled_trades
    }

    #[inline]
    pub fn winning_trades(&self) -> u32 {
        self.winning_trades
    }

    /// Open a new long option position at the current day's spot.
    ///
    /// The only per-funds failure mode is `InsufficientFunds`; malformed
    /// orders (zero contracts, zero expiration, non-positive strike) are
    /// rejected defensively even though the caller's menu should never
    /// produce them. Rejection leaves the ledger untouched.
    pub fn open(
        &mut self,
        option_type: OptionType,
        strike_price: f64,
        expiration_days: u32,
        contracts: u32,
        current_day: u32,
        spot_price: f64,
    ) -> SimResult<Position> {
        if contracts == 0 {
            return Err(SimError::InvalidOrder("contracts must be positive".into()));
        }
        if expiration_days == 0 {
            return Err(SimError::InvalidOrder(
                "expiration must be at least one day out".into(),
            ));
        }
        if strike_price <= 0.0 {
            return Err(SimError::InvalidOrder("strike must be positive".into()));
        }

        let per_share = premium::premium(
            spot_price,
            strike_price,
            expiration_days as i64,
            PRICING_VOLATILITY,
            option_type,
        );
        let total_cost = per_share * CONTRACT_MULTIPLIER * contracts as f64;

        if self.cash < total_cost {
            return Err(SimError::InsufficientFunds {
                needed: total_cost,
                available: self.cash,
            });
        }

        let position = Position {
            id: Uuid::new_v4(),
            option_type,
            strike_price,
            purchase_day: current_day,
            expiration_day: current_day + expiration_days,
            contracts,
            cost_basis: total_cost,
            initial_stock_price: spot_price,
            current_value: total_cost,
            pnl: 0.0,
        };

        self.cash -= total_cost;

        tracing::info!(
            id = %position.id,
            option_type = %option_type,
            strike = strike_price,
            expires = position.expiration_day,
            contracts = contracts,
            cost = total_cost,
            "position opened"
        );

        self.open_positions.push(position.clone());
        Ok(position)
    }

    /// Revalue every still-open position at the new day's spot.
    ///
    /// Positions already at or past expiry are skipped; `settle_expired`
    /// picks them up in the same tick using the same predicate, so the
    /// two operations partition the open set. Cash is never touched here.
    pub fn mark_all(&mut self, new_day: u32, spot_price: f64) {
        for pos in self.open_positions.iter_mut() {
            let days_left = pos.days_to_expiration(new_day);
            if days_left <= 0 {
                continue;
            }

            let per_share = premium::premium(
                spot_price,
                pos.strike_price,
                days_left,
                PRICING_VOLATILITY,
                pos.option_type,
            );
            pos.current_value = per_share * CONTRACT_MULTIPLIER * pos.contracts as f64;
            pos.pnl = pos.current_value - pos.cost_basis;
        }
    }

    /// Settle every position whose expiration has arrived.
    ///
    /// Realized P/L defaults to the full premium lost; in-the-money
    /// positions recover intrinsic value instead. Exactly at the strike
    /// counts as worthless, matching the terminal premium rule. The
    /// payout (floored at zero) is credited to cash and each settled
    /// position is returned once, in encounter order.
    pub fn settle_expired(&mut self, new_day: u32, spot_price: f64) -> SmallVec<[Position; 4]> {
        let mut settled: SmallVec<[Position; 4]> = SmallVec::new();

        let mut i = 0;
        while i < self.open_positions.len() {
            if !self.open_positions[i].is_expired(new_day) {
                i += 1;
                continue;
            }

            let mut pos = self.open_positions.remove(i);
            let notional = CONTRACT_MULTIPLIER * pos.contracts as f64;

            let pnl = match pos.option_type {
                OptionType::Call if spot_price > pos.strike_price => {
                    (spot_price - pos.strike_price) * notional - pos.cost_basis
                }
                OptionType::Put if spot_price < pos.strike_price => {
                    (pos.strike_price - spot_price) * notional - pos.cost_basis
                }
                _ => -pos.cost_basis,
            };

            pos.pnl = pnl;
            pos.current_value = (pos.cost_basis + pnl).max(0.0);

            self.cash += pos.current_value;
            self.realized_pnl += pnl;
            self.settled_trades += 1;
            if pnl > 0.0 {
                self.winning_trades += 1;
            }

            tracing::info!(
                id = %pos.id,
                option_type = %pos.option_type,
                strike = pos.strike_price,
                spot = spot_price,
                pnl = pnl,
                payout = pos.current_value,
                "position settled"
            );

            settled.push(pos);
        }

        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPOT: f64 = 100.0;

    fn ledger() -> PositionLedger {
        PositionLedger::new(10_000.0)
    }

    #[test]
    fn test_open_debits_exact_cost() {
        let mut ledger = ledger();
        let pos = ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("trade should fit in 10k");

        // premium = 0.5 * 0.2 * (100/20) * sqrt(5/365) ~= 0.0585 per share
        let expected_cost = 0.5 * 0.2 * 5.0 * (5.0_f64 / 365.0).sqrt() * 100.0;
        assert!((pos.cost_basis - expected_cost).abs() < 1e-9);
        assert!((ledger.cash() - (10_000.0 - expected_cost)).abs() < 1e-9);
        assert_eq!(pos.current_value, pos.cost_basis);
        assert_eq!(pos.pnl, 0.0);
        assert_eq!(pos.purchase_day, 0);
        assert_eq!(pos.expiration_day, 5);
        assert_eq!(ledger.open_positions().len(), 1);
    }

    #[test]
    fn test_open_preserves_total_value() {
        let mut ledger = ledger();
        ledger
            .open(OptionType::Put, 95.0, 10, 3, 0, SPOT)
            .expect("open");
        assert!((ledger.total_value() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_funds_rejects_without_mutation() {
        let mut ledger = PositionLedger::new(5.0);
        let err = ledger
            .open(OptionType::Call, 50.0, 60, 10, 0, SPOT)
            .unwrap_err();

        assert!(matches!(err, SimError::InsufficientFunds { .. }));
        assert_eq!(ledger.cash(), 5.0);
        assert!(ledger.open_positions().is_empty());
    }

    #[test]
    fn test_malformed_orders_reject_without_mutation() {
        let mut ledger = ledger();
        for result in [
            ledger.open(OptionType::Call, 100.0, 5, 0, 0, SPOT),
            ledger.open(OptionType::Call, 100.0, 0, 1, 0, SPOT),
            ledger.open(OptionType::Call, 0.0, 5, 1, 0, SPOT),
            ledger.open(OptionType::Put, -10.0, 5, 1, 0, SPOT),
        ] {
            assert!(matches!(result, Err(SimError::InvalidOrder(_))));
        }
        assert_eq!(ledger.cash(), 10_000.0);
        assert!(ledger.open_positions().is_empty());
    }

    #[test]
    fn test_mark_all_updates_value_not_cash() {
        let mut ledger = ledger();
        ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open");
        let cash_after_open = ledger.cash();

        ledger.mark_all(1, 110.0);

        assert_eq!(ledger.cash(), cash_after_open, "marking must not touch cash");
        let pos = &ledger.open_positions()[0];
        // Spot 110 vs strike 100 with 4 days left: value well above cost.
        assert!(pos.current_value > pos.cost_basis);
        assert!((pos.pnl - (pos.current_value - pos.cost_basis)).abs() < 1e-12);
    }

    #[test]
    fn test_mark_all_skips_expired() {
        let mut ledger = ledger();
        ledger
            .open(OptionType::Call, 100.0, 2, 1, 0, SPOT)
            .expect("open");
        let before = ledger.open_positions()[0].current_value;

        ledger.mark_all(2, 140.0);

        assert_eq!(
            ledger.open_positions()[0].current_value,
            before,
            "expired positions belong to settle_expired"
        );
    }

    #[test]
    fn test_settle_itm_call() {
        let mut ledger = ledger();
        let opened = ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open");
        let cash_before_settle = ledger.cash();
        let cost = opened.cost_basis;

        let settled = ledger.settle_expired(5, 110.0);

        assert_eq!(settled.len(), 1);
        let pos = &settled[0];
        assert!((pos.pnl - (1_000.0 - cost)).abs() < 1e-9);
        assert!((pos.current_value - 1_000.0).abs() < 1e-9);
        assert!((ledger.cash() - (cash_before_settle + 1_000.0)).abs() < 1e-9);
        assert!(ledger.open_positions().is_empty());
        assert_eq!(ledger.settled_trades(), 1);
    }

    #[test]
    fn test_settle_otm_call_full_loss() {
        let mut ledger = ledger();
        let opened = ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open");
        let cash_before_settle = ledger.cash();

        let settled = ledger.settle_expired(5, 90.0);

        let pos = &settled[0];
        assert_eq!(pos.pnl, -opened.cost_basis);
        assert_eq!(pos.current_value, 0.0);
        assert_eq!(ledger.cash(), cash_before_settle, "worthless expiry credits nothing");
        assert_eq!(ledger.winning_trades(), 0);
        assert!((ledger.realized_pnl() + opened.cost_basis).abs() < 1e-12);
    }

    #[test]
    fn test_settle_itm_put() {
        let mut ledger = ledger();
        let opened = ledger
            .open(OptionType::Put, 100.0, 5, 2, 0, SPOT)
            .expect("open");

        let settled = ledger.settle_expired(5, 80.0);

        let pos = &settled[0];
        // (100 - 80) * 100 * 2 - cost
        assert!((pos.pnl - (4_000.0 - opened.cost_basis)).abs() < 1e-9);
        assert_eq!(ledger.winning_trades(), 1);
    }

    #[test]
    fn test_settle_exactly_atm_is_worthless() {
        let mut ledger = ledger();
        let opened = ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open");

        let settled = ledger.settle_expired(5, 100.0);

        assert_eq!(settled[0].pnl, -opened.cost_basis);
        assert_eq!(settled[0].current_value, 0.0);
    }

    #[test]
    fn test_settle_credits_exactly_the_payout() {
        let mut ledger = ledger();
        ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open winner");
        ledger
            .open(OptionType::Put, 100.0, 5, 1, 0, SPOT)
            .expect("open loser");
        let cash_before = ledger.cash();

        let settled = ledger.settle_expired(5, 110.0);

        let payouts: f64 = settled.iter().map(|p| p.current_value).sum();
        assert!((ledger.cash() - (cash_before + payouts)).abs() < 1e-9);
        assert!(settled.iter().all(|p| p.current_value >= 0.0));
    }

    #[test]
    fn test_settle_only_touches_expired() {
        let mut ledger = ledger();
        ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open short-dated");
        ledger
            .open(OptionType::Call, 100.0, 30, 1, 0, SPOT)
            .expect("open long-dated");

        let settled = ledger.settle_expired(5, 105.0);

        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].expiration_day, 5);
        assert_eq!(ledger.open_positions().len(), 1);
        assert_eq!(ledger.open_positions()[0].expiration_day, 30);
    }

    #[test]
    fn test_settle_batch_keeps_order() {
        let mut ledger = ledger();
        let first = ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open");
        let second = ledger
            .open(OptionType::Put, 100.0, 5, 1, 0, SPOT)
            .expect("open");

        let settled = ledger.settle_expired(5, 104.0);

        assert_eq!(settled.len(), 2);
        assert_eq!(settled[0].id, first.id);
        assert_eq!(settled[1].id, second.id);
    }

    #[test]
    fn test_reset_restores_endowment() {
        let mut ledger = ledger();
        ledger
            .open(OptionType::Call, 100.0, 5, 1, 0, SPOT)
            .expect("open");
        ledger.settle_expired(5, 90.0);

        ledger.reset(10_000.0);

        assert_eq!(ledger.cash(), 10_000.0);
        assert!(ledger.open_positions().is_empty());
        assert_eq!(ledger.realized_pnl(), 0.0);
        assert_eq!(ledger.settled_trades(), 0);
    }
}
