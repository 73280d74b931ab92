use crate::errors::{SimError, SimResult};
use crate::market::{path, MarketScenario, PricePoint};
use crate::portfolio::ledger::PositionLedger;
use crate::portfolio::{OptionType, Position};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::SmallVec;

/// What one advanced day produced: the new day, the spot it opened at,
/// and the positions that settled on it (in settlement order).
#[derive(Debug)]
pub struct DayOutcome {
    pub new_day: u32,
    pub spot: f64,
    pub settled: SmallVec<[Position; 4]>,
}

/// One simulation session: the clock, the precomputed price path, and the
/// ledger it drives.
///
/// Each session owns its state outright; nothing is shared or static.
/// `advance_day` runs to completion synchronously, so by the time the
/// caller sees a `DayOutcome` every monetary effect is already committed.
/// Analysis text for settled positions is a follow-up step the caller
/// performs, never something the clock waits on.
pub struct SimSession {
    scenario: MarketScenario,
    horizon: u32,
    current_day: u32,
    price_path: Vec<PricePoint>,
    ledger: PositionLedger,
    initial_cash: f64,
    rng: StdRng,
}

impl SimSession {
    /// Entropy-seeded session for production use.
    pub fn new(scenario: MarketScenario, horizon: u32, initial_cash: f64) -> Self {
        Self::with_rng(scenario, horizon, initial_cash, StdRng::from_entropy())
    }

    /// Session with a caller-supplied RNG; seeded under test for
    /// reproducible paths.
    pub fn with_rng(
        scenario: MarketScenario,
        horizon: u32,
        initial_cash: f64,
        mut rng: StdRng,
    ) -> Self {
        let price_path = path::generate_path(horizon, scenario, &mut rng);
        Self {
            scenario,
            horizon,
            current_day: 0,
            price_path,
            ledger: PositionLedger::new(initial_cash),
            initial_cash,
            rng,
        }
    }

    /// Start over under a (possibly new) scenario: fresh path, day 0,
    /// ledger back to the starting endowment.
    pub fn reset(&mut self, scenario: MarketScenario) {
        self.scenario = scenario;
        self.price_path = path::generate_path(self.horizon, scenario, &mut self.rng);
        self.current_day = 0;
        self.ledger.reset(self.initial_cash);

        tracing::info!(
            scenario = %scenario,
            horizon = self.horizon,
            cash = self.initial_cash,
            "session reset"
        );
    }

    /// Open a position priced at the current day's spot.
    pub fn open_position(
        &mut self,
        option_type: OptionType,
        strike_price: f64,
        expiration_days: u32,
        contracts: u32,
    ) -> SimResult<Position> {
        let spot = self.spot();
        self.ledger.open(
            option_type,
            strike_price,
            expiration_days,
            contracts,
            self.current_day,
            spot,
        )
    }

    /// Advance the clock one day: mark every open position at the new
    /// spot, then settle everything whose expiration has arrived.
    ///
    /// Past the horizon this rejects with `SimulationComplete` and
    /// mutates nothing, however many times it is called.
    pub fn advance_day(&mut self) -> SimResult<DayOutcome> {
        if self.current_day.saturating_add(1) >= self.horizon {
            return Err(SimError::SimulationComplete);
        }

        self.current_day += 1;
        let spot = self.price_path[self.current_day as usize].price;

        self.ledger.mark_all(self.current_day, spot);
        let settled = self.ledger.settle_expired(self.current_day, spot);

        Ok(DayOutcome {
            new_day: self.current_day,
            spot,
            settled,
        })
    }

    #[inline]
    pub fn scenario(&self) -> MarketScenario {
        self.scenario
    }

    #[inline]
    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    #[inline]
    pub fn current_day(&self) -> u32 {
        self.current_day
    }

    /// Spot price at the current day.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.price_path[self.current_day as usize].price
    }

    #[inline]
    pub fn cash(&self) -> f64 {
        self.ledger.cash()
    }

    #[inline]
    pub fn open_positions(&self) -> &[Position] {
        self.ledger.open_positions()
    }

    #[inline]
    pub fn total_value(&self) -> f64 {
        self.ledger.total_value()
    }

    #[inline]
    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// The revealed slice of the path: day 0 through the current day.
    /// Future prices stay hidden from callers.
    pub fn path_to_date(&self) -> &[PricePoint] {
        &self.price_path[..=self.current_day as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::INITIAL_STOCK_PRICE;

    fn session() -> SimSession {
        SimSession::with_rng(
            MarketScenario::Classic,
            90,
            10_000.0,
            StdRng::seed_from_u64(42),
        )
    }

    #[test]
    fn test_new_session_starts_at_day_zero() {
        let session = session();
        assert_eq!(session.current_day(), 0);
        assert_eq!(session.spot(), INITIAL_STOCK_PRICE);
        assert_eq!(session.cash(), 10_000.0);
        assert_eq!(session.path_to_date().len(), 1);
    }

    #[test]
    fn test_advance_reveals_path_prefix() {
        let mut session = session();
        for expected_day in 1u32..=10 {
            let outcome = session.advance_day().expect("within horizon");
            assert_eq!(outcome.new_day, expected_day);
            assert_eq!(session.path_to_date().len(), expected_day as usize + 1);
            assert_eq!(outcome.spot, session.spot());
        }
    }

    #[test]
    fn test_horizon_end_is_terminal_and_idempotent() {
        let mut session = SimSession::with_rng(
            MarketScenario::Classic,
            3,
            10_000.0,
            StdRng::seed_from_u64(1),
        );
        session.advance_day().expect("day 1");
        session.advance_day().expect("day 2");

        let day = session.current_day();
        let cash = session.cash();
        for _ in 0..3 {
            let err = session.advance_day().unwrap_err();
            assert!(matches!(err, SimError::SimulationComplete));
            assert_eq!(session.current_day(), day, "terminal error must not mutate");
            assert_eq!(session.cash(), cash);
        }
    }

    #[test]
    fn test_position_lifecycle_through_clock() {
        let mut session = session();
        let opened = session
            .open_position(OptionType::Call, 100.0, 5, 1)
            .expect("affordable at 10k");
        assert_eq!(opened.expiration_day, 5);

        // Four days of marking: position stays open, invariant holds.
        for _ in 0..4 {
            let outcome = session.advance_day().expect("within horizon");
            assert!(outcome.settled.is_empty());
            let pos = &session.open_positions()[0];
            assert!((pos.pnl - (pos.current_value - pos.cost_basis)).abs() < 1e-9);
        }

        // Day 5: expiration arrives, the position settles exactly once.
        let outcome = session.advance_day().expect("within horizon");
        assert_eq!(outcome.settled.len(), 1);
        assert_eq!(outcome.settled[0].id, opened.id);
        assert!(session.open_positions().is_empty());

        let next = session.advance_day().expect("within horizon");
        assert!(next.settled.is_empty(), "settlement must not repeat");
    }

    #[test]
    fn test_total_value_conserved_by_open() {
        let mut session = session();
        session
            .open_position(OptionType::Put, 105.0, 10, 2)
            .expect("open");
        assert!((session.total_value() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_regenerates_everything() {
        let mut session = session();
        session
            .open_position(OptionType::Call, 100.0, 5, 1)
            .expect("open");
        for _ in 0..10 {
            session.advance_day().expect("within horizon");
        }
        let old_path: Vec<_> = session.path_to_date().to_vec();

        session.reset(MarketScenario::Bullish);

        assert_eq!(session.current_day(), 0);
        assert_eq!(session.cash(), 10_000.0);
        assert!(session.open_positions().is_empty());
        assert_eq!(session.scenario(), MarketScenario::Bullish);
        assert_eq!(session.spot(), INITIAL_STOCK_PRICE);

        // New sample, not a replay of the old one.
        let mut replay = session;
        let mut fresh_prices = Vec::new();
        for _ in 0..10 {
            let o = replay.advance_day().expect("within horizon");
            fresh_prices.push(o.spot);
        }
        let old_prices: Vec<_> = old_path.iter().skip(1).take(10).map(|p| p.price).collect();
        assert_ne!(fresh_prices, old_prices);
    }

    #[test]
    fn test_rejected_open_leaves_session_intact() {
        let mut session = SimSession::with_rng(
            MarketScenario::Classic,
            90,
            10.0,
            StdRng::seed_from_u64(9),
        );
        let err = session
            .open_position(OptionType::Call, 100.0, 60, 10)
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientFunds { .. }));
        assert_eq!(session.cash(), 10.0);
        assert!(session.open_positions().is_empty());
    }
}
