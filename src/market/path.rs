use crate::market::{MarketScenario, PricePoint, BASE_VOLATILITY, INITIAL_STOCK_PRICE};
use rand::Rng;

/// Magnitude of the per-path Classic drift bias.
const CLASSIC_DRIFT: f64 = 0.0005;
/// Probability that the Classic bias comes up positive.
const CLASSIC_UP_PROBABILITY: f64 = 0.505;
/// Constant drift for the Bullish/Bearish trends.
const TREND_DRIFT: f64 = 0.0011;
/// Volatility multiplier for the Volatile scenario.
const VOLATILE_MULTIPLIER: f64 = 2.5;
/// Fraction of the gap to the starting price recovered each Sideways day.
const SIDEWAYS_REVERSION: f64 = 0.05;
/// Prices never drop below this floor.
const PRICE_FLOOR: f64 = 1.0;

/// Concrete step parameters for one path. Resolved once per path, before
/// the generation loop; the Classic drift coin is flipped here and held
/// for the whole run.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioParams {
    pub drift: f64,
    pub volatility: f64,
    pub mean_reversion: f64,
}

impl ScenarioParams {
    pub fn resolve<R: Rng + ?Sized>(scenario: MarketScenario, rng: &mut R) -> Self {
        match scenario {
            MarketScenario::Classic => {
                let drift = if rng.gen::<f64>() < CLASSIC_UP_PROBABILITY {
                    CLASSIC_DRIFT
                } else {
                    -CLASSIC_DRIFT
                };
                Self {
                    drift,
                    volatility: BASE_VOLATILITY,
                    mean_reversion: 0.0,
                }
            }
            MarketScenario::Bullish => Self {
                drift: TREND_DRIFT,
                volatility: BASE_VOLATILITY,
                mean_reversion: 0.0,
            },
            MarketScenario::Bearish => Self {
                drift: -TREND_DRIFT,
                volatility: BASE_VOLATILITY,
                mean_reversion: 0.0,
            },
            MarketScenario::Volatile => Self {
                drift: 0.0,
                volatility: BASE_VOLATILITY * VOLATILE_MULTIPLIER,
                mean_reversion: 0.0,
            },
            MarketScenario::Sideways => Self {
                drift: 0.0,
                volatility: BASE_VOLATILITY / 2.0,
                mean_reversion: SIDEWAYS_REVERSION,
            },
        }
    }
}

/// Generate a full daily price path for one scenario.
///
/// Day 0 is always `INITIAL_STOCK_PRICE`. Each later day applies mean
/// reversion (Sideways only), then a uniform random step scaled by the
/// scenario volatility, then the price floor. The whole path is
/// materialized up front; each call draws an independent sample from the
/// supplied RNG.
pub fn generate_path<R: Rng + ?Sized>(
    days: u32,
    scenario: MarketScenario,
    rng: &mut R,
) -> Vec<PricePoint> {
    if days == 0 {
        return Vec::new();
    }

    let params = ScenarioParams::resolve(scenario, rng);

    let mut path = Vec::with_capacity(days as usize);
    let mut price = INITIAL_STOCK_PRICE;
    path.push(PricePoint { day: 0, price });

    for day in 1..days {
        price += params.mean_reversion * (INITIAL_STOCK_PRICE - price);

        let shock = rng.gen::<f64>() - 0.5 + params.drift;
        price += shock * params.volatility * price;
        price = price.max(PRICE_FLOOR);

        path.push(PricePoint { day, price });
    }

    path
}
