use crate::portfolio::OptionType;

/// Scaling factor applied to the time-value term.
const TIME_VALUE_SCALE: f64 = 0.5;
/// Spot divisor in the time-value term.
const SPOT_SCALE: f64 = 20.0;
/// Calendar days per year for the time-to-expiry ratio.
const DAYS_PER_YEAR: f64 = 365.0;

/// Immediate exercise value of the option at the given spot.
#[inline]
pub fn intrinsic_value(spot: f64, strike: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => (spot - strike).max(0.0),
        OptionType::Put => (strike - spot).max(0.0),
    }
}

/// Per-share option premium: intrinsic value plus a simplified time value.
///
/// This is deliberately not Black-Scholes. The time-value term is
/// monotonic in volatility, spot, and days remaining, which is all the
/// simulator needs. At or past expiry the premium collapses to intrinsic
/// value exactly; settlement relies on that terminal rule.
#[inline]
pub fn premium(
    spot: f64,
    strike: f64,
    days_to_expiration: i64,
    volatility: f64,
    option_type: OptionType,
) -> f64 {
    let intrinsic = intrinsic_value(spot, strike, option_type);

    if days_to_expiration <= 0 {
        return intrinsic;
    }

    let time_value = TIME_VALUE_SCALE
        * volatility
        * (spot / SPOT_SCALE)
        * (days_to_expiration as f64 / DAYS_PER_YEAR).sqrt();

    intrinsic + time_value
}
