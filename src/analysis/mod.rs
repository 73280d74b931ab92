pub mod gemini;

use crate::errors::{SimError, SimResult};
use crate::portfolio::Position;

/// External collaborators that turn a settled position into explanatory
/// text implement this trait.
///
/// `explain` is called once per settled position, after settlement has
/// already committed its monetary effects; a failing or absent backend
/// costs the user commentary, never money. Callers recover from failure
/// with `fallback_analysis`.
pub trait AnalysisGateway {
    fn name(&self) -> &'static str;

    async fn explain(
        &self,
        position: &Position,
        final_spot: f64,
        final_day: u32,
    ) -> SimResult<String>;
}

/// Stand-in gateway for sessions with no analysis backend configured.
/// Always fails, so every settled position gets the local fallback text.
pub struct OfflineAnalyst;

impl AnalysisGateway for OfflineAnalyst {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn explain(
        &self,
        _position: &Position,
        _final_spot: f64,
        _final_day: u32,
    ) -> SimResult<String> {
        Err(SimError::Analysis("no analysis backend configured".into()))
    }
}

/// Deterministic local commentary for a settled position. Used whenever
/// the gateway fails or is absent; always embeds the signed realized P/L
/// to two decimal places.
pub fn fallback_analysis(position: &Position) -> String {
    format!(
        "Trade analysis is unavailable right now. Your {} expired and your realized P/L was ${:+.2}.",
        position.option_type, position.pnl
    )
}

/// Fetch commentary for one settled position, substituting the local
/// fallback on any gateway failure. Never errors and never re-enters the
/// engine.
pub async fn explain_or_fallback<G: AnalysisGateway>(
    gateway: &G,
    position: &Position,
    final_spot: f64,
    final_day: u32,
) -> String {
    match gateway.explain(position, final_spot, final_day).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(
                gateway = gateway.name(),
                position = %position.id,
                error = %e,
                "analysis failed, using local fallback"
            );
            fallback_analysis(position)
        }
    }
}
