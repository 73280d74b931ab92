/// Domain-specific error types for the simulation engine.
/// Rejections leave state untouched. The engine must:
/// - Refuse a trade before mutating cash or positions
/// - Keep settlement committed even when the analysis backend fails
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("insufficient funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("end of simulation reached")]
    SimulationComplete,

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("analysis error: {0}")]
    Analysis(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SimError {
    fn from(e: reqwest::Error) -> Self {
        SimError::Analysis(e.to_string())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Analysis(e.to_string())
    }
}

pub type SimResult<T> = Result<T, SimError>;
