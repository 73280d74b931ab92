use crate::errors::{SimError, SimResult};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub initial_cash: f64,
    pub simulation_days: u32,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
}

impl AppConfig {
    pub fn from_env() -> SimResult<Self> {
        dotenvy::dotenv().ok();

        let initial_cash = env_var_or("INITIAL_CASH", "10000")
            .parse::<f64>()
            .map_err(|e| SimError::Config(format!("INITIAL_CASH: {e}")))?;
        if initial_cash < 0.0 {
            return Err(SimError::Config(format!(
                "INITIAL_CASH must be non-negative, got {initial_cash}"
            )));
        }

        let simulation_days = env_var_or("SIMULATION_DAYS", "90")
            .parse::<u32>()
            .map_err(|e| SimError::Config(format!("SIMULATION_DAYS: {e}")))?;
        if simulation_days < 2 {
            return Err(SimError::Config(format!(
                "SIMULATION_DAYS must be at least 2, got {simulation_days}"
            )));
        }

        Ok(Self {
            initial_cash,
            simulation_days,
            // No key means the session runs with the local fallback analyst.
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_base_url: env_var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            gemini_model: env_var_or("GEMINI_MODEL", "gemini-2.5-flash"),
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
