use crate::analysis::AnalysisGateway;
use crate::errors::{SimError, SimResult};
use crate::market::STOCK_TICKER;
use crate::portfolio::Position;
use reqwest::Client;

/// Gemini `generateContent` REST client. One request per settled
/// position, prompted as an options-trading coach; any failure surfaces
/// as `SimError::Analysis` and the caller falls back locally.
pub struct GeminiAnalyst {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiAnalyst {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }

    fn build_prompt(position: &Position, final_spot: f64, final_day: u32) -> String {
        let held_days = position.expiration_day - position.purchase_day;
        let outcome = if position.pnl >= 0.0 { "Right" } else { "Wrong" };

        format!(
            "You are an expert options trading coach called 'Apex Mentor'. Your goal is to \
explain the outcome of a simulated options trade to a user who is new to options but \
understands the stock market. Be encouraging and focus on the learning opportunity.\n\
\n\
Analyze the following trade:\n\
\n\
**Trade Details:**\n\
- Stock: {ticker} Inc.\n\
- Strategy: Buying a {option_type} Option\n\
- Strike Price: ${strike:.2}\n\
- Expiration: {held_days} days from purchase\n\
- Premium Paid (per share): ${per_share:.2}\n\
- Total Cost: ${cost:.2}\n\
- Initial Stock Price: ${initial:.2}\n\
\n\
**Trade Outcome:**\n\
- The option expired on Day {final_day}.\n\
- Final Stock Price: ${spot:.2}\n\
- Profit/Loss: ${pnl:.2} ({verdict})\n\
\n\
**Your Analysis (in Markdown):**\n\
\n\
1.  **## Trade Breakdown:**\n\
    *   Explain what buying a {option_type} option means in simple terms.\n\
    *   Was the option In-the-Money, At-the-Money, or Out-of-the-Money at expiration? Explain why.\n\
    *   Calculate and explain the breakeven price for this trade.\n\
\n\
2.  **## What Went {outcome}?**\n\
    *   Analyze the stock's price movement relative to the strike price.\n\
    *   Explain how the final stock price determined the profit or loss.\n\
    *   Mention the role of 'Time Decay' (Theta). Explain that the option loses value every day, and why this was a factor in the outcome.\n\
\n\
3.  **## Key Takeaway & Learning:**\n\
    *   Provide one key, actionable takeaway from this trade.\n\
    *   If it was a loss, suggest what could have been done differently.\n\
    *   If it was a profit, explain what made the decision a good one and what risks were still present.\n\
\n\
Keep the tone positive and educational. Use bullet points and bold text to make it easy \
to read. Do not wrap your response in markdown backticks.",
            ticker = STOCK_TICKER,
            option_type = position.option_type,
            strike = position.strike_price,
            held_days = held_days,
            per_share = position.premium_per_share(),
            cost = position.cost_basis,
            initial = position.initial_stock_price,
            final_day = final_day,
            spot = final_spot,
            pnl = position.pnl,
            verdict = if position.pnl >= 0.0 { "Profit" } else { "Loss" },
            outcome = outcome,
        )
    }
}

// Gemini generateContent response shape (only the fields we read):
// {
//   "candidates": [
//     { "content": { "parts": [ { "text": "..." } ] } }
//   ]
// }

#[derive(serde::Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(serde::Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(serde::Deserialize)]
struct Part {
    text: Option<String>,
}

impl AnalysisGateway for GeminiAnalyst {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn explain(
        &self,
        position: &Position,
        final_spot: f64,
        final_day: u32,
    ) -> SimResult<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let prompt = Self::build_prompt(position, final_spot, final_day);
        let body = serde_json::json!({
            "contents": [ { "parts": [ { "text": prompt } ] } ]
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SimError::Analysis(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SimError::Analysis(format!("HTTP {status}: {body}")));
        }

        let data: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| SimError::Analysis(format!("parse: {e}")))?;

        let text = data
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_ref())
            .and_then(|p| p.first())
            .and_then(|p| p.text.as_deref())
            .ok_or_else(|| SimError::Analysis("no text candidate in response".into()))?;

        if text.trim().is_empty() {
            return Err(SimError::Analysis("empty analysis text".into()));
        }

        Ok(text.to_string())
    }
}
