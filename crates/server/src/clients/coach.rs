use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;

const SYSTEM_PROMPT: &str = "You are an expert chess coach. You always have the correct answer \
and explain chess tactics clearly to help students learn.";
const MAX_TOKENS: u32 = 400;
const TEMPERATURE: f64 = 0.3;

/// Query string of the coach endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRequest {
    pub fen: Option<String>,
    pub user_move: Option<String>,
    pub question: Option<String>,
    pub solution_move: Option<String>,
    pub puzzle_type: Option<String>,
    pub move_number: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl HintRequest {
    fn solution(&self) -> &str {
        present(&self.solution_move).unwrap_or("unknown")
    }

    fn puzzle_type(&self) -> Option<&str> {
        present(&self.puzzle_type)
    }

    pub fn prompt(&self, fen: &str) -> String {
        let solution = self.solution();
        let user_move = present(&self.user_move);

        let mut prompt = format!(
            "You are a chess coach explaining a tactical puzzle to a student.\n\n\
             Position (FEN): {fen}\n\
             Puzzle Type: {}\n\
             Correct Answer: {solution}\n",
            self.puzzle_type().unwrap_or("tactical puzzle")
        );
        if let Some(user_move) = user_move {
            prompt.push_str(&format!("Student is considering: {user_move}\n"));
        }
        if let Some(n) = present(&self.move_number) {
            prompt.push_str(&format!("This is move {n} in the solution\n"));
        }
        prompt.push_str(&format!(
            "\nStudent asks: \"{}\"\n\n\
             Your job:\n\
             1. Confirm that {solution} is indeed the best move\n\
             2. Explain WHY this move works (what tactical theme it uses)\n\
             3. Show what happens after this move\n\
             4. If the student suggested a different move, explain why {solution} is better\n\n",
            present(&self.question).unwrap_or("What is the best move?")
        ));
        match user_move {
            Some(user_move) if user_move != solution => prompt.push_str(&format!(
                "The student suggested {user_move}, but the correct answer is {solution}. \
                 Explain why {solution} is superior.\n"
            )),
            _ => prompt.push_str(&format!(
                "Explain why {solution} is the key move in this position.\n"
            )),
        }
        prompt.push_str(
            "\nFocus on the tactical pattern (fork, pin, skewer, discovered attack, etc.) \
             and be educational.",
        );
        prompt
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    pub success: bool,
    pub hint: String,
    pub best_move: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puzzle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HintResponse {
    fn canned(hint: String, best_move: &str, explanation: String) -> Self {
        Self {
            success: true,
            hint,
            best_move: best_move.to_string(),
            explanation,
            puzzle_type: None,
            method: None,
            timestamp: None,
        }
    }

    pub fn no_api_key(req: &HintRequest) -> Self {
        Self::canned(
            format!(
                "The best move is {}. OpenAI API key needed for detailed explanation.",
                req.solution()
            ),
            req.solution(),
            "API configuration needed".to_string(),
        )
    }

    pub fn upstream_rejected(req: &HintRequest) -> Self {
        Self::canned(
            format!(
                "The best move is {}. This appears to be a {} puzzle.",
                req.solution(),
                req.puzzle_type().unwrap_or("tactical")
            ),
            req.solution(),
            format!("Best move: {}", req.solution()),
        )
    }

    pub fn transport_failed(req: &HintRequest) -> Self {
        Self::canned(
            "Error occurred, but try looking for tactical patterns like checks, captures, and threats."
                .to_string(),
            req.solution(),
            "API temporarily unavailable".to_string(),
        )
    }
}

/// OpenAI-compatible chat completion client for coach explanations.
pub struct CoachClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl CoachClient {
    pub fn new(config: &Config) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent("PuzzleTrainer/1.0")
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| format!("HTTP client error: {e}"))?;
        Ok(Self {
            client,
            url: config.openai_url.clone(),
            model: config.openai_model.clone(),
            api_key: config.openai_api_key.clone(),
        })
    }

    /// Always produces a hint; upstream problems degrade to canned text.
    pub async fn hint(&self, req: &HintRequest, fen: &str) -> HintResponse {
        let Some(api_key) = &self.api_key else {
            tracing::info!("No OpenAI API key, returning canned hint");
            return HintResponse::no_api_key(req);
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": req.prompt(fen) },
                ],
                "max_tokens": MAX_TOKENS,
                "temperature": TEMPERATURE,
            }))
            .send()
            .await;

        let resp = match resp {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Coach request error: {e}");
                return HintResponse::transport_failed(req);
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!("Coach HTTP {status}: {text}");
            return HintResponse::upstream_rejected(req);
        }

        let data: Value = match resp.json().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Coach JSON parse error: {e}");
                return HintResponse::transport_failed(req);
            }
        };

        let explanation = data["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("The best move is {}", req.solution()));

        HintResponse {
            success: true,
            hint: explanation.clone(),
            best_move: req.solution().to_string(),
            explanation,
            puzzle_type: req.puzzle_type().map(str::to_string),
            method: Some("Solution-guided GPT analysis".to_string()),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}
