use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use trainer_core::{AnalysisError, AnalysisService, RemoteEvaluation};

use crate::config::Config;

/// Score reported for a forced mate, white positive.
pub const MATE_SCORE: i32 = 10_000;

/// Remote engine over HTTP (chess-api.com request/response shape).
pub struct HttpAnalysis {
    client: Client,
    url: String,
    depth: u32,
    max_thinking_ms: u64,
}

impl HttpAnalysis {
    pub fn new(config: &Config) -> Result<Self, String> {
        // The evaluator enforces the per-call timeout; this is only a backstop.
        let client = Client::builder()
            .user_agent("PuzzleTrainer/1.0")
            .timeout(Duration::from_millis(config.analysis_timeout_ms.saturating_mul(2)))
            .build()
            .map_err(|e| format!("HTTP client error: {e}"))?;
        Ok(Self {
            client,
            url: config.analysis_url.clone(),
            depth: config.analysis_depth,
            max_thinking_ms: config.analysis_max_thinking_ms,
        })
    }

    async fn request(&self, fen: &str) -> Result<RemoteEvaluation, AnalysisError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({
                "fen": fen,
                "depth": self.depth,
                "maxThinkingTime": self.max_thinking_ms,
            }))
            .send()
            .await
            .map_err(|e| AnalysisError::Unavailable(format!("Request error: {e}")))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AnalysisError::QuotaExhausted);
        }
        if !status.is_success() {
            return Err(AnalysisError::Unavailable(format!("HTTP {status}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AnalysisError::MalformedResponse(format!("JSON parse error: {e}")))?;
        parse_analysis(&body)
    }
}

impl AnalysisService for HttpAnalysis {
    fn analyze<'a>(
        &'a self,
        fen: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RemoteEvaluation, AnalysisError>> + Send + 'a>> {
        Box::pin(self.request(fen))
    }

    fn name(&self) -> &str {
        "chess-api"
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turn an analysis body into a white-positive centipawn score.
///
/// `mate` wins over `centipawns`, which wins over `eval` (pawns).
pub fn parse_analysis(body: &Value) -> Result<RemoteEvaluation, AnalysisError> {
    if body["type"] == "error" || body.get("error").is_some_and(|e| !e.is_null()) {
        let code = body["error"].as_str().unwrap_or("unknown");
        return match code {
            "HIGH_USAGE" | "RATE_LIMIT" => Err(AnalysisError::QuotaExhausted),
            _ => Err(AnalysisError::Unavailable(format!(
                "{code}: {}",
                body["text"].as_str().unwrap_or("")
            ))),
        };
    }

    let centipawns = if let Some(mate) = number(&body["mate"]) {
        if mate >= 0.0 {
            MATE_SCORE
        } else {
            -MATE_SCORE
        }
    } else if let Some(cp) = number(&body["centipawns"]) {
        cp.round() as i32
    } else if let Some(pawns) = number(&body["eval"]) {
        (pawns * 100.0).round() as i32
    } else {
        return Err(AnalysisError::MalformedResponse(
            "no mate, centipawns or eval field".to_string(),
        ));
    };

    let best_move = body["move"]
        .as_str()
        .or_else(|| body["lan"].as_str())
        .map(str::to_string);

    Ok(RemoteEvaluation {
        centipawns,
        best_move,
    })
}
