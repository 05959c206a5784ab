// src/services.rs

use super::AppState;
use super::api::{Content, GenerationConfig, GenerationRequest};
use super::error::{ServiceError, UpstreamError};
use std::time::Instant;

/// Returned when the model answers with nothing.
pub const EMPTY_RESPONSE_FALLBACK: &str = "No response generated";

/// Formats the fixed weather question for a city.
pub fn build_prompt(city: &str) -> String {
    format!("Tell me the current weather in {city}. Answer in one short sentence.")
}

/// Removes Markdown bold markers, substituting the fallback when nothing is left.
pub fn sanitize_reply(raw: Option<String>) -> String {
    raw.map(|text| text.replace("**", ""))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_string())
}

pub fn build_request(state: &AppState, prompt: String) -> GenerationRequest {
    GenerationRequest {
        model: state.config.model.clone(),
        contents: vec![Content::user_text(prompt)],
        generation_config: GenerationConfig {
            max_output_tokens: state.config.max_output_tokens,
            temperature: state.config.temperature,
        },
    }
}

/// Asks the upstream model about the weather in `city` and returns the cleaned sentence.
pub async fn describe_weather(
    state: &AppState,
    api_key: &str,
    city: &str,
) -> Result<String, ServiceError> {
    let request = build_request(state, build_prompt(city));
    let timeout = state.config.timeout;

    let started = Instant::now();
    let outcome = tokio::time::timeout(timeout, state.generator.generate(api_key, &request))
        .await
        .unwrap_or(Err(UpstreamError::Timeout(timeout)));
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(raw) => {
            tracing::info!(model = %request.model, elapsed_ms, "Gemini call");
            Ok(sanitize_reply(raw))
        }
        Err(e) => {
            tracing::warn!(
                model = %request.model,
                elapsed_ms,
                upstream_status = ?e.status(),
                error = %e,
                "Gemini call failed"
            );
            Err(e.into())
        }
    }
}
