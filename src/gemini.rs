// src/gemini.rs

use super::api::{Content, GenerationConfig, GenerationRequest};
use super::error::UpstreamError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Finish reasons that mean the candidate was withheld.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "OTHER",
];

/// A service that turns a prompt into generated text.
///
/// `Ok(None)` means the call succeeded but produced no text.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<Option<String>, UpstreamError>;
}

/// Client for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    http: Client,
}

impl GeminiClient {
    /// `connect_timeout` bounds connection setup only; the whole call is
    /// bounded by the caller.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, UpstreamError> {
        let http = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: &'a [Content],
    generation_config: &'a GenerationConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorReply {
    error: ErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Pull the generated text out of a successful reply.
fn extract_text(reply: GenerateContentReply) -> Result<Option<String>, UpstreamError> {
    let Some(candidate) = reply.candidates.into_iter().next() else {
        return match reply.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => Err(UpstreamError::Blocked(format!(
                "Response was blocked due to {reason}"
            ))),
            None => Ok(None),
        };
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        if let Some(reason) = candidate
            .finish_reason
            .filter(|r| BLOCKING_FINISH_REASONS.contains(&r.as_str()))
        {
            return Err(UpstreamError::Blocked(format!(
                "Candidate was blocked due to {reason}"
            )));
        }
        return Ok(None);
    }

    Ok(Some(text))
}

/// Turn a non-success reply into an error carrying the upstream message, if any.
fn error_from_body(status: u16, body: &str) -> UpstreamError {
    let message = serde_json::from_str::<ErrorReply>(body)
        .ok()
        .and_then(|r| r.error.message)
        .filter(|m| !m.is_empty());
    UpstreamError::Api { status, message }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<Option<String>, UpstreamError> {
        let body = GenerateContentBody {
            contents: &request.contents,
            generation_config: &request.generation_config,
        };

        let res = self
            .http
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &text));
        }

        let reply: GenerateContentReply = serde_json::from_str(&text)
            .map_err(|e| UpstreamError::Malformed(format!("Failed to parse Gemini reply: {e}")))?;

        extract_text(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;

    fn reply(json: serde_json::Value) -> GenerateContentReply {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn endpoint_targets_generate_content() {
        let client = GeminiClient::new("http://localhost:9000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.endpoint("gemini-flash-latest"),
            "http://localhost:9000/v1beta/models/gemini-flash-latest:generateContent"
        );
    }

    #[test]
    fn request_body_matches_wire_format() {
        let contents = vec![Content::user_text("hi")];
        let config = GenerationConfig {
            max_output_tokens: Some(100),
            temperature: 0.5,
        };
        let body = GenerateContentBody {
            contents: &contents,
            generation_config: &config,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "generationConfig": { "maxOutputTokens": 100, "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn text_parts_are_concatenated() {
        let r = reply(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Sunny " }, { "text": "today." }] },
                "finishReason": "STOP"
            }]
        }));
        assert_eq!(extract_text(r).unwrap().as_deref(), Some("Sunny today."));
    }

    #[test]
    fn model_role_parses() {
        let r = reply(serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [] } }]
        }));
        assert_eq!(r.candidates[0].content.as_ref().unwrap().role, Some(Role::Model));
    }

    #[test]
    fn no_candidates_without_block_is_empty() {
        assert_eq!(extract_text(GenerateContentReply::default()).unwrap(), None);
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let r = reply(serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        let err = extract_text(r).unwrap_err();
        assert_eq!(err.to_string(), "Response was blocked due to SAFETY");
    }

    #[test]
    fn blocked_candidate_is_an_error() {
        let r = reply(serde_json::json!({ "candidates": [{ "finishReason": "RECITATION" }] }));
        let err = extract_text(r).unwrap_err();
        assert_eq!(err.to_string(), "Candidate was blocked due to RECITATION");
    }

    #[test]
    fn truncated_candidate_without_text_is_empty() {
        let r = reply(serde_json::json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] }));
        assert_eq!(extract_text(r).unwrap(), None);
    }

    #[test]
    fn error_body_message_is_kept() {
        let body = r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = error_from_body(429, body);
        assert_eq!(err.message(), Some("quota exceeded"));
    }

    #[test]
    fn unreadable_error_body_has_no_message() {
        let err = error_from_body(502, "<html>bad gateway</html>");
        assert_eq!(err.message(), None);
        assert_eq!(err.to_string(), "Server error");
    }
}
