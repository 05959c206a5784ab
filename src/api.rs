// src/api.rs

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One role-tagged turn of a conversation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A single-part user turn.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part {
                text: Some(text.into()),
            }],
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    pub temperature: f32,
}

/// Everything the upstream service needs to produce one completion.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// Body of `POST /generate`. `city` stays optional so a missing field maps to
/// a 400 instead of an extractor error.
#[derive(Deserialize, Debug, Default)]
pub struct GenerateRequest {
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GenerateResponse {
    pub text: String,
}
