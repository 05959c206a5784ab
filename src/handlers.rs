// src/handlers.rs

use super::AppState;
use super::api::{GenerateRequest, GenerateResponse};
use super::error::ServiceError;
use super::services;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, web};

/// Largest request body read before answering 413.
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Only JSON bodies are decoded; anything else never carries a `city`.
fn is_json(content_type: &str) -> bool {
    content_type.eq_ignore_ascii_case("application/json")
        || content_type.to_ascii_lowercase().ends_with("+json")
}

/// `city` from a raw body; anything that is not a JSON object with a
/// non-empty string `city` yields `None`.
fn parse_city(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value::<GenerateRequest>(value)
        .ok()
        .and_then(|req| req.city)
        .filter(|city| !city.is_empty())
}

pub async fn generate(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<impl Responder, ServiceError> {
    // Re-checked per request so a missing key is a 500, not a crash.
    let api_key = state
        .config
        .api_key
        .as_deref()
        .ok_or(ServiceError::ServerMisconfiguration)?;

    let body = payload
        .to_bytes_limited(MAX_BODY_BYTES)
        .await
        .map_err(|_| ServiceError::PayloadTooLarge)?
        .map_err(|_| ServiceError::InvalidInput)?;

    let city = Some(&body[..])
        .filter(|_| is_json(req.content_type()))
        .and_then(parse_city)
        .ok_or(ServiceError::InvalidInput)?;
    tracing::debug!(%city, "weather description requested");

    let text = services::describe_weather(&state, api_key, &city).await?;

    Ok(HttpResponse::Ok().json(GenerateResponse { text }))
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> Result<HttpResponse, ServiceError> {
    Err(ServiceError::MethodNotAllowed)
}
