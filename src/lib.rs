//! HTTP service that asks a Gemini model for a one-sentence weather
//! description of a city.
//!
//! `POST /generate` with `{ "city": "..." }` answers `{ "text": "..." }`, or
//! `{ "error": "..." }` with a 400, 405 or 500 status.

pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod handlers;
pub mod services;

use actix_web::{
    http::{Method, header},
    middleware::{Condition, DefaultHeaders},
    web,
};
use std::sync::Arc;

pub use config::ServiceConfig;
pub use error::{ServiceError, UpstreamError};
pub use gemini::{GeminiClient, TextGenerator};

/* ---------- Shared State ---------- */
pub struct AppState {
    pub config: ServiceConfig,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(config: ServiceConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }
}

fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"))
        .add((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
}

/// Registers the shared state and the `/generate` resource.
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<AppState>) {
    let enable_cors = state.config.enable_cors;

    let mut resource = web::resource("/generate").route(web::post().to(handlers::generate));
    if enable_cors {
        resource = resource.route(web::method(Method::OPTIONS).to(handlers::preflight));
    }

    cfg.app_data(state).service(
        resource
            .default_service(web::to(handlers::method_not_allowed))
            .wrap(Condition::new(enable_cors, cors_headers())),
    );
}
