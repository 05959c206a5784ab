use actix_web::{App, HttpServer, middleware, web};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use weather_prompt_api::{AppState, GeminiClient, ServiceConfig, configure};

/* ---------- main ---------- */
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let config = ServiceConfig::from_env()?;
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; /generate will answer 500 until it is configured");
    }

    let generator = GeminiClient::new(config.base_url.clone(), config.timeout)?;
    let bind = (config.host.clone(), config.port);

    info!(
        model = %config.model,
        max_output_tokens = ?config.max_output_tokens,
        cors = config.enable_cors,
        timeout = ?config.timeout,
        "Server starting at http://{}:{}",
        bind.0,
        bind.1
    );

    let app_state = web::Data::new(AppState::new(config, Arc::new(generator)));

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .configure(|cfg| configure(cfg, app_state.clone()))
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}
